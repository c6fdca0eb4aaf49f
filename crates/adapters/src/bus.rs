// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process publish/subscribe transport standing in for the original
//! deployment's MQTT broker (`original_source/sdr-service/app/mqtt_handler.py`
//! backs it with `paho-mqtt`; no MQTT client crate exists anywhere in the
//! retrieved example pack, so this models the same contract over
//! `tokio::sync::broadcast`, as a cheaply-cloneable handle wrapping shared
//! channel state).
//!
//! The core never depends on subscriber behavior — `subscribe` exists for
//! dashboards and tests, not for the tick loop's own correctness.

use async_trait::async_trait;
use range_core::RangeError;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Delivery guarantee requested for a single publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qos {
    /// Retried once on a transient local-send failure.
    AtLeastOnce,
    /// Never retried.
    BestEffort,
}

/// A published message: topic plus an opaque JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// Publish/subscribe capability. A transport failure is always returned to
/// the caller here; it is the *caller's* job (the engine) to log and
/// continue rather than propagate, per the component design's "failure of a
/// single publish is logged, not fatal."
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        payload: serde_json::Value,
        qos: Qos,
    ) -> Result<(), RangeError>;

    /// Subscribe to an exact topic string. Messages published to other
    /// topics are filtered out before reaching the caller.
    fn subscribe(&self, topic: &str) -> Subscription;
}

/// A filtered view over the bus's broadcast channel for one topic.
pub struct Subscription {
    rx: broadcast::Receiver<Message>,
    topic: String,
}

impl Subscription {
    /// Wait for the next message on this subscription's topic. Returns
    /// `None` once the bus is dropped and the channel closes.
    pub async fn recv(&mut self) -> Option<Message> {
        loop {
            match self.rx.recv().await {
                Ok(msg) if msg.topic == self.topic => return Some(msg),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Default [`MessageBus`] backend: a shared broadcast channel. Cheaply
/// `Clone` — a handle wrapping shared channel state.
#[derive(Clone)]
pub struct InProcessBus {
    tx: broadcast::Sender<Message>,
}

impl InProcessBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }
}

impl Default for InProcessBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl MessageBus for InProcessBus {
    async fn publish(
        &self,
        topic: &str,
        payload: serde_json::Value,
        qos: Qos,
    ) -> Result<(), RangeError> {
        let message = Message { topic: topic.to_string(), payload };
        let attempt = |m: Message| {
            self.tx
                .send(m)
                .map(|_subscriber_count| ())
                .map_err(|e| RangeError::BusUnavailable(e.to_string()))
        };
        match qos {
            Qos::BestEffort => attempt(message),
            Qos::AtLeastOnce => match attempt(message.clone()) {
                Ok(()) => Ok(()),
                Err(_) => attempt(message),
            },
        }
    }

    fn subscribe(&self, topic: &str) -> Subscription {
        Subscription { rx: self.tx.subscribe(), topic: topic.to_string() }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
