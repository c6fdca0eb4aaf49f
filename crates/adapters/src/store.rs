// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External, TTL-bounded key/value mirror of exercise state, timer, and
//! per-team delivery, grounded directly on
//! `original_source/orchestration/app/redis_manager.py`: same key layout,
//! same 24-hour TTL refreshed on every write, same `SADD`/`INCR`/`EXPIRE`/
//! `SCAN`+`DEL` shape, translated onto the `redis` crate's async API.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use range_core::RangeError;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// External mirror of exercise state. All operations are best-effort from
/// the engine's point of view (§4.3, §7): a transport failure here is
/// logged by the caller and never propagates into the lifecycle. The trait
/// itself still returns `Result` so callers and tests can tell success from
/// failure.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn put_state(&self, scenario: &str, state: &str) -> Result<(), RangeError>;
    async fn put_timer(&self, scenario: &str, elapsed: u64, formatted: &str)
        -> Result<(), RangeError>;
    /// Idempotent add to the per-team delivered set; returns the new
    /// cardinality (mirrors `record_inject_delivery`'s `INCR` return value).
    async fn mark_delivered(
        &self,
        scenario: &str,
        team: &str,
        inject: &str,
    ) -> Result<u64, RangeError>;
    async fn count_delivered(&self, scenario: &str, team: &str) -> Result<u64, RangeError>;
    /// Supplemental to the distilled spec (present in the original as
    /// `set_team_connection_status`): dashboards use this to show a
    /// connection indicator.
    async fn set_team_connected(
        &self,
        scenario: &str,
        team: &str,
        connected: bool,
    ) -> Result<(), RangeError>;
    async fn team_connected(&self, scenario: &str, team: &str) -> Result<bool, RangeError>;
    async fn purge(&self, scenario: &str) -> Result<(), RangeError>;
}

/// Redis-backed `StatusStore`, the production backend.
#[derive(Clone)]
pub struct RedisStatusStore {
    conn: ConnectionManager,
    ttl_secs: u64,
}

impl RedisStatusStore {
    pub async fn connect(url: &str, ttl: Duration) -> Result<Self, RangeError> {
        let client = redis::Client::open(url)
            .map_err(|e| RangeError::StoreUnavailable(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| RangeError::StoreUnavailable(e.to_string()))?;
        Ok(Self { conn, ttl_secs: ttl.as_secs() })
    }

    fn key_state(scenario: &str) -> String {
        format!("exercise:{scenario}:state")
    }
    fn key_state_timestamp(scenario: &str) -> String {
        format!("exercise:{scenario}:state_timestamp")
    }
    fn key_timer(scenario: &str) -> String {
        format!("exercise:{scenario}:timer")
    }
    fn key_delivered(scenario: &str, team: &str) -> String {
        format!("exercise:{scenario}:team:{team}:delivered")
    }
    fn key_count(scenario: &str, team: &str) -> String {
        format!("exercise:{scenario}:team:{team}:count")
    }
    fn key_connected(scenario: &str, team: &str) -> String {
        format!("exercise:{scenario}:team:{team}:connected")
    }
    fn key_inject_delivered_at(scenario: &str, inject: &str) -> String {
        format!("exercise:{scenario}:inject:{inject}:delivered_at")
    }

    fn epoch_seconds_now() -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }
}

#[async_trait]
impl StatusStore for RedisStatusStore {
    async fn put_state(&self, scenario: &str, state: &str) -> Result<(), RangeError> {
        let mut conn = self.conn.clone();
        let () = conn
            .set_ex(Self::key_state(scenario), state, self.ttl_secs)
            .await
            .map_err(|e| RangeError::StoreUnavailable(e.to_string()))?;
        let () = conn
            .set_ex(
                Self::key_state_timestamp(scenario),
                Self::epoch_seconds_now(),
                self.ttl_secs,
            )
            .await
            .map_err(|e| RangeError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn put_timer(
        &self,
        scenario: &str,
        elapsed: u64,
        formatted: &str,
    ) -> Result<(), RangeError> {
        let payload = serde_json::json!({
            "elapsed": elapsed,
            "formatted": formatted,
            "timestamp": Self::epoch_seconds_now(),
        });
        let mut conn = self.conn.clone();
        let () = conn
            .set_ex(Self::key_timer(scenario), payload.to_string(), self.ttl_secs)
            .await
            .map_err(|e| RangeError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn mark_delivered(
        &self,
        scenario: &str,
        team: &str,
        inject: &str,
    ) -> Result<u64, RangeError> {
        let mut conn = self.conn.clone();
        let delivered_key = Self::key_delivered(scenario, team);
        let _: i64 = conn
            .sadd(&delivered_key, inject)
            .await
            .map_err(|e| RangeError::StoreUnavailable(e.to_string()))?;
        let () = conn
            .expire(&delivered_key, self.ttl_secs as i64)
            .await
            .map_err(|e| RangeError::StoreUnavailable(e.to_string()))?;

        let count_key = Self::key_count(scenario, team);
        let new_count: u64 = conn
            .incr(&count_key, 1u64)
            .await
            .map_err(|e| RangeError::StoreUnavailable(e.to_string()))?;
        let () = conn
            .expire(&count_key, self.ttl_secs as i64)
            .await
            .map_err(|e| RangeError::StoreUnavailable(e.to_string()))?;

        let () = conn
            .set_ex(
                Self::key_inject_delivered_at(scenario, inject),
                Self::epoch_seconds_now(),
                self.ttl_secs,
            )
            .await
            .map_err(|e| RangeError::StoreUnavailable(e.to_string()))?;

        Ok(new_count)
    }

    async fn count_delivered(&self, scenario: &str, team: &str) -> Result<u64, RangeError> {
        let mut conn = self.conn.clone();
        let count: u64 = conn
            .scard(Self::key_delivered(scenario, team))
            .await
            .map_err(|e| RangeError::StoreUnavailable(e.to_string()))?;
        Ok(count)
    }

    async fn set_team_connected(
        &self,
        scenario: &str,
        team: &str,
        connected: bool,
    ) -> Result<(), RangeError> {
        let mut conn = self.conn.clone();
        let () = conn
            .set_ex(
                Self::key_connected(scenario, team),
                if connected { "1" } else { "0" },
                self.ttl_secs,
            )
            .await
            .map_err(|e| RangeError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn team_connected(&self, scenario: &str, team: &str) -> Result<bool, RangeError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(Self::key_connected(scenario, team))
            .await
            .map_err(|e| RangeError::StoreUnavailable(e.to_string()))?;
        Ok(value.as_deref() == Some("1"))
    }

    async fn purge(&self, scenario: &str) -> Result<(), RangeError> {
        let mut conn = self.conn.clone();
        let pattern = format!("exercise:{scenario}:*");
        let keys: Vec<String> = conn
            .keys(&pattern)
            .await
            .map_err(|e| RangeError::StoreUnavailable(e.to_string()))?;
        if !keys.is_empty() {
            let _: i64 = conn
                .del(&keys)
                .await
                .map_err(|e| RangeError::StoreUnavailable(e.to_string()))?;
        }
        Ok(())
    }
}

/// Default/test `StatusStore` backend: a mutex-guarded map with a
/// per-entry expiry `Instant`. Used when no Redis URL is configured.
#[derive(Default)]
pub struct InMemoryStatusStore {
    inner: Mutex<InMemoryState>,
    ttl: Duration,
}

#[derive(Default)]
struct InMemoryState {
    state: HashMap<String, (String, Instant)>,
    timer: HashMap<String, (u64, String, Instant)>,
    delivered: HashMap<(String, String), (HashSet<String>, Instant)>,
    connected: HashMap<(String, String), (bool, Instant)>,
}

impl InMemoryStatusStore {
    pub fn new(ttl: Duration) -> Self {
        Self { inner: Mutex::new(InMemoryState::default()), ttl }
    }

    fn fresh(&self, recorded_at: Instant) -> bool {
        recorded_at.elapsed() < self.ttl
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn put_state(&self, scenario: &str, state: &str) -> Result<(), RangeError> {
        self.inner
            .lock()
            .state
            .insert(scenario.to_string(), (state.to_string(), Instant::now()));
        Ok(())
    }

    async fn put_timer(
        &self,
        scenario: &str,
        elapsed: u64,
        formatted: &str,
    ) -> Result<(), RangeError> {
        self.inner
            .lock()
            .timer
            .insert(scenario.to_string(), (elapsed, formatted.to_string(), Instant::now()));
        Ok(())
    }

    async fn mark_delivered(
        &self,
        scenario: &str,
        team: &str,
        inject: &str,
    ) -> Result<u64, RangeError> {
        let mut guard = self.inner.lock();
        let entry = guard
            .delivered
            .entry((scenario.to_string(), team.to_string()))
            .or_insert_with(|| (HashSet::new(), Instant::now()));
        entry.0.insert(inject.to_string());
        entry.1 = Instant::now();
        Ok(entry.0.len() as u64)
    }

    async fn count_delivered(&self, scenario: &str, team: &str) -> Result<u64, RangeError> {
        let guard = self.inner.lock();
        match guard.delivered.get(&(scenario.to_string(), team.to_string())) {
            Some((set, recorded_at)) if self.fresh(*recorded_at) => Ok(set.len() as u64),
            _ => Ok(0),
        }
    }

    async fn set_team_connected(
        &self,
        scenario: &str,
        team: &str,
        connected: bool,
    ) -> Result<(), RangeError> {
        self.inner
            .lock()
            .connected
            .insert((scenario.to_string(), team.to_string()), (connected, Instant::now()));
        Ok(())
    }

    async fn team_connected(&self, scenario: &str, team: &str) -> Result<bool, RangeError> {
        let guard = self.inner.lock();
        match guard.connected.get(&(scenario.to_string(), team.to_string())) {
            Some((connected, recorded_at)) if self.fresh(*recorded_at) => Ok(*connected),
            _ => Ok(false),
        }
    }

    async fn purge(&self, scenario: &str) -> Result<(), RangeError> {
        let mut guard = self.inner.lock();
        guard.state.remove(scenario);
        guard.timer.remove(scenario);
        guard.delivered.retain(|(s, _), _| s != scenario);
        guard.connected.retain(|(s, _), _| s != scenario);
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
