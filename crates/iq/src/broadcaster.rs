// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP server implementing the RTL-TCP handshake and fanning frames out to
//! connected clients, grounded on
//! `original_source/sdr-service/app/rtl_tcp.py`'s `RTLTCPServer`: same
//! 12-byte magic header, same `u8` I/Q interleaving, same
//! one-client-write-failure-doesn't-affect-others fan-out, adapted onto
//! `tokio::net::TcpListener` in an accept-loop/per-client-channel shape —
//! each client gets its own `tokio::sync::mpsc` writer fed by the shared
//! broadcast loop.

use std::sync::Arc;

use parking_lot::Mutex;
use range_core::RangeError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::sample::Frame;

/// `R T L 0`, tuner type `1` (R820T), gain-stage count `29`, big-endian —
/// exactly `52 54 4C 30 00 00 00 01 00 00 00 1D` per spec.
pub const HANDSHAKE: [u8; 12] = [
    b'R', b'T', b'L', b'0', 0, 0, 0, 1, 0, 0, 0, 0x1D,
];

struct Client {
    tx: mpsc::Sender<Vec<u8>>,
}

/// Fans IQ frames out to every connected RTL-TCP client.
pub struct RtlBroadcaster {
    clients: Arc<Mutex<Vec<Client>>>,
}

impl Default for RtlBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl RtlBroadcaster {
    pub fn new() -> Self {
        Self { clients: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Bind `addr` and run the accept loop until the listener errors.
    /// Each accepted connection gets the 12-byte handshake, then a
    /// per-client outbound channel is registered for `broadcast` to feed.
    pub async fn serve(&self, addr: std::net::SocketAddr) -> Result<(), RangeError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RangeError::BusUnavailable(format!("rtl-tcp bind {addr}: {e}")))?;
        tracing::info!(%addr, "RTL-TCP server listening");

        loop {
            let (socket, peer) = match listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "RTL-TCP accept failed");
                    continue;
                }
            };
            let clients = Arc::clone(&self.clients);
            tokio::spawn(async move {
                if let Err(e) = handle_client(socket, peer, clients).await {
                    tracing::warn!(%peer, error = %e, "RTL-TCP client error");
                }
            });
        }
    }

    /// Serialize `frame` per the RTL-TCP wire format (two `u8` bytes per
    /// sample, I then Q, `round(127.5*x + 127.5)`) and push it to every
    /// connected client. A client whose channel is closed or full is
    /// dropped from the fan-out; it never affects the others.
    pub async fn broadcast(&self, frame: &Frame) {
        if frame.is_empty() {
            return;
        }
        let bytes = serialize_frame(frame);
        let mut clients = self.clients.lock();
        clients.retain(|client| client.tx.try_send(bytes.clone()).is_ok());
    }
}

fn serialize_frame(frame: &Frame) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frame.len() * 2);
    for sample in frame {
        bytes.push(to_u8(sample.i));
        bytes.push(to_u8(sample.q));
    }
    bytes
}

fn to_u8(x: f32) -> u8 {
    (x.clamp(-1.0, 1.0) * 127.5 + 127.5).round().clamp(0.0, 255.0) as u8
}

async fn handle_client(
    mut socket: TcpStream,
    peer: std::net::SocketAddr,
    clients: Arc<Mutex<Vec<Client>>>,
) -> std::io::Result<()> {
    socket.write_all(&HANDSHAKE).await?;
    socket.flush().await?;
    tracing::info!(%peer, "RTL-TCP client connected");

    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(64);
    clients.lock().push(Client { tx });

    let (mut reader, mut writer) = socket.into_split();

    // Client inbound bytes are read and discarded — commands are not
    // honored in this version (spec §4.6).
    let drain = tokio::spawn(async move {
        let mut buf = [0u8; 64];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => continue,
            }
        }
    });

    while let Some(chunk) = rx.recv().await {
        if writer.write_all(&chunk).await.is_err() {
            break;
        }
    }

    drain.abort();
    clients.lock().retain(|c| !c.tx.is_closed());
    tracing::info!(%peer, "RTL-TCP client disconnected");
    Ok(())
}

#[cfg(test)]
#[path = "broadcaster_tests.rs"]
mod tests;
