// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real-time-paced producer of fixed-size IQ frames from a file, grounded
//! on `original_source/sdr-service/app/iq_player.py`'s `IQPlayer`: same
//! `complex64` file format, same real-time pacing via a per-chunk sleep,
//! same play/pause/stop/seamless-loop contract.
//!
//! One deliberate departure from the original: `get_chunk` there can
//! return a chunk shorter than `chunk_size` right before it wraps
//! (`samples[position:end_pos]` when `end_pos == len(samples)`). This
//! producer instead wraps to position 0 *before* reading whenever the next
//! full chunk would overrun end-of-file, so `next_chunk` never returns a
//! partial frame — it drops at most one chunk's worth of trailing samples
//! per loop instead.

use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;
use range_core::RangeError;

use crate::sample::{Frame, IqSample};

/// Producer playback state. Mirrors the original's `running`/`paused`
/// booleans as an explicit three-way state, matching the `ExerciseState`
/// enum idiom used elsewhere in this workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
    Stopped,
    Playing,
    Paused,
}

struct Inner {
    samples: Vec<IqSample>,
    position: usize,
    state: ProducerState,
}

/// Loads a file of interleaved little-endian `f32` I/Q pairs into memory
/// and serves it out as real-time-paced, fixed-size frames with a
/// seamless end-of-file loop.
pub struct SampleProducer {
    inner: Mutex<Inner>,
    sample_rate: u32,
}

impl SampleProducer {
    /// Load `path` as a `complex64` IQ file: 8 bytes per sample, `f32` I
    /// then `f32` Q, little-endian, matching `numpy.fromfile(..., dtype=
    /// np.complex64)`'s native byte order on the platforms this targets.
    pub fn load(path: &Path, sample_rate: u32) -> Result<Self, RangeError> {
        let bytes = std::fs::read(path)?;
        if bytes.len() % 8 != 0 {
            return Err(RangeError::ProducerIOError(format!(
                "{}: length {} is not a multiple of 8 bytes (complex64 sample size)",
                path.display(),
                bytes.len()
            )));
        }
        let samples = bytes
            .chunks_exact(8)
            .map(|pair| {
                let i = f32::from_le_bytes([pair[0], pair[1], pair[2], pair[3]]);
                let q = f32::from_le_bytes([pair[4], pair[5], pair[6], pair[7]]);
                IqSample::new(i, q)
            })
            .collect();
        Ok(Self::from_samples(samples, sample_rate))
    }

    pub fn from_samples(samples: Vec<IqSample>, sample_rate: u32) -> Self {
        Self {
            inner: Mutex::new(Inner { samples, position: 0, state: ProducerState::Stopped }),
            sample_rate,
        }
    }

    pub fn state(&self) -> ProducerState {
        self.inner.lock().state
    }

    pub fn position(&self) -> usize {
        self.inner.lock().position
    }

    pub fn play(&self) {
        let mut inner = self.inner.lock();
        inner.state = ProducerState::Playing;
        tracing::info!("IQ playback started");
    }

    pub fn pause(&self) {
        self.inner.lock().state = ProducerState::Paused;
        tracing::info!("IQ playback paused");
    }

    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        inner.state = ProducerState::Stopped;
        inner.position = 0;
        tracing::info!("IQ playback stopped");
    }

    /// Hot-swaps the backing sample buffer without stopping the pipeline —
    /// mirrors the original's `switch_file`. Resets position to the start
    /// of the new buffer; playback state (playing/paused/stopped) carries
    /// over unchanged.
    pub fn switch_file(&self, path: &Path) -> Result<(), RangeError> {
        let replacement = Self::load(path, self.sample_rate)?;
        let mut new_samples = replacement.inner.into_inner().samples;
        let mut inner = self.inner.lock();
        std::mem::swap(&mut inner.samples, &mut new_samples);
        inner.position = 0;
        tracing::info!(path = %path.display(), "IQ sample file switched");
        Ok(())
    }

    /// Return the next `n` samples and advance position, or `None` when
    /// stopped/paused. Paces real time by sleeping `n / sample_rate`
    /// seconds per chunk when a frame is produced, or a fixed 100 ms
    /// backoff when not.
    pub async fn next_chunk(&self, n: usize) -> Option<Frame> {
        let frame = {
            let mut inner = self.inner.lock();
            match inner.state {
                ProducerState::Stopped | ProducerState::Paused => None,
                ProducerState::Playing => {
                    if inner.samples.is_empty() || n == 0 || n > inner.samples.len() {
                        None
                    } else {
                        if inner.position + n > inner.samples.len() {
                            inner.position = 0;
                        }
                        let start = inner.position;
                        let end = start + n;
                        let chunk = inner.samples[start..end].to_vec();
                        inner.position = if end == inner.samples.len() { 0 } else { end };
                        Some(chunk)
                    }
                }
            }
        };

        match &frame {
            Some(_) => {
                tokio::time::sleep(Duration::from_secs_f64(n as f64 / self.sample_rate as f64))
                    .await
            }
            None => tokio::time::sleep(Duration::from_millis(100)).await,
        }

        frame
    }
}

#[cfg(test)]
#[path = "producer_tests.rs"]
mod tests;
