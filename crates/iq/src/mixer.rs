// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Applies an active jamming waveform to each frame, grounded on
//! `original_source/sdr-service/app/signal_mixer.py`'s `SignalMixer`: same
//! five waveform kinds, same reference constants (50 kHz CW offset, 1
//! MHz/s sweep rate, 1024-on/4096-period pulse duty, 500 kHz/s chirp
//! rate), same dB-to-linear-amplitude conversion.
//!
//! Mode updates (`set`/`clear`) are safe to call concurrently with `mix`:
//! the active mode lives behind a single `RwLock`, snapshotted once per
//! `mix` call, so an update either applies to the *next* frame in full or
//! not at all — never mid-frame.

use parking_lot::RwLock;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

use range_core::JammingMode as JammingKind;

use crate::sample::{Frame, IqSample};

const SAMPLE_RATE_HZ: f64 = 1_024_000.0;
const CW_OFFSET_HZ: f64 = 50_000.0;
const SWEEP_RATE_HZ_PER_S: f64 = 1_000_000.0;
const PULSE_WIDTH_SAMPLES: usize = 1024;
const PULSE_PERIOD_SAMPLES: usize = 4096;
const PULSE_CARRIER_FRACTION: f64 = 0.1;
const CHIRP_RATE_HZ_PER_S: f64 = 500_000.0;

/// Which waveform the mixer is currently injecting, plus the sample index
/// the waveform's phase continues from (CW/sweep/chirp are phase-
/// continuous across frames, matching `np.arange(num_samples)` starting
/// fresh each call in the original — continuity here is a deliberate
/// improvement: restarting phase at 0 every frame would produce an
/// audible discontinuity at every frame boundary).
#[derive(Debug, Clone, Copy, PartialEq)]
enum ActiveMode {
    None,
    Cw { amplitude: f32 },
    Noise { amplitude: f32 },
    Sweep { amplitude: f32 },
    Pulse { amplitude: f32 },
    Chirp { amplitude: f32 },
}

impl From<JammingKind> for ActiveMode {
    fn from(mode: JammingKind) -> Self {
        match mode {
            JammingKind::None => ActiveMode::None,
            JammingKind::Cw { amplitude } => ActiveMode::Cw { amplitude },
            JammingKind::Noise { amplitude } => ActiveMode::Noise { amplitude },
            JammingKind::Sweep { amplitude } => ActiveMode::Sweep { amplitude },
            JammingKind::Pulse { amplitude } => ActiveMode::Pulse { amplitude },
            JammingKind::Chirp { amplitude } => ActiveMode::Chirp { amplitude },
        }
    }
}

/// Applies the active jamming waveform to each frame passed to `mix`.
pub struct SignalMixer {
    mode: RwLock<ActiveMode>,
    sample_index: RwLock<u64>,
}

impl Default for SignalMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalMixer {
    pub fn new() -> Self {
        Self { mode: RwLock::new(ActiveMode::None), sample_index: RwLock::new(0) }
    }

    /// Enable jamming at `kind` and `db` (converted via
    /// [`JammingKind::db_to_amplitude`]). Takes effect on the next `mix`.
    pub fn set(&self, kind: JammingMixKind, db: f32) {
        let amplitude = JammingKind::db_to_amplitude(db);
        let mode = match kind {
            JammingMixKind::Cw => ActiveMode::Cw { amplitude },
            JammingMixKind::Noise => ActiveMode::Noise { amplitude },
            JammingMixKind::Sweep => ActiveMode::Sweep { amplitude },
            JammingMixKind::Pulse => ActiveMode::Pulse { amplitude },
            JammingMixKind::Chirp => ActiveMode::Chirp { amplitude },
        };
        *self.mode.write() = mode;
        tracing::info!(?kind, db, "jamming enabled");
    }

    pub fn clear(&self) {
        *self.mode.write() = ActiveMode::None;
        tracing::info!("jamming cleared");
    }

    pub fn current_kind(&self) -> Option<JammingMixKind> {
        match *self.mode.read() {
            ActiveMode::None => None,
            ActiveMode::Cw { .. } => Some(JammingMixKind::Cw),
            ActiveMode::Noise { .. } => Some(JammingMixKind::Noise),
            ActiveMode::Sweep { .. } => Some(JammingMixKind::Sweep),
            ActiveMode::Pulse { .. } => Some(JammingMixKind::Pulse),
            ActiveMode::Chirp { .. } => Some(JammingMixKind::Chirp),
        }
    }

    /// Mix the active jamming waveform into `clean`, returning a new
    /// frame of the same length. `mode` is snapshotted once at the top so
    /// a concurrent `set`/`clear` never applies mid-frame.
    pub fn mix(&self, clean: &Frame) -> Frame {
        let mode = *self.mode.read();
        if mode == ActiveMode::None || clean.is_empty() {
            return clean.clone();
        }

        let start_index = {
            let mut idx = self.sample_index.write();
            let start = *idx;
            *idx += clean.len() as u64;
            start
        };

        let jamming = generate(mode, clean.len(), start_index);
        clean.iter().zip(jamming).map(|(&c, j)| c + j).collect()
    }
}

/// Waveform selector passed to [`SignalMixer::set`] — deliberately
/// distinct from [`range_core::JammingMode`], which also carries the
/// derived amplitude the mixer computes internally from a raw dB value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JammingMixKind {
    Cw,
    Noise,
    Sweep,
    Pulse,
    Chirp,
}

fn generate(mode: ActiveMode, n: usize, start_index: u64) -> Frame {
    match mode {
        ActiveMode::None => vec![IqSample::ZERO; n],
        ActiveMode::Cw { amplitude } => (0..n)
            .map(|k| {
                let t = (start_index + k as u64) as f64 / SAMPLE_RATE_HZ;
                let phase = 2.0 * std::f64::consts::PI * CW_OFFSET_HZ * t;
                IqSample::from_polar(amplitude, phase as f32)
            })
            .collect(),
        ActiveMode::Noise { amplitude } => {
            let mut rng = rand::rngs::StdRng::seed_from_u64(start_index ^ 0x9E37_79B9_7F4A_7C15);
            (0..n)
                .map(|_| {
                    let i: f32 = StandardNormal.sample(&mut rng);
                    let q: f32 = StandardNormal.sample(&mut rng);
                    IqSample::new(i * 0.5, q * 0.5).scale(amplitude / 0.5)
                })
                .collect()
        }
        ActiveMode::Sweep { amplitude } => (0..n)
            .map(|k| {
                let t = (start_index + k as u64) as f64 / SAMPLE_RATE_HZ;
                let freq = SWEEP_RATE_HZ_PER_S * t;
                let phase = 2.0 * std::f64::consts::PI * freq * t;
                IqSample::from_polar(amplitude, phase as f32)
            })
            .collect(),
        ActiveMode::Pulse { amplitude } => (0..n)
            .map(|k| {
                let sample_index = start_index + k as u64;
                let phase_in_period = (sample_index as usize) % PULSE_PERIOD_SAMPLES;
                let gated = if phase_in_period < PULSE_WIDTH_SAMPLES { amplitude } else { 0.0 };
                let carrier_phase =
                    2.0 * std::f64::consts::PI * PULSE_CARRIER_FRACTION * sample_index as f64;
                IqSample::from_polar(gated, carrier_phase as f32)
            })
            .collect(),
        ActiveMode::Chirp { amplitude } => (0..n)
            .map(|k| {
                let t = (start_index + k as u64) as f64 / SAMPLE_RATE_HZ;
                let phase = 2.0 * std::f64::consts::PI * (0.5 * CHIRP_RATE_HZ_PER_S * t * t);
                IqSample::from_polar(amplitude, phase as f32)
            })
            .collect(),
    }
}

#[cfg(test)]
#[path = "mixer_tests.rs"]
mod tests;
