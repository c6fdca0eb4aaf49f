// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn clean_frame(n: usize) -> Frame {
    vec![IqSample::new(0.25, -0.25); n]
}

#[test]
fn clear_mixer_returns_input_unchanged() {
    let mixer = SignalMixer::new();
    let clean = clean_frame(16);
    assert_eq!(mixer.mix(&clean), clean);
}

#[test]
fn cw_mode_adds_nonzero_content() {
    let mixer = SignalMixer::new();
    mixer.set(JammingMixKind::Cw, -30.0);
    let clean = clean_frame(64);
    let mixed = mixer.mix(&clean);
    assert_ne!(mixed, clean);
    assert_eq!(mixed.len(), clean.len());
}

#[test]
fn db_to_amplitude_matches_reference_formula() {
    let amplitude = range_core::JammingMode::db_to_amplitude(-30.0);
    let expected = 10f32.powf(-30.0 / 20.0);
    assert!((amplitude - expected).abs() < 1e-6);
}

#[test]
fn clear_after_set_returns_to_bit_exact_input() {
    let mixer = SignalMixer::new();
    mixer.set(JammingMixKind::Noise, -20.0);
    let clean = clean_frame(32);
    assert_ne!(mixer.mix(&clean), clean);

    mixer.clear();
    assert_eq!(mixer.mix(&clean), clean);
}

#[test]
fn pulse_mode_gates_on_and_off_within_one_period() {
    let mixer = SignalMixer::new();
    mixer.set(JammingMixKind::Pulse, 0.0);
    let clean = vec![IqSample::ZERO; PULSE_PERIOD_SAMPLES];
    let mixed = mixer.mix(&clean);

    let on_count = mixed.iter().filter(|s| s.i.abs() > 1e-6 || s.q.abs() > 1e-6).count();
    assert_eq!(on_count, PULSE_WIDTH_SAMPLES);
}

#[test]
fn sweep_and_chirp_modes_produce_distinct_nonzero_content() {
    let mixer = SignalMixer::new();
    let clean = clean_frame(128);

    mixer.set(JammingMixKind::Sweep, -10.0);
    let sweep = mixer.mix(&clean);

    mixer.set(JammingMixKind::Chirp, -10.0);
    let chirp = mixer.mix(&clean);

    assert_ne!(sweep, clean);
    assert_ne!(chirp, clean);
    assert_ne!(sweep, chirp);
}

#[test]
fn current_kind_reflects_last_set_or_clear() {
    let mixer = SignalMixer::new();
    assert_eq!(mixer.current_kind(), None);
    mixer.set(JammingMixKind::Chirp, -5.0);
    assert_eq!(mixer.current_kind(), Some(JammingMixKind::Chirp));
    mixer.clear();
    assert_eq!(mixer.current_kind(), None);
}
