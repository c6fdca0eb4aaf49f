// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn clock_state_elapsed_is_zero_before_begin() {
    let clock = ClockState::new();
    assert_eq!(clock.elapsed_seconds(Instant::now()), 0);
}

#[test]
fn clock_state_accumulates_across_pause_resume() {
    let mut clock = ClockState::new();
    let t0 = Instant::now();
    clock.begin(t0);
    let t1 = t0 + std::time::Duration::from_secs(5);
    assert_eq!(clock.elapsed_seconds(t1), 5);

    clock.pause(t1);
    let t2 = t1 + std::time::Duration::from_secs(100);
    // Paused: elapsed does not advance with wall time.
    assert_eq!(clock.elapsed_seconds(t2), 5);

    clock.resume(t2);
    let t3 = t2 + std::time::Duration::from_secs(3);
    assert_eq!(clock.elapsed_seconds(t3), 8);
}

#[test]
fn clock_state_begin_resets_accumulated() {
    let mut clock = ClockState::new();
    let t0 = Instant::now();
    clock.begin(t0);
    clock.pause(t0 + std::time::Duration::from_secs(10));
    // A fresh begin (redeploy) zeroes accumulated rather than adding to it.
    let t1 = t0 + std::time::Duration::from_secs(20);
    clock.begin(t1);
    assert_eq!(clock.elapsed_seconds(t1), 0);
}

#[test]
fn clock_state_freeze_behaves_like_pause() {
    let mut clock = ClockState::new();
    let t0 = Instant::now();
    clock.begin(t0);
    let t1 = t0 + std::time::Duration::from_secs(7);
    clock.freeze(t1);
    let t2 = t1 + std::time::Duration::from_secs(100);
    assert_eq!(clock.elapsed_seconds(t2), 7);
}

#[test]
fn delivery_set_insert_is_idempotent() {
    let mut set = DeliverySet::new();
    let id = InjectId::from_string("a");
    assert!(set.insert(id));
    assert!(!set.insert(id));
    assert_eq!(set.len(), 1);
    assert!(set.contains(&id));
}

#[test]
fn delivery_set_starts_empty() {
    let set = DeliverySet::new();
    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
}

#[test]
fn jamming_mode_db_to_amplitude() {
    // 0 dB is unity gain.
    assert!((JammingMode::db_to_amplitude(0.0) - 1.0).abs() < 1e-6);
    // 20 dB is a factor of 10.
    assert!((JammingMode::db_to_amplitude(20.0) - 10.0).abs() < 1e-4);
}

#[test]
fn worker_handle_carries_kind_and_url() {
    let handle = WorkerHandle {
        id: WorkerId::new(),
        name: "team-dashboard-ex1-blue".to_string(),
        kind: WorkerKind::Dashboard,
        team_id: Some("blue".to_string()),
        url: "http://localhost:3100".to_string(),
    };
    assert_eq!(handle.kind, WorkerKind::Dashboard);
    assert_eq!(handle.kind.to_string(), "dashboard");
}
