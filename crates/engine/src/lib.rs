// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The exercise execution engine: the lifecycle state machine, the
//! monotonic-offset tick loop, and the StatusStore/MessageBus/Launcher
//! reconciliation that ties them to the outside world, plus the optional
//! in-process IQ Streaming Core wired in when a scenario names an
//! `iq_file`.

pub mod engine;
pub mod scheduler;

pub use engine::ExerciseEngine;
pub use scheduler::{format_timer, plan_tick, Delivery, TickPlan};
