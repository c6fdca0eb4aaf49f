// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The IQ Streaming Core: a real-time-paced sample producer, a signal
//! mixer applying jamming waveforms, and a multi-client RTL-TCP
//! broadcaster. Structurally the same clocked-producer-feeding-many-
//! subscribers problem as the exercise tick loop in `range-engine`, but
//! independent of exercise lifecycle — a scenario's RF pipeline runs
//! under its own play/pause/stop control, driven by MessageBus control
//! messages rather than `ExerciseState`.

pub mod broadcaster;
pub mod mixer;
pub mod pipeline;
pub mod producer;
pub mod sample;

pub use broadcaster::{RtlBroadcaster, HANDSHAKE};
pub use mixer::{JammingMixKind, SignalMixer};
pub use pipeline::run_stream_loop;
pub use producer::{ProducerState, SampleProducer};
pub use sample::{Frame, IqSample};
