// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unified error type for the exercise execution engine.

use thiserror::Error;

/// Errors surfaced by the engine and its adapters.
///
/// The engine recovers locally from [`RangeError::BusUnavailable`] and
/// [`RangeError::StoreUnavailable`] (log, continue) and from
/// [`RangeError::LaunchConflict`] (destroy-then-relaunch). All other
/// variants are surfaced to the caller.
#[derive(Debug, Error)]
pub enum RangeError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed: {0}")]
    Malformed(String),

    #[error("timeline missing: {0}")]
    TimelineMissing(String),

    #[error("invalid transition: {from} does not accept {command}")]
    InvalidTransition { from: String, command: String },

    #[error("deploy failed: {0}")]
    DeployFailed(String),

    #[error("launch conflict: worker {0} already exists")]
    LaunchConflict(String),

    #[error("message bus unavailable: {0}")]
    BusUnavailable(String),

    #[error("status store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("producer I/O error: {0}")]
    ProducerIOError(String),
}

impl From<std::io::Error> for RangeError {
    fn from(e: std::io::Error) -> Self {
        RangeError::ProducerIOError(e.to_string())
    }
}

impl From<serde_json::Error> for RangeError {
    fn from(e: serde_json::Error) -> Self {
        RangeError::Malformed(e.to_string())
    }
}
