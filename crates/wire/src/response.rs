// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use range_core::RangeError;
use serde::{Deserialize, Serialize};

/// Per-team delivery/connection summary, as returned by `status` and
/// embedded in other control responses once an exercise is active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamStatus {
    pub id: String,
    /// Count of injects delivered to this team so far in the current run.
    pub delivered: u64,
    /// Whether the team's dashboard has an active feed subscription.
    pub connected: bool,
}

/// Timer snapshot, mirroring the `/exercise/{scenario}/timer` wire payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub elapsed: u64,
    /// `T+MM:SS` formatted elapsed time.
    pub formatted: String,
}

/// The envelope every control endpoint returns:
/// `{status, scenario, dashboard_urls?, teams?, timer?}` per spec.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlResponse {
    /// Short human-readable status ("Exercise deployed", "Exercise started", ...).
    pub status: String,
    pub scenario: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_urls: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<TeamStatus>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerSnapshot>,
    /// Present only on 400 responses: the state the engine was actually in
    /// when an invalid transition was attempted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<String>,
}

impl ControlResponse {
    pub fn new(status: impl Into<String>, scenario: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            scenario: scenario.into(),
            dashboard_urls: None,
            teams: None,
            timer: None,
            current_state: None,
        }
    }

    pub fn with_dashboard_urls(mut self, urls: HashMap<String, String>) -> Self {
        self.dashboard_urls = Some(urls);
        self
    }

    pub fn with_teams(mut self, teams: Vec<TeamStatus>) -> Self {
        self.teams = Some(teams);
        self
    }

    pub fn with_timer(mut self, timer: TimerSnapshot) -> Self {
        self.timer = Some(timer);
        self
    }

    pub fn with_current_state(mut self, state: impl Into<String>) -> Self {
        self.current_state = Some(state.into());
        self
    }
}

/// Map an engine error to the HTTP status code the (out-of-scope) control
/// surface should return, per the status table in the external-interfaces
/// section: 200 success, 404 not active, 409 already active, 400 invalid
/// transition.
pub fn http_status_for(err: &RangeError) -> u16 {
    match err {
        RangeError::NotFound(_) => 404,
        RangeError::LaunchConflict(_) => 409,
        RangeError::InvalidTransition { .. } => 400,
        RangeError::Malformed(_)
        | RangeError::TimelineMissing(_)
        | RangeError::DeployFailed(_)
        | RangeError::BusUnavailable(_)
        | RangeError::StoreUnavailable(_)
        | RangeError::ProducerIOError(_) => 500,
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
