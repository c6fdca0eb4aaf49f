// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The immutable scenario/timeline/inject data model, loaded once by the
//! ScenarioLoader and never mutated thereafter.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::{InjectId, ScenarioId, TeamId};

/// A scripted stimulus delivered to a team's feed at a prescribed offset
/// from exercise start.
///
/// Envelope fields (`id`, `time`, `type`) are validated by the loader;
/// `content` is an opaque structured payload preserved verbatim through
/// publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inject {
    pub id: InjectId,
    /// Non-negative offset in seconds from exercise start.
    pub time: u64,
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque nested payload, never interpreted by the engine.
    pub content: serde_json::Value,
    #[serde(default)]
    pub media: Vec<serde_json::Value>,
    #[serde(default)]
    pub action: Option<serde_json::Value>,
}

/// An ordered sequence of injects for one team, stable-sorted by `time`
/// ascending at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    pub id: String,
    pub name: String,
    pub injects: Vec<Inject>,
}

impl Timeline {
    /// Stable-sort injects by `time` ascending. Ties keep input order —
    /// `slice::sort_by` is a stable sort in Rust, so this is sufficient.
    pub fn sort_by_time(&mut self) {
        self.injects.sort_by_key(|inject| inject.time);
    }
}

/// One participating team within a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    #[serde(default)]
    pub dashboard_port: Option<u16>,
    #[serde(default)]
    pub dashboard_image: Option<String>,
    /// Path to this team's timeline file, relative to the scenarios root.
    pub timeline_file: String,
}

/// An immutable scenario definition: duration and participating teams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(rename = "name")]
    pub scenario_id: ScenarioId,
    #[serde(default)]
    pub description: Option<String>,
    pub duration_minutes: u64,
    #[serde(default)]
    pub dashboard_image: Option<String>,
    /// Optional IQ sample file backing this scenario's RF auxiliary pipeline.
    #[serde(default)]
    pub iq_file: Option<String>,
    pub teams: Vec<Team>,
}

impl Scenario {
    pub fn team(&self, team_id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == *team_id)
    }
}

/// A scenario plus every participating team's loaded timeline.
pub struct LoadedScenario {
    pub scenario: Scenario,
    pub timelines: HashMap<TeamId, Timeline>,
}
