// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reads a scenario and its per-team timelines into validated in-memory
//! records. Grounded on
//! `original_source/orchestration/app/executor.py::load_scenario` (same
//! `<scenario_id>.json` + per-team `timeline_file` layout) with `serde_json`
//! standing in for the original's `json.load`.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::collections::{HashMap, HashSet};
use std::path::Path;

use range_core::{LoadedScenario, RangeError, Scenario, Timeline};

/// Load `scenario_id` and every team's timeline from `scenarios_root`.
///
/// Fails with [`RangeError::NotFound`] if the scenario file is absent,
/// [`RangeError::Malformed`] on a parse/schema error or a timeline with
/// duplicate inject ids, and [`RangeError::TimelineMissing`] if a
/// referenced timeline file doesn't exist. Performs no mutation of any
/// file. Each returned timeline is stable-sorted by `time` ascending —
/// `slice::sort_by_key` is a stable sort in Rust, so ties keep their
/// original file order.
pub fn load(scenario_id: &str, scenarios_root: &Path) -> Result<LoadedScenario, RangeError> {
    let scenario_path = scenarios_root.join(format!("{scenario_id}.json"));
    let scenario_contents = std::fs::read_to_string(&scenario_path).map_err(|_| {
        RangeError::NotFound(format!("scenario file not found: {}", scenario_path.display()))
    })?;
    let scenario: Scenario = serde_json::from_str(&scenario_contents)
        .map_err(|e| RangeError::Malformed(format!("{}: {e}", scenario_path.display())))?;

    let mut timelines = HashMap::with_capacity(scenario.teams.len());
    for team in &scenario.teams {
        let timeline_path = scenarios_root.join(&team.timeline_file);
        let timeline_contents = std::fs::read_to_string(&timeline_path).map_err(|_| {
            RangeError::TimelineMissing(format!(
                "team {} timeline not found: {}",
                team.id,
                timeline_path.display()
            ))
        })?;
        let mut timeline: Timeline = serde_json::from_str(&timeline_contents)
            .map_err(|e| RangeError::Malformed(format!("{}: {e}", timeline_path.display())))?;

        validate_unique_inject_ids(&timeline)?;
        timeline.sort_by_time();

        timelines.insert(team.id, timeline);
    }

    Ok(LoadedScenario { scenario, timelines })
}

fn validate_unique_inject_ids(timeline: &Timeline) -> Result<(), RangeError> {
    let mut seen = HashSet::with_capacity(timeline.injects.len());
    for inject in &timeline.injects {
        if !seen.insert(inject.id.as_str().to_string()) {
            return Err(RangeError::Malformed(format!(
                "timeline {} has duplicate inject id {}",
                timeline.id, inject.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
