// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure tick-planning logic, split out of the engine's tick loop so the
//! monotonicity/exactly-once/ordering properties can be checked without a
//! clock, a bus, or a store — grounded on
//! `original_source/orchestration/app/executor.py::run`'s per-tick body,
//! generalized to the catch-up semantics the scheduler requires
//! (`time <= e`, not `time == e`, so a delayed tick still delivers).

use std::collections::HashMap;

use range_core::{DeliverySet, Inject, TeamId, Timeline};

/// One inject due for delivery to one team on this tick.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub team_id: TeamId,
    pub inject: Inject,
}

/// Everything one tick needs to do, computed without touching the bus,
/// the store, or the clock.
#[derive(Debug, Clone)]
pub struct TickPlan {
    pub elapsed: u64,
    /// Whether `elapsed` differs from the previous tick's emitted second —
    /// gates the timer publish/store write, not the inject scan.
    pub timer_changed: bool,
    pub formatted: String,
    /// In per-team timeline order; no ordering guarantee across teams.
    pub deliveries: Vec<Delivery>,
}

/// Format elapsed seconds as `T+MM:SS`.
pub fn format_timer(elapsed: u64) -> String {
    format!("T+{:02}:{:02}", elapsed / 60, elapsed % 60)
}

/// Compute the plan for one tick at exercise-elapsed second `elapsed`.
///
/// `delivered` is keyed per team (not one flat set) so two teams can
/// reuse the same `inject_id` in their own timelines without one
/// suppressing the other's delivery. Each team's timeline is already
/// sorted ascending by `time` (the loader guarantees this), so the scan
/// stops at the first inject whose `time` exceeds `elapsed` rather than
/// visiting the whole timeline every tick.
pub fn plan_tick(
    timelines: &HashMap<TeamId, Timeline>,
    delivered: &mut HashMap<TeamId, DeliverySet>,
    elapsed: u64,
    last_emitted: Option<u64>,
) -> TickPlan {
    let mut deliveries = Vec::new();
    for (team_id, timeline) in timelines {
        let set = delivered.entry(*team_id).or_default();
        for inject in &timeline.injects {
            if inject.time > elapsed {
                break;
            }
            if set.contains(&inject.id) {
                continue;
            }
            set.insert(inject.id);
            deliveries.push(Delivery { team_id: *team_id, inject: inject.clone() });
        }
    }

    TickPlan {
        elapsed,
        timer_changed: last_emitted != Some(elapsed),
        formatted: format_timer(elapsed),
        deliveries,
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
