// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use range_core::{DeliverySet, Inject, TeamId, Timeline};
use yare::parameterized;

use super::*;

fn inject(id: &str, time: u64) -> Inject {
    Inject {
        id: id.into(),
        time,
        kind: "news".to_string(),
        content: serde_json::json!({}),
        media: Vec::new(),
        action: None,
    }
}

fn timeline(id: &str, injects: Vec<Inject>) -> Timeline {
    Timeline { id: id.to_string(), name: id.to_string(), injects }
}

#[parameterized(
    zero = { 0 },
    sixty = { 60 },
    ninety_five = { 95 },
)]
fn format_timer_has_t_plus_mm_ss_shape(elapsed: u64) {
    let formatted = format_timer(elapsed);
    assert_eq!(formatted.len(), 8); // "T+MM:SS"
    assert!(formatted.starts_with("T+"));
}

#[test]
fn format_timer_examples() {
    assert_eq!(format_timer(0), "T+00:00");
    assert_eq!(format_timer(65), "T+01:05");
    assert_eq!(format_timer(3661), "T+61:01");
}

#[test]
fn injects_due_exactly_at_elapsed_are_delivered() {
    let blue = TeamId::from_string("blue");
    let mut timelines = HashMap::new();
    timelines.insert(blue, timeline("blue", vec![inject("a", 0), inject("b", 5)]));

    let mut delivered: HashMap<TeamId, DeliverySet> = HashMap::new();
    let plan = plan_tick(&timelines, &mut delivered, 0, None);
    assert_eq!(plan.deliveries.len(), 1);
    assert_eq!(plan.deliveries[0].inject.id.as_str(), "a");
    assert!(plan.timer_changed);
}

#[test]
fn delayed_tick_catches_up_on_skipped_seconds() {
    let blue = TeamId::from_string("blue");
    let mut timelines = HashMap::new();
    timelines.insert(blue, timeline("blue", vec![inject("a", 2), inject("b", 3), inject("c", 4)]));

    let mut delivered: HashMap<TeamId, DeliverySet> = HashMap::new();
    // The tick loop never observed elapsed=2 or 3 — it jumps straight to 4.
    let plan = plan_tick(&timelines, &mut delivered, 4, Some(1));
    let ids: Vec<&str> = plan.deliveries.iter().map(|d| d.inject.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn each_inject_is_delivered_at_most_once_across_ticks() {
    let blue = TeamId::from_string("blue");
    let mut timelines = HashMap::new();
    timelines.insert(blue, timeline("blue", vec![inject("a", 0), inject("b", 1)]));

    let mut delivered: HashMap<TeamId, DeliverySet> = HashMap::new();
    let first = plan_tick(&timelines, &mut delivered, 0, None);
    let second = plan_tick(&timelines, &mut delivered, 1, Some(0));
    let third = plan_tick(&timelines, &mut delivered, 1, Some(1));

    assert_eq!(first.deliveries.len(), 1);
    assert_eq!(second.deliveries.len(), 1);
    assert_eq!(third.deliveries.len(), 0, "re-observing the same second must not redeliver");
}

#[test]
fn ordering_within_a_team_follows_timeline_time_ascending() {
    let blue = TeamId::from_string("blue");
    let mut timelines = HashMap::new();
    timelines.insert(
        blue,
        timeline("blue", vec![inject("a", 0), inject("b", 0), inject("c", 2)]),
    );

    let mut delivered: HashMap<TeamId, DeliverySet> = HashMap::new();
    let plan = plan_tick(&timelines, &mut delivered, 2, None);
    let ids: Vec<&str> = plan.deliveries.iter().map(|d| d.inject.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"], "ties keep input order, smaller time first");
}

#[test]
fn teams_do_not_share_a_delivery_set() {
    let blue = TeamId::from_string("blue");
    let red = TeamId::from_string("red");
    let mut timelines = HashMap::new();
    timelines.insert(blue, timeline("blue", vec![inject("shared", 0)]));
    timelines.insert(red, timeline("red", vec![inject("shared", 0)]));

    let mut delivered: HashMap<TeamId, DeliverySet> = HashMap::new();
    let plan = plan_tick(&timelines, &mut delivered, 0, None);
    assert_eq!(plan.deliveries.len(), 2, "same inject id in two teams' timelines is independent");
}

#[test]
fn timer_changed_is_false_when_elapsed_is_unchanged() {
    let timelines: HashMap<TeamId, Timeline> = HashMap::new();
    let mut delivered: HashMap<TeamId, DeliverySet> = HashMap::new();
    let plan = plan_tick(&timelines, &mut delivered, 7, Some(7));
    assert!(!plan.timer_changed);
}

mod properties {
    use proptest::collection::vec as pvec;
    use proptest::prelude::*;

    use super::*;

    /// A single team's timeline with `time`s already sorted ascending, as
    /// the loader guarantees — `plan_tick` assumes this, doesn't re-sort.
    fn sorted_timeline() -> impl Strategy<Value = Vec<Inject>> {
        pvec(0u64..20, 1..12).prop_map(|mut times| {
            times.sort_unstable();
            times
                .into_iter()
                .enumerate()
                .map(|(i, time)| inject(&format!("i{i}"), time))
                .collect()
        })
    }

    fn non_decreasing_ticks() -> impl Strategy<Value = Vec<u64>> {
        pvec(0u64..20, 1..15).prop_map(|mut ticks| {
            ticks.sort_unstable();
            ticks
        })
    }

    proptest! {
        /// Replaying a timeline across any non-decreasing sequence of
        /// `elapsed` ticks delivers every inject exactly once, in
        /// ascending `time` order, and never delivers anything past its
        /// own due time.
        #[test]
        fn exactly_once_in_order_and_never_early(
            injects in sorted_timeline(),
            ticks in non_decreasing_ticks(),
        ) {
            let blue = TeamId::from_string("blue");
            let mut timelines = HashMap::new();
            timelines.insert(blue, timeline("blue", injects.clone()));

            let mut delivered: HashMap<TeamId, DeliverySet> = HashMap::new();
            let mut seen = Vec::new();
            let mut last = None;
            for elapsed in ticks {
                let plan = plan_tick(&timelines, &mut delivered, elapsed, last);
                for delivery in &plan.deliveries {
                    prop_assert!(delivery.inject.time <= elapsed, "delivered before due");
                    seen.push(delivery.inject.id);
                }
                last = Some(elapsed);
            }

            let unique: std::collections::HashSet<_> = seen.iter().copied().collect();
            prop_assert_eq!(seen.len(), unique.len(), "each inject delivered at most once");

            let mut by_time: Vec<_> = injects.iter().map(|i| (i.time, i.id)).collect();
            by_time.sort_by_key(|&(time, _)| time);
            let expected_order: Vec<_> = by_time.into_iter().map(|(_, id)| id).collect();
            prop_assert_eq!(seen, expected_order, "delivery order follows timeline time ascending");
        }
    }
}
