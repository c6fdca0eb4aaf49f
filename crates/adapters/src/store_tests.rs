// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn store() -> InMemoryStatusStore {
    InMemoryStatusStore::new(Duration::from_secs(86_400))
}

#[tokio::test]
async fn mark_delivered_is_idempotent_and_counts_distinct_injects() {
    let store = store();
    assert_eq!(store.mark_delivered("ex1", "blue", "a").await.expect("mark"), 1);
    assert_eq!(store.mark_delivered("ex1", "blue", "b").await.expect("mark"), 2);
    // Re-marking the same inject does not grow the set.
    assert_eq!(store.mark_delivered("ex1", "blue", "a").await.expect("mark"), 2);
    assert_eq!(store.count_delivered("ex1", "blue").await.expect("count"), 2);
}

#[tokio::test]
async fn counts_are_scoped_per_team() {
    let store = store();
    store.mark_delivered("ex1", "blue", "a").await.expect("mark");
    store.mark_delivered("ex1", "red", "c").await.expect("mark");
    assert_eq!(store.count_delivered("ex1", "blue").await.expect("count"), 1);
    assert_eq!(store.count_delivered("ex1", "red").await.expect("count"), 1);
}

#[tokio::test]
async fn team_connected_defaults_to_false() {
    let store = store();
    assert!(!store.team_connected("ex1", "blue").await.expect("connected"));
    store.set_team_connected("ex1", "blue", true).await.expect("set connected");
    assert!(store.team_connected("ex1", "blue").await.expect("connected"));
}

#[tokio::test]
async fn purge_removes_state_timer_and_delivery_for_the_scenario_only() {
    let store = store();
    store.put_state("ex1", "Running").await.expect("put state");
    store.put_timer("ex1", 5, "T+00:05").await.expect("put timer");
    store.mark_delivered("ex1", "blue", "a").await.expect("mark");
    store.mark_delivered("ex2", "blue", "z").await.expect("mark");

    store.purge("ex1").await.expect("purge");

    assert_eq!(store.count_delivered("ex1", "blue").await.expect("count"), 0);
    assert_eq!(store.count_delivered("ex2", "blue").await.expect("count"), 1);
}

#[tokio::test]
async fn expired_entries_read_as_absent() {
    let store = InMemoryStatusStore::new(Duration::from_millis(10));
    store.mark_delivered("ex1", "blue", "a").await.expect("mark");
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(store.count_delivered("ex1", "blue").await.expect("count"), 0);
}
