// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

// --- define_id! macro tests (generated ids, e.g. WorkerId) ---

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId("tst-");
}

#[test]
fn define_id_generates_unique_ids() {
    let a = TestId::new();
    let b = TestId::new();
    assert_ne!(a, b);
    assert!(a.as_str().starts_with("tst-"));
}

#[test]
fn define_id_hash_map_lookup() {
    let id = TestId::from_string("tst-abc");
    let mut map = HashMap::new();
    map.insert(id, 42);
    assert_eq!(map.get("tst-abc"), Some(&42));
}

#[test]
fn define_id_suffix_strips_prefix() {
    let id = TestId::from_string("tst-abcdef");
    assert_eq!(id.suffix(), "abcdef");
}

#[test]
fn define_id_short_truncates_suffix() {
    let id = TestId::from_string("tst-abcdefghijklmnop");
    assert_eq!(id.short(8), "abcdefgh");
}

// --- define_string_id! macro tests (externally-authored ids) ---

crate::define_string_id! {
    /// Test string-id type for macro verification.
    pub struct TestStringId;
}

#[test]
fn define_string_id_roundtrips() {
    let id = TestStringId::from_string("blue");
    assert_eq!(id.as_str(), "blue");
    assert_eq!(id, "blue");
    assert_eq!(id.to_string(), "blue");
}

#[test]
fn define_string_id_hash_map_lookup() {
    let mut map = HashMap::new();
    map.insert(TestStringId::from_string("red"), 1);
    assert_eq!(map.get("red"), Some(&1));
}

#[test]
fn define_string_id_from_conversions() {
    let from_str: TestStringId = "blue".into();
    let from_string: TestStringId = String::from("blue").into();
    assert_eq!(from_str, from_string);
}

// --- domain id types ---

#[test]
fn scenario_team_inject_ids_roundtrip() {
    let scenario = ScenarioId::from_string("maritime-01");
    let team = TeamId::from_string("blue");
    let inject = InjectId::from_string("a");
    assert_eq!(scenario.as_str(), "maritime-01");
    assert_eq!(team.as_str(), "blue");
    assert_eq!(inject.as_str(), "a");
}

#[test]
fn worker_id_is_generated_and_prefixed() {
    let id = WorkerId::new();
    assert!(id.as_str().starts_with("wkr-"));
    assert_ne!(WorkerId::new(), WorkerId::new());
}

// --- short() free function ---

#[test]
fn short_fn_on_str() {
    let s = "abcdefghijklmnop";
    assert_eq!(short(s, 8), "abcdefgh");
    assert_eq!(short(s, 100), s);
    assert_eq!(short("abc", 8), "abc");
}
