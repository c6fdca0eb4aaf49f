// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;

fn write_scenario(root: &Path) {
    fs::write(
        root.join("maritime-2team.json"),
        r#"{
            "name": "maritime-2team",
            "description": "two-team maritime exercise",
            "duration_minutes": 60,
            "teams": [
                {"id": "blue", "dashboard_port": 3100, "timeline_file": "blue.json"},
                {"id": "red", "dashboard_port": 3101, "timeline_file": "red.json"}
            ]
        }"#,
    )
    .expect("write scenario");

    fs::write(
        root.join("blue.json"),
        r#"{
            "id": "blue-timeline",
            "name": "Blue Team Timeline",
            "injects": [
                {"id": "b", "time": 5, "type": "news", "content": {"headline": "b"}},
                {"id": "a", "time": 0, "type": "news", "content": {"headline": "a"}}
            ]
        }"#,
    )
    .expect("write blue timeline");

    fs::write(
        root.join("red.json"),
        r#"{
            "id": "red-timeline",
            "name": "Red Team Timeline",
            "injects": [
                {"id": "c", "time": 3, "type": "email", "content": {"subject": "c"}}
            ]
        }"#,
    )
    .expect("write red timeline");
}

#[test]
fn load_sorts_injects_by_time_ascending() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_scenario(dir.path());

    let loaded = load("maritime-2team", dir.path()).expect("load failed");
    assert_eq!(loaded.scenario.teams.len(), 2);

    let blue = loaded.timelines.get("blue").expect("blue timeline");
    let times: Vec<u64> = blue.injects.iter().map(|i| i.time).collect();
    assert_eq!(times, vec![0, 5]);
    assert_eq!(blue.injects[0].id, "a");
}

#[test]
fn load_reports_not_found_for_missing_scenario() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load("does-not-exist", dir.path()).unwrap_err();
    assert!(matches!(err, RangeError::NotFound(_)));
}

#[test]
fn load_reports_malformed_for_bad_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("broken.json"), "{not json}").expect("write");
    let err = load("broken", dir.path()).unwrap_err();
    assert!(matches!(err, RangeError::Malformed(_)));
}

#[test]
fn load_reports_timeline_missing_when_referenced_file_absent() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("gapped.json"),
        r#"{
            "name": "gapped",
            "duration_minutes": 10,
            "teams": [{"id": "blue", "timeline_file": "nope.json"}]
        }"#,
    )
    .expect("write scenario");

    let err = load("gapped", dir.path()).unwrap_err();
    assert!(matches!(err, RangeError::TimelineMissing(_)));
}

#[test]
fn load_rejects_duplicate_inject_ids_within_one_timeline() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("dup.json"),
        r#"{
            "name": "dup",
            "duration_minutes": 10,
            "teams": [{"id": "blue", "timeline_file": "dup-timeline.json"}]
        }"#,
    )
    .expect("write scenario");
    fs::write(
        dir.path().join("dup-timeline.json"),
        r#"{
            "id": "t",
            "name": "t",
            "injects": [
                {"id": "a", "time": 0, "type": "news", "content": {}},
                {"id": "a", "time": 1, "type": "news", "content": {}}
            ]
        }"#,
    )
    .expect("write timeline");

    let err = load("dup", dir.path()).unwrap_err();
    assert!(matches!(err, RangeError::Malformed(_)));
}
