// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use range_adapters::{FakeLauncher, InMemoryStatusStore, InProcessBus};
use range_core::config::{LauncherBackend, StoreBackend};
use range_core::Config;
use range_core::RangeError;
use tempfile::TempDir;

use super::*;

/// Writes a one-team scenario + timeline pair into a fresh scenarios root
/// and returns the root (kept alive for the test's duration) plus the
/// scenario id.
fn write_fixture() -> (TempDir, &'static str) {
    let dir = TempDir::new().unwrap();
    let scenario = serde_json::json!({
        "name": "solo",
        "duration_minutes": 5,
        "teams": [{"id": "blue", "timeline_file": "blue.json"}],
    });
    let timeline = serde_json::json!({
        "id": "blue",
        "name": "blue",
        "injects": [{"id": "a", "time": 0, "type": "news", "content": {}}],
    });
    std::fs::write(dir.path().join("solo.json"), scenario.to_string()).unwrap();
    std::fs::write(dir.path().join("blue.json"), timeline.to_string()).unwrap();
    (dir, "solo")
}

fn test_table(scenarios_root: std::path::PathBuf) -> ExerciseEngineTable {
    let config = Config {
        scenarios_root,
        store_backend: StoreBackend::InMemory,
        redis_url: String::new(),
        store_ttl: Duration::from_secs(60),
        launcher_backend: LauncherBackend::Docker,
        rtl_bind: "127.0.0.1:0".parse().unwrap(),
        tick_interval: Duration::from_millis(100),
    };
    ExerciseEngineTable::new(
        config,
        Arc::new(InProcessBus::new(16)),
        Arc::new(InMemoryStatusStore::new(Duration::from_secs(60))),
        Arc::new(FakeLauncher::new()),
    )
}

#[tokio::test]
async fn deploy_then_status_round_trips() {
    let (dir, scenario_id) = write_fixture();
    let table = test_table(dir.path().to_path_buf());

    let deployed = table.deploy(scenario_id).await.unwrap();
    assert_eq!(deployed.status, "Exercise deployed");

    let status = table.status(scenario_id).await.unwrap();
    assert_eq!(status.current_state.as_deref(), Some("NotStarted"));
}

#[tokio::test]
async fn second_deploy_conflicts() {
    let (dir, scenario_id) = write_fixture();
    let table = test_table(dir.path().to_path_buf());

    table.deploy(scenario_id).await.unwrap();
    let err = table.deploy(scenario_id).await.unwrap_err();
    assert!(matches!(err, RangeError::LaunchConflict(_)));
}

#[tokio::test]
async fn commands_on_an_unknown_scenario_are_not_found() {
    let dir = TempDir::new().unwrap();
    let table = test_table(dir.path().to_path_buf());

    let err = table.start("ghost").await.unwrap_err();
    assert!(matches!(err, RangeError::NotFound(_)));
}

#[tokio::test]
async fn double_start_is_an_invalid_transition() {
    let (dir, scenario_id) = write_fixture();
    let table = test_table(dir.path().to_path_buf());

    table.deploy(scenario_id).await.unwrap();
    table.start(scenario_id).await.unwrap();

    let err = table.start(scenario_id).await.unwrap_err();
    assert!(matches!(err, RangeError::InvalidTransition { .. }));
}

#[tokio::test]
async fn stop_removes_the_scenario_from_the_table() {
    let (dir, scenario_id) = write_fixture();
    let table = test_table(dir.path().to_path_buf());

    table.deploy(scenario_id).await.unwrap();
    table.stop(scenario_id).await.unwrap();

    let err = table.status(scenario_id).await.unwrap_err();
    assert!(matches!(err, RangeError::NotFound(_)));
}

#[tokio::test]
async fn full_lifecycle_pause_resume_finish() {
    let (dir, scenario_id) = write_fixture();
    let table = test_table(dir.path().to_path_buf());

    table.deploy(scenario_id).await.unwrap();
    table.start(scenario_id).await.unwrap();
    table.pause(scenario_id).await.unwrap();
    table.resume(scenario_id).await.unwrap();
    let finished = table.finish(scenario_id).await.unwrap();
    assert_eq!(finished.status, "Exercise finished");
}
