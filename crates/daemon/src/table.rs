// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ExerciseEngineTable`: the process-wide "single owner owning a mapping
//! from scenario_id to ExerciseEngine". The out-of-scope HTTP control
//! surface is thin request routing over exactly these seven methods — no
//! HTTP framework is added here, since that surface is a named external
//! collaborator, not part of this engine.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use range_adapters::{Launcher, MessageBus, StatusStore};
use range_core::{Config, RangeError, ScenarioId, SystemClock};
use range_engine::ExerciseEngine;
use range_wire::ControlResponse;

pub struct ExerciseEngineTable {
    config: Config,
    bus: Arc<dyn MessageBus>,
    store: Arc<dyn StatusStore>,
    launcher: Arc<dyn Launcher>,
    engines: Mutex<HashMap<ScenarioId, Arc<ExerciseEngine<SystemClock>>>>,
}

impl ExerciseEngineTable {
    pub fn new(
        config: Config,
        bus: Arc<dyn MessageBus>,
        store: Arc<dyn StatusStore>,
        launcher: Arc<dyn Launcher>,
    ) -> Self {
        Self { config, bus, store, launcher, engines: Mutex::new(HashMap::new()) }
    }

    fn lookup(&self, scenario_id: &str) -> Result<Arc<ExerciseEngine<SystemClock>>, RangeError> {
        self.engines
            .lock()
            .get(scenario_id)
            .cloned()
            .ok_or_else(|| RangeError::NotFound(format!("no active exercise: {scenario_id}")))
    }

    /// Loads `scenario_id` from `config.scenarios_root`, launches its
    /// dashboard workers (and optional IQ pipeline), and inserts the engine
    /// into the table. Fails with `LaunchConflict` if already active.
    pub async fn deploy(&self, scenario_id: &str) -> Result<ControlResponse, RangeError> {
        if self.engines.lock().contains_key(scenario_id) {
            return Err(RangeError::LaunchConflict(format!(
                "exercise already active: {scenario_id}"
            )));
        }

        let loaded = range_scenario::load(scenario_id, &self.config.scenarios_root)?;
        let engine = ExerciseEngine::deploy(
            loaded,
            SystemClock,
            Arc::clone(&self.bus),
            Arc::clone(&self.store),
            Arc::clone(&self.launcher),
            self.config.rtl_bind,
        )
        .await?;

        let response = ControlResponse::new("Exercise deployed", scenario_id.to_string());
        self.engines.lock().insert(ScenarioId::from_string(scenario_id), Arc::new(engine));
        Ok(response)
    }

    pub async fn start(&self, scenario_id: &str) -> Result<ControlResponse, RangeError> {
        self.lookup(scenario_id)?.begin().await
    }

    pub async fn pause(&self, scenario_id: &str) -> Result<ControlResponse, RangeError> {
        self.lookup(scenario_id)?.pause().await
    }

    pub async fn resume(&self, scenario_id: &str) -> Result<ControlResponse, RangeError> {
        self.lookup(scenario_id)?.resume().await
    }

    pub async fn finish(&self, scenario_id: &str) -> Result<ControlResponse, RangeError> {
        self.lookup(scenario_id)?.finish().await
    }

    /// Stops the exercise and drops it from the table — `stop` is terminal,
    /// so a later `deploy` of the same `scenario_id` must not collide with
    /// a stale entry.
    pub async fn stop(&self, scenario_id: &str) -> Result<ControlResponse, RangeError> {
        let engine = self.lookup(scenario_id)?;
        let response = engine.stop().await?;
        self.engines.lock().remove(scenario_id);
        Ok(response)
    }

    pub async fn status(&self, scenario_id: &str) -> Result<ControlResponse, RangeError> {
        Ok(self.lookup(scenario_id)?.status().await)
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
