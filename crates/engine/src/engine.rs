// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ExerciseEngine`: owns one active scenario's state, composes the
//! MessageBus/StatusStore/Launcher adapters and the Scheduler, and exposes
//! the lifecycle operations from the state diagram.
//!
//! Grounded line-by-line on
//! `original_source/orchestration/app/executor.py`'s `start`/`begin`/
//! `pause`/`resume`/`run`/`stop` methods, restructured around a state
//! object shared via `Arc<Mutex<Inner>>` with a background tick task
//! rather than the event-sourced WAL machinery around it, which has no
//! counterpart here (Non-goals exclude
//! durable inject-delivery persistence).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use range_adapters::{Launcher, MessageBus, Qos, StatusStore, WorkerSpec};
use range_core::{
    Clock, ClockState, DeliverySet, LoadedScenario, RangeError, Scenario, SystemClock, TeamId,
    Timeline, WorkerHandle, WorkerKind,
};
use range_iq::{JammingMixKind, RtlBroadcaster, SampleProducer, SignalMixer};
use range_wire::{ControlResponse, TeamStatus, TimerSnapshot};

use crate::scheduler::{self, TickPlan};

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_IQ_CHUNK_SAMPLES: usize = 16384;
const DEFAULT_IQ_SAMPLE_RATE: u32 = 1_024_000;

fn control_topic(scenario: &str) -> String {
    format!("/exercise/{scenario}/control")
}

fn timer_topic(scenario: &str) -> String {
    format!("/exercise/{scenario}/timer")
}

fn feed_topic(scenario: &str, team: &str) -> String {
    format!("/exercise/{scenario}/team/{team}/feed")
}

/// In-process handles for the optional IQ Streaming Core, present only
/// when the scenario names an `iq_file`. This workspace carries C7–C9 as
/// its own `range-iq` crate rather than deploying a separate container for
/// them (the original's `sdr-service`), since here they're part of the
/// same core invariant-carrying pipeline, not an external collaborator.
struct IqHandles {
    producer: Arc<SampleProducer>,
    mixer: Arc<SignalMixer>,
    broadcaster: Arc<RtlBroadcaster>,
    rtl_bind: SocketAddr,
}

struct Inner {
    state: range_core::ExerciseState,
    clock: ClockState,
    /// Per-team delivery sets — not one flat set — so two teams reusing the
    /// same `inject_id` in their own timelines don't suppress each other.
    delivered: HashMap<TeamId, DeliverySet>,
    last_emitted: Option<u64>,
    workers: Vec<WorkerHandle>,
}

/// Background tasks spawned by `begin` and torn down by `stop`. The tick
/// task exits cooperatively on its own — an in-flight tick is never hard
/// cancelled; the IQ streaming loop has no such exit condition of
/// its own, so it and the jamming-control subscriber are aborted directly
/// at `stop`/`Drop`.
#[derive(Default)]
struct Tasks {
    tick: Option<JoinHandle<()>>,
    iq_stream: Option<JoinHandle<()>>,
    jamming_control: Option<JoinHandle<()>>,
}

impl Tasks {
    fn abort_all(&mut self) {
        if let Some(h) = self.iq_stream.take() {
            h.abort();
        }
        if let Some(h) = self.jamming_control.take() {
            h.abort();
        }
        // tick is left to exit on its own next wake-up, not hard-cancelled.
        self.tick.take();
    }
}

/// Owns one active scenario. `range-daemon`'s engine table is the single
/// owner of a mapping from scenario_id to `ExerciseEngine`; this type is
/// what it maps to.
pub struct ExerciseEngine<C: Clock = SystemClock> {
    scenario_id: String,
    scenario: Scenario,
    timelines: Arc<HashMap<TeamId, Timeline>>,
    clock: C,
    bus: Arc<dyn MessageBus>,
    store: Arc<dyn StatusStore>,
    launcher: Arc<dyn Launcher>,
    inner: Arc<Mutex<Inner>>,
    iq: Option<IqHandles>,
    tasks: Mutex<Tasks>,
}

impl<C: Clock + 'static> ExerciseEngine<C> {
    /// `deploy`: load (already-loaded) scenario data, launch one dashboard
    /// worker per team, and — if `scenario.iq_file` is set — construct the
    /// in-process IQ pipeline. On any worker launch failure, every worker
    /// already launched for this `deploy` is destroyed in reverse creation
    /// order and `DeployFailed`/`LaunchConflict` is surfaced; no partial
    /// engine is left behind.
    pub async fn deploy(
        loaded: LoadedScenario,
        clock: C,
        bus: Arc<dyn MessageBus>,
        store: Arc<dyn StatusStore>,
        launcher: Arc<dyn Launcher>,
        rtl_bind: SocketAddr,
    ) -> Result<Self, RangeError> {
        let LoadedScenario { scenario, timelines } = loaded;
        let scenario_id = scenario.scenario_id.as_str().to_string();

        let mut workers = Vec::with_capacity(scenario.teams.len());
        for (index, team) in scenario.teams.iter().enumerate() {
            let image = team
                .dashboard_image
                .clone()
                .or_else(|| scenario.dashboard_image.clone())
                .unwrap_or_else(|| "team-dashboard:latest".to_string());
            let port = team.dashboard_port.unwrap_or(3100 + index as u16);
            let name = format!("team-dashboard-{scenario_id}-{}", team.id);

            let spec = WorkerSpec::new(name, WorkerKind::Dashboard, image)
                .team_id(team.id.as_str().to_string())
                .ports(vec![(port, 80)])
                .env(vec![
                    ("VITE_TEAM_ID".to_string(), team.id.as_str().to_string()),
                    (
                        "VITE_MQTT_TOPIC".to_string(),
                        feed_topic(&scenario_id, team.id.as_str()),
                    ),
                ]);

            match launcher.launch(spec).await {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    rollback(&launcher, &workers).await;
                    return Err(e);
                }
            }
        }

        let iq = match &scenario.iq_file {
            Some(path) => {
                let producer = SampleProducer::load(path.as_ref(), DEFAULT_IQ_SAMPLE_RATE)
                    .map(Arc::new)
                    .map_err(|e| {
                        RangeError::DeployFailed(format!("loading iq_file {path}: {e}"))
                    });
                match producer {
                    Ok(producer) => Some(IqHandles {
                        producer,
                        mixer: Arc::new(SignalMixer::new()),
                        broadcaster: Arc::new(RtlBroadcaster::new()),
                        rtl_bind,
                    }),
                    Err(e) => {
                        rollback(&launcher, &workers).await;
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        if let Err(e) = store.put_state(&scenario_id, "NotStarted").await {
            tracing::warn!(scenario = %scenario_id, error = %e, "status store unavailable on deploy");
        }

        tracing::info!(scenario = %scenario_id, teams = workers.len(), "exercise deployed");

        Ok(Self {
            scenario_id,
            scenario,
            timelines: Arc::new(timelines),
            clock,
            bus,
            store,
            launcher,
            inner: Arc::new(Mutex::new(Inner {
                state: range_core::ExerciseState::NotStarted,
                clock: ClockState::new(),
                delivered: HashMap::new(),
                last_emitted: None,
                workers,
            })),
            iq,
            tasks: Mutex::new(Tasks::default()),
        })
    }

    fn require(&self, expected: &[range_core::ExerciseState], command: &str) -> Result<(), RangeError> {
        let state = self.inner.lock().state;
        if expected.contains(&state) {
            Ok(())
        } else {
            Err(RangeError::InvalidTransition { from: state.to_string(), command: command.to_string() })
        }
    }

    /// `begin`: `NotStarted` → `Running`. Starts the exercise clock, spawns
    /// the tick loop, and — if this scenario has an IQ pipeline — starts
    /// playback and the streaming/jamming-control tasks.
    pub async fn begin(&self) -> Result<ControlResponse, RangeError> {
        self.require(&[range_core::ExerciseState::NotStarted], "begin")?;
        {
            let mut inner = self.inner.lock();
            inner.clock.begin(self.clock.now());
            inner.state = range_core::ExerciseState::Running;
        }

        self.put_state_best_effort("Running").await;
        self.publish_control_best_effort("start").await;

        let tick = tokio::spawn(tick_loop(
            Arc::clone(&self.inner),
            self.clock.clone(),
            Arc::clone(&self.bus),
            Arc::clone(&self.store),
            self.scenario_id.clone(),
            Arc::clone(&self.timelines),
            DEFAULT_TICK_INTERVAL,
        ));

        let mut iq_stream = None;
        let mut jamming_control = None;
        if let Some(iq) = &self.iq {
            iq.producer.play();
            iq_stream = Some(tokio::spawn(spawn_iq_pipeline(
                Arc::clone(&iq.producer),
                Arc::clone(&iq.mixer),
                Arc::clone(&iq.broadcaster),
                iq.rtl_bind,
            )));
            jamming_control = Some(tokio::spawn(jamming_control_loop(
                self.bus.subscribe(&control_topic(&self.scenario_id)),
                Arc::clone(&iq.producer),
                Arc::clone(&iq.mixer),
            )));
        }

        {
            let mut tasks = self.tasks.lock();
            tasks.tick = Some(tick);
            tasks.iq_stream = iq_stream;
            tasks.jamming_control = jamming_control;
        }

        Ok(ControlResponse::new("Exercise started", self.scenario_id.clone()))
    }

    /// `pause`: `Running` → `Paused`. Freezes the clock in place.
    pub async fn pause(&self) -> Result<ControlResponse, RangeError> {
        self.require(&[range_core::ExerciseState::Running], "pause")?;
        {
            let mut inner = self.inner.lock();
            inner.clock.pause(self.clock.now());
            inner.state = range_core::ExerciseState::Paused;
        }
        self.put_state_best_effort("Paused").await;
        self.publish_control_best_effort("pause").await;
        if let Some(iq) = &self.iq {
            iq.producer.pause();
        }
        Ok(ControlResponse::new("Exercise paused", self.scenario_id.clone()))
    }

    /// `resume`: `Paused` → `Running`.
    pub async fn resume(&self) -> Result<ControlResponse, RangeError> {
        self.require(&[range_core::ExerciseState::Paused], "resume")?;
        {
            let mut inner = self.inner.lock();
            inner.clock.resume(self.clock.now());
            inner.state = range_core::ExerciseState::Running;
        }
        self.put_state_best_effort("Running").await;
        self.publish_control_best_effort("resume").await;
        if let Some(iq) = &self.iq {
            iq.producer.play();
        }
        Ok(ControlResponse::new("Exercise resumed", self.scenario_id.clone()))
    }

    /// `finish`: `Running`/`Paused` → `Finished`. Freezes the clock and
    /// keeps dashboards (and the IQ pipeline) alive — only `stop` tears
    /// those down. Not echoed on the control topic: only
    /// `start|pause|resume|stop` are control-topic commands.
    pub async fn finish(&self) -> Result<ControlResponse, RangeError> {
        self.require(
            &[range_core::ExerciseState::Running, range_core::ExerciseState::Paused],
            "finish",
        )?;
        {
            let mut inner = self.inner.lock();
            inner.clock.freeze(self.clock.now());
            inner.state = range_core::ExerciseState::Finished;
        }
        self.put_state_best_effort("Finished").await;
        Ok(ControlResponse::new("Exercise finished", self.scenario_id.clone()))
    }

    /// `stop`: any non-`Stopped` state → `Stopped`. Destroys every worker
    /// in reverse creation order and purges the StatusStore mirror for
    /// this scenario.
    pub async fn stop(&self) -> Result<ControlResponse, RangeError> {
        let workers = {
            let mut inner = self.inner.lock();
            if inner.state == range_core::ExerciseState::Stopped {
                return Err(RangeError::InvalidTransition {
                    from: inner.state.to_string(),
                    command: "stop".to_string(),
                });
            }
            if inner.clock.start_wall.is_some() {
                inner.clock.freeze(self.clock.now());
            }
            inner.state = range_core::ExerciseState::Stopped;
            std::mem::take(&mut inner.workers)
        };

        self.tasks.lock().abort_all();
        if let Some(iq) = &self.iq {
            iq.producer.stop();
        }

        self.publish_control_best_effort("stop").await;
        self.put_state_best_effort("Stopped").await;

        for worker in workers.iter().rev() {
            if let Err(e) = self.launcher.destroy(worker).await {
                tracing::warn!(worker = %worker.name, error = %e, "failed to destroy worker on stop");
            }
        }

        if let Err(e) = self.store.purge(&self.scenario_id).await {
            tracing::warn!(scenario = %self.scenario_id, error = %e, "status store purge failed");
        }

        tracing::info!(scenario = %self.scenario_id, "exercise stopped");
        Ok(ControlResponse::new("Exercise stopped", self.scenario_id.clone()))
    }

    /// `status`: a point-in-time snapshot. Never fails — StatusStore reads
    /// are best-effort and default to a conservative value on error.
    pub async fn status(&self) -> ControlResponse {
        let (state, elapsed, per_team, dashboard_urls) = {
            let inner = self.inner.lock();
            let elapsed = inner.clock.elapsed_seconds(self.clock.now());
            let per_team: Vec<(TeamId, u64)> =
                inner.delivered.iter().map(|(id, set)| (*id, set.len() as u64)).collect();
            let dashboard_urls = inner
                .workers
                .iter()
                .filter_map(|w| w.team_id.as_ref().map(|t| (t.clone(), w.url.clone())))
                .collect::<HashMap<_, _>>();
            (inner.state, elapsed, per_team, dashboard_urls)
        };

        let mut teams = Vec::with_capacity(per_team.len());
        for (team_id, delivered) in per_team {
            let connected = self
                .store
                .team_connected(&self.scenario_id, team_id.as_str())
                .await
                .unwrap_or(false);
            teams.push(TeamStatus { id: team_id.as_str().to_string(), delivered, connected });
        }

        ControlResponse::new(format!("Exercise {state}"), self.scenario_id.clone())
            .with_dashboard_urls(dashboard_urls)
            .with_teams(teams)
            .with_timer(TimerSnapshot { elapsed, formatted: scheduler::format_timer(elapsed) })
            .with_current_state(state.to_string())
    }

    async fn put_state_best_effort(&self, state: &str) {
        if let Err(e) = self.store.put_state(&self.scenario_id, state).await {
            tracing::warn!(scenario = %self.scenario_id, error = %e, "status store unavailable");
        }
    }

    async fn publish_control_best_effort(&self, command: &str) {
        let payload = serde_json::json!({ "command": command, "timestamp": self.clock.epoch_ms() });
        if let Err(e) = self
            .bus
            .publish(&control_topic(&self.scenario_id), payload, Qos::AtLeastOnce)
            .await
        {
            tracing::warn!(scenario = %self.scenario_id, command, error = %e, "control publish failed");
        }
    }
}

impl<C: Clock> Drop for ExerciseEngine<C> {
    fn drop(&mut self) {
        self.tasks.lock().abort_all();
    }
}

async fn rollback(launcher: &Arc<dyn Launcher>, workers: &[WorkerHandle]) {
    for worker in workers.iter().rev() {
        if let Err(e) = launcher.destroy(worker).await {
            tracing::warn!(worker = %worker.name, error = %e, "rollback destroy failed");
        }
    }
}

/// The scheduling task: one 100 ms-cadence loop per active exercise.
/// Exits as soon as it observes a non-`Running`/`Paused` state —
/// cooperative shutdown, never hard-cancelled mid-tick.
async fn tick_loop<C: Clock>(
    inner: Arc<Mutex<Inner>>,
    clock: C,
    bus: Arc<dyn MessageBus>,
    store: Arc<dyn StatusStore>,
    scenario_id: String,
    timelines: Arc<HashMap<TeamId, Timeline>>,
    tick_interval: Duration,
) {
    loop {
        let state = inner.lock().state;
        match state {
            range_core::ExerciseState::Running => {
                let plan = {
                    let mut guard = inner.lock();
                    let elapsed = guard.clock.elapsed_seconds(clock.now());
                    let last_emitted = guard.last_emitted;
                    let plan = scheduler::plan_tick(
                        &timelines,
                        &mut guard.delivered,
                        elapsed,
                        last_emitted,
                    );
                    guard.last_emitted = Some(elapsed);
                    plan
                };
                run_tick_effects(&bus, &store, &scenario_id, plan).await;
            }
            range_core::ExerciseState::Paused => {}
            range_core::ExerciseState::NotStarted
            | range_core::ExerciseState::Finished
            | range_core::ExerciseState::Stopped => return,
        }
        tokio::time::sleep(tick_interval).await;
    }
}

async fn run_tick_effects(
    bus: &Arc<dyn MessageBus>,
    store: &Arc<dyn StatusStore>,
    scenario_id: &str,
    plan: TickPlan,
) {
    if plan.timer_changed {
        let payload = serde_json::json!({ "elapsed": plan.elapsed, "formatted": plan.formatted });
        if let Err(e) = bus.publish(&timer_topic(scenario_id), payload, Qos::BestEffort).await {
            tracing::warn!(scenario = scenario_id, error = %e, "timer publish failed");
        }
        if let Err(e) = store.put_timer(scenario_id, plan.elapsed, &plan.formatted).await {
            tracing::warn!(scenario = scenario_id, error = %e, "timer store write failed");
        }
    }

    for delivery in plan.deliveries {
        let team_id = delivery.team_id.as_str().to_string();
        let inject = &delivery.inject;
        let payload = serde_json::json!({
            "id": inject.id,
            "time": inject.time,
            "type": inject.kind,
            "content": inject.content,
            "media": inject.media,
            "action": inject.action,
            "delivered_at": plan.elapsed,
            "team_id": team_id,
            "exercise_id": scenario_id,
        });

        if let Err(e) =
            bus.publish(&feed_topic(scenario_id, &team_id), payload, Qos::AtLeastOnce).await
        {
            tracing::warn!(
                scenario = scenario_id, team = %team_id, inject = %inject.id, error = %e,
                "inject publish failed; delivery already recorded"
            );
        }
        if let Err(e) = store.mark_delivered(scenario_id, &team_id, inject.id.as_str()).await {
            tracing::warn!(scenario = scenario_id, team = %team_id, error = %e, "mark_delivered failed");
        }
    }
}

/// Runs the producer → mixer → broadcaster loop forever, plus the
/// broadcaster's own accept loop, concurrently.
async fn spawn_iq_pipeline(
    producer: Arc<SampleProducer>,
    mixer: Arc<SignalMixer>,
    broadcaster: Arc<RtlBroadcaster>,
    rtl_bind: SocketAddr,
) {
    let accept = {
        let broadcaster = Arc::clone(&broadcaster);
        tokio::spawn(async move {
            if let Err(e) = broadcaster.serve(rtl_bind).await {
                tracing::error!(error = %e, "RTL-TCP broadcaster exited");
            }
        })
    };
    range_iq::pipeline::run_stream_loop(producer, mixer, broadcaster, DEFAULT_IQ_CHUNK_SAMPLES)
        .await;
    accept.abort();
}

/// Services jamming-mode and sample-file control messages on the exercise
/// control topic — a fourth background task alongside the tick loop and
/// the IQ streaming loop, servicing control messages from the MessageBus
/// and mutating producer/mixer state. Lifecycle commands on the same
/// topic (`start`/`pause`/.../`stop`) are not jamming/switch commands and
/// fall through the match untouched.
async fn jamming_control_loop(
    mut subscription: range_adapters::Subscription,
    producer: Arc<SampleProducer>,
    mixer: Arc<SignalMixer>,
) {
    while let Some(message) = subscription.recv().await {
        apply_control_command(&producer, &mixer, &message.payload);
    }
}

fn apply_control_command(producer: &SampleProducer, mixer: &SignalMixer, payload: &serde_json::Value) {
    let Some(command) = payload.get("command").and_then(|v| v.as_str()) else { return };

    if command == "switch_iq" {
        if let Some(path) = payload.get("path").and_then(|v| v.as_str()) {
            if let Err(e) = producer.switch_file(std::path::Path::new(path)) {
                tracing::warn!(error = %e, path, "switch_iq failed");
            }
        }
        return;
    }

    let db = payload.get("db").and_then(|v| v.as_f64()).unwrap_or(-10.0) as f32;
    let kind = match command {
        "jamming_cw" => Some(JammingMixKind::Cw),
        "jamming_noise" => Some(JammingMixKind::Noise),
        "jamming_sweep" => Some(JammingMixKind::Sweep),
        "jamming_pulse" => Some(JammingMixKind::Pulse),
        "jamming_chirp" => Some(JammingMixKind::Chirp),
        "jamming_clear" => {
            mixer.clear();
            return;
        }
        _ => None,
    };
    if let Some(kind) = kind {
        mixer.set(kind, db);
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
