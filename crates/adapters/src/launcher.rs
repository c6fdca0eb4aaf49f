// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Starts, addresses, and tears down dashboard and auxiliary-service
//! workers, grounded on `original_source/orchestration/app/executor.py`'s
//! `docker.from_env()` deploy/teardown sequence and generalized from the
//! teacher's `adapters::agent::{docker, k8s}` agent-container adapters —
//! same idempotent "inspect, destroy if present, then run" shape, same
//! shelling-out-to-the-CLI style for Docker, same `kube`/`k8s-openapi` Pod
//! construction for Kubernetes.

use async_trait::async_trait;
use range_core::{RangeError, WorkerHandle, WorkerId, WorkerKind};

/// Everything the Launcher needs to start one worker. Built by
/// `range-engine`'s `deploy` from the scenario/team record.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    /// Launcher-level name — used for idempotent relaunch and `destroy`.
    pub name: String,
    pub kind: WorkerKind,
    pub team_id: Option<String>,
    pub image: String,
    pub env: Vec<(String, String)>,
    /// `(host_port, container_port)` pairs.
    pub ports: Vec<(u16, u16)>,
    /// `(host_path, container_path)` pairs.
    pub volumes: Vec<(String, String)>,
    pub network: Option<String>,
}

impl WorkerSpec {
    pub fn new(name: impl Into<String>, kind: WorkerKind, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            team_id: None,
            image: image.into(),
            env: Vec::new(),
            ports: Vec::new(),
            volumes: Vec::new(),
            network: None,
        }
    }

    range_core::setters! {
        set {
            env: Vec<(String, String)>,
            ports: Vec<(u16, u16)>,
            volumes: Vec<(String, String)>,
        }
        option {
            team_id: String,
            network: String,
        }
    }

    /// The externally reachable URL for this worker, derived from its first
    /// published port (dashboards and the SDR service both publish exactly
    /// one host port).
    fn url(&self) -> String {
        match self.ports.first() {
            Some((host, _)) => format!("http://localhost:{host}"),
            None => String::new(),
        }
    }
}

/// Abstraction over a container/process runtime. Called only from `deploy`
/// and `stop` — never from the tick loop.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Start a worker. Idempotent: if `spec.name` already exists, the
    /// existing worker is destroyed first.
    async fn launch(&self, spec: WorkerSpec) -> Result<WorkerHandle, RangeError>;
    async fn destroy(&self, handle: &WorkerHandle) -> Result<(), RangeError>;
    async fn exists(&self, name: &str) -> Result<bool, RangeError>;
}

/// Shells out to the `docker` CLI, matching the original's
/// `docker.from_env()` container lifecycle: look up by name, stop+remove
/// if present, then run.
#[derive(Clone, Default)]
pub struct DockerLauncher {
    network: Option<String>,
}

impl DockerLauncher {
    pub fn new(network: Option<String>) -> Self {
        Self { network }
    }
}

async fn run_docker(args: &[&str]) -> Result<String, String> {
    let output = tokio::process::Command::new("docker")
        .args(args)
        .output()
        .await
        .map_err(|e| format!("failed to exec docker: {e}"))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!("docker {} failed: {}", args.first().unwrap_or(&""), stderr.trim()))
    }
}

#[async_trait]
impl Launcher for DockerLauncher {
    async fn launch(&self, spec: WorkerSpec) -> Result<WorkerHandle, RangeError> {
        if self.exists(&spec.name).await? {
            tracing::info!(name = %spec.name, "found existing worker container, stopping and removing");
            run_docker(&["stop", &spec.name]).await.ok();
            run_docker(&["rm", &spec.name])
                .await
                .map_err(RangeError::LaunchConflict)?;
        }

        let mut args: Vec<String> = vec![
            "run".into(),
            "-d".into(),
            "--name".into(),
            spec.name.clone(),
        ];
        if let Some(network) = spec.network.as_ref().or(self.network.as_ref()) {
            args.push("--network".into());
            args.push(network.clone());
        }
        for (host, container) in &spec.ports {
            args.push("-p".into());
            args.push(format!("{host}:{container}"));
        }
        for (host, container) in &spec.volumes {
            args.push("-v".into());
            args.push(format!("{host}:{container}:ro"));
        }
        for (k, v) in &spec.env {
            args.push("-e".into());
            args.push(format!("{k}={v}"));
        }
        args.push(spec.image.clone());

        let url = spec.url();
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        tracing::info!(name = %spec.name, image = %spec.image, "launching worker container");
        run_docker(&arg_refs).await.map_err(RangeError::DeployFailed)?;

        Ok(WorkerHandle {
            id: WorkerId::new(),
            name: spec.name,
            kind: spec.kind,
            team_id: spec.team_id,
            url,
        })
    }

    async fn destroy(&self, handle: &WorkerHandle) -> Result<(), RangeError> {
        tracing::info!(name = %handle.name, "destroying worker container");
        run_docker(&["stop", &handle.name]).await.ok();
        run_docker(&["rm", "-f", &handle.name])
            .await
            .map_err(RangeError::DeployFailed)?;
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool, RangeError> {
        Ok(run_docker(&["inspect", name]).await.is_ok())
    }
}

/// Kubernetes `Launcher`: one `Pod` per worker, built on the `kube`/
/// `k8s-openapi` crates.
pub struct K8sLauncher {
    client: kube::Client,
    namespace: String,
}

impl K8sLauncher {
    pub async fn new(namespace: impl Into<String>) -> Result<Self, RangeError> {
        let client = kube::Client::try_default()
            .await
            .map_err(|e| RangeError::DeployFailed(e.to_string()))?;
        Ok(Self { client, namespace: namespace.into() })
    }

    fn build_pod(spec: &WorkerSpec) -> k8s_openapi::api::core::v1::Pod {
        use k8s_openapi::api::core::v1::{Container, ContainerPort, EnvVar, Pod, PodSpec};
        use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

        let env = spec
            .env
            .iter()
            .map(|(k, v)| EnvVar { name: k.clone(), value: Some(v.clone()), ..Default::default() })
            .collect::<Vec<_>>();
        let ports = spec
            .ports
            .iter()
            .map(|(_, container)| ContainerPort {
                container_port: *container as i32,
                ..Default::default()
            })
            .collect::<Vec<_>>();

        Pod {
            metadata: ObjectMeta { name: Some(spec.name.clone()), ..Default::default() },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: spec.name.clone(),
                    image: Some(spec.image.clone()),
                    env: Some(env),
                    ports: Some(ports),
                    ..Default::default()
                }],
                restart_policy: Some("Never".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Launcher for K8sLauncher {
    async fn launch(&self, spec: WorkerSpec) -> Result<WorkerHandle, RangeError> {
        use k8s_openapi::api::core::v1::Pod;
        use kube::api::{Api, DeleteParams, PostParams};

        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &self.namespace);

        if self.exists(&spec.name).await? {
            tracing::info!(name = %spec.name, "found existing worker pod, deleting");
            pods.delete(&spec.name, &DeleteParams::default())
                .await
                .map_err(|e| RangeError::LaunchConflict(e.to_string()))?;
        }

        let pod = Self::build_pod(&spec);
        tracing::info!(name = %spec.name, image = %spec.image, "launching worker pod");
        pods.create(&PostParams::default(), &pod)
            .await
            .map_err(|e| RangeError::DeployFailed(e.to_string()))?;

        let url = spec.url();
        Ok(WorkerHandle {
            id: WorkerId::new(),
            name: spec.name,
            kind: spec.kind,
            team_id: spec.team_id,
            url,
        })
    }

    async fn destroy(&self, handle: &WorkerHandle) -> Result<(), RangeError> {
        use k8s_openapi::api::core::v1::Pod;
        use kube::api::{Api, DeleteParams};

        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &self.namespace);
        tracing::info!(name = %handle.name, "destroying worker pod");
        pods.delete(&handle.name, &DeleteParams::default())
            .await
            .map_err(|e| RangeError::DeployFailed(e.to_string()))?;
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool, RangeError> {
        use k8s_openapi::api::core::v1::Pod;
        use kube::api::Api;

        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &self.namespace);
        Ok(pods.get(name).await.is_ok())
    }
}

/// In-memory `Launcher` for engine tests: no real containers, just a name →
/// handle map plus optional failure injection, mirroring
/// `FakeAgentAdapter`.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeLauncher {
    workers: parking_lot::Mutex<std::collections::HashMap<String, WorkerHandle>>,
    /// Worker names that should fail on `launch`, used to exercise the
    /// rollback path when a forced `Launcher` failure happens at worker
    /// k of N.
    fail_names: parking_lot::Mutex<std::collections::HashSet<String>>,
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeLauncher {
    fn default() -> Self {
        Self {
            workers: parking_lot::Mutex::new(std::collections::HashMap::new()),
            fail_names: parking_lot::Mutex::new(std::collections::HashSet::new()),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `launch` call for this worker name fail.
    pub fn fail_on(&self, name: impl Into<String>) {
        self.fail_names.lock().insert(name.into());
    }

    pub fn live_count(&self) -> usize {
        self.workers.lock().len()
    }

    pub fn is_live(&self, name: &str) -> bool {
        self.workers.lock().contains_key(name)
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl Launcher for FakeLauncher {
    async fn launch(&self, spec: WorkerSpec) -> Result<WorkerHandle, RangeError> {
        if self.fail_names.lock().remove(&spec.name) {
            return Err(RangeError::DeployFailed(format!("injected failure for {}", spec.name)));
        }
        if self.workers.lock().remove(&spec.name).is_some() {
            tracing::info!(name = %spec.name, "fake: destroyed existing worker before relaunch");
        }
        let handle = WorkerHandle {
            id: WorkerId::new(),
            name: spec.name.clone(),
            kind: spec.kind,
            team_id: spec.team_id,
            url: spec.url(),
        };
        self.workers.lock().insert(spec.name, handle.clone());
        Ok(handle)
    }

    async fn destroy(&self, handle: &WorkerHandle) -> Result<(), RangeError> {
        self.workers.lock().remove(&handle.name);
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool, RangeError> {
        Ok(self.workers.lock().contains_key(name))
    }
}

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;
