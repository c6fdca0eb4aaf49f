// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binary entrypoint: load config, construct the StatusStore/Launcher
//! backends it names, and stand up the engine table. The request layer
//! that would route to it is the out-of-scope HTTP control surface, so
//! this binary's job ends at publishing a ready `ExerciseEngineTable` and
//! waiting for shutdown.

use std::sync::Arc;

use range_adapters::{
    DockerLauncher, InMemoryStatusStore, InProcessBus, K8sLauncher, Launcher, RedisStatusStore,
    StatusStore,
};
use range_core::config::{LauncherBackend, StoreBackend};
use range_core::Config;
use range_daemon::ExerciseEngineTable;

const DEFAULT_BUS_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load()?;

    let store: Arc<dyn StatusStore> = match config.store_backend {
        StoreBackend::Redis => {
            Arc::new(RedisStatusStore::connect(&config.redis_url, config.store_ttl).await?)
        }
        StoreBackend::InMemory => Arc::new(InMemoryStatusStore::new(config.store_ttl)),
    };

    let launcher: Arc<dyn Launcher> = match config.launcher_backend {
        LauncherBackend::Docker => Arc::new(DockerLauncher::new(None)),
        LauncherBackend::K8s => Arc::new(K8sLauncher::new("default").await?),
    };

    let bus = Arc::new(InProcessBus::new(DEFAULT_BUS_CAPACITY));

    let _table = ExerciseEngineTable::new(config, bus, store, launcher);

    tracing::info!("exercise orchestrator ready");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    Ok(())
}
