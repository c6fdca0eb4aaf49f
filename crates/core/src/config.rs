// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-level configuration, loaded from `RANGE_`-prefixed environment
//! variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::RangeError;

/// Which backend a given capability should use. `Fake` only exists to make
/// the variant set explicit in config dumps/logs; tests construct fakes
/// directly rather than through `Config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    InMemory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherBackend {
    Docker,
    K8s,
}

/// Process-wide configuration for the exercise execution engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory containing `<scenario_id>.json` scenario files and
    /// their referenced timeline files.
    pub scenarios_root: PathBuf,
    /// StatusStore backend selection.
    pub store_backend: StoreBackend,
    /// Redis connection URL, used when `store_backend == Redis`.
    pub redis_url: String,
    /// TTL applied to every StatusStore key (spec default: 24 hours).
    pub store_ttl: Duration,
    /// Launcher backend selection.
    pub launcher_backend: LauncherBackend,
    /// Bind address for the RTL-TCP broadcaster.
    pub rtl_bind: SocketAddr,
    /// Scheduler tick cadence (spec default: 100 ms).
    pub tick_interval: Duration,
}

impl Config {
    /// Load configuration from the environment, falling back to the
    /// reference deployment's defaults for anything unset.
    pub fn load() -> Result<Self, RangeError> {
        let scenarios_root = std::env::var("RANGE_SCENARIOS_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./scenarios"));

        let store_backend = match std::env::var("RANGE_STATUS_BACKEND").as_deref() {
            Ok("redis") => StoreBackend::Redis,
            Ok("memory") | Err(_) => StoreBackend::InMemory,
            Ok(other) => {
                return Err(RangeError::Malformed(format!(
                    "unknown RANGE_STATUS_BACKEND: {other}"
                )))
            }
        };

        let redis_url = std::env::var("RANGE_REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let launcher_backend = match std::env::var("RANGE_LAUNCHER_BACKEND").as_deref() {
            Ok("k8s") => LauncherBackend::K8s,
            Ok("docker") | Err(_) => LauncherBackend::Docker,
            Ok(other) => {
                return Err(RangeError::Malformed(format!(
                    "unknown RANGE_LAUNCHER_BACKEND: {other}"
                )))
            }
        };

        let rtl_bind: SocketAddr = std::env::var("RANGE_RTL_BIND")
            .unwrap_or_else(|_| "0.0.0.0:1234".to_string())
            .parse()
            .map_err(|e| RangeError::Malformed(format!("invalid RANGE_RTL_BIND: {e}")))?;

        Ok(Self {
            scenarios_root,
            store_backend,
            redis_url,
            store_ttl: Duration::from_secs(24 * 60 * 60),
            launcher_backend,
            rtl_bind,
            tick_interval: Duration::from_millis(100),
        })
    }
}
