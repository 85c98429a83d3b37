// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.
//!
//! Unset or unparseable values fall back to their defaults.

use std::path::PathBuf;
use std::time::Duration;

/// etcd client address (`host:port`)
pub fn etcd_addr() -> String {
    std::env::var("ETCDOCKER_ETCD_ADDR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "127.0.0.1:2379".to_string())
}

/// Docker Engine socket path
pub fn docker_socket() -> PathBuf {
    std::env::var("ETCDOCKER_DOCKER_SOCKET")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(ed_adapters::runtime::DEFAULT_SOCKET))
}

/// Docker Engine API version prefix
pub fn docker_api_version() -> String {
    std::env::var("ETCDOCKER_DOCKER_API_VERSION")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| ed_adapters::runtime::DEFAULT_API_VERSION.to_string())
}

/// Grace period before a stopping container is killed (default 5s)
pub fn stop_grace() -> Duration {
    std::env::var("ETCDOCKER_STOP_GRACE_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(5))
}

/// Consecutive failures a watcher tolerates (default 10)
pub fn retry_attempts() -> u32 {
    std::env::var("ETCDOCKER_RETRY_ATTEMPTS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(10)
}

/// First retry delay (default 500ms)
pub fn retry_base() -> Duration {
    ms_var("ETCDOCKER_RETRY_BASE_MS").unwrap_or(Duration::from_millis(500))
}

/// Retry delay cap (default 30s)
pub fn retry_max() -> Duration {
    ms_var("ETCDOCKER_RETRY_MAX_MS").unwrap_or(Duration::from_secs(30))
}

/// Time watchers get to stop after a shutdown signal (default 10s)
pub fn shutdown_grace() -> Duration {
    ms_var("ETCDOCKER_SHUTDOWN_GRACE_MS").unwrap_or(Duration::from_secs(10))
}

/// Timeout for store reads and runtime calls; watches are exempt (default 5s)
pub fn http_timeout() -> Duration {
    ms_var("ETCDOCKER_HTTP_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

fn ms_var(name: &str) -> Option<Duration> {
    std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
