// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: configuration, startup, and signal-driven shutdown.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use ed_adapters::{DockerEngine, EtcdStore, RuntimeAdapter, StoreAdapter};
use ed_engine::{Agent, AgentConfig, AgentError, AgentOutcome, AgentReport, RetryPolicy, WatcherExit};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::env;

/// Errors that end the daemon with a non-zero status
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("invalid root path {0:?}")]
    InvalidRoot(String),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Daemon configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// etcd client address (`host:port`)
    pub etcd_addr: String,
    pub docker_socket: PathBuf,
    pub docker_api_version: String,
    /// Bound on every non-watch request
    pub http_timeout: Duration,
    pub stop_grace: Duration,
    pub shutdown_grace: Duration,
    pub retry: RetryPolicy,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Self {
        Self {
            etcd_addr: env::etcd_addr(),
            docker_socket: env::docker_socket(),
            docker_api_version: env::docker_api_version(),
            http_timeout: env::http_timeout(),
            stop_grace: env::stop_grace(),
            shutdown_grace: env::shutdown_grace(),
            retry: RetryPolicy::default()
                .max_attempts(env::retry_attempts())
                .base_delay(env::retry_base())
                .max_delay(env::retry_max()),
        }
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig::default()
            .retry(self.retry)
            .stop_grace(self.stop_grace)
            .shutdown_grace(self.shutdown_grace)
    }

    pub fn store(&self) -> EtcdStore {
        EtcdStore::new(self.etcd_addr.clone()).with_timeout(self.http_timeout)
    }

    pub fn runtime(&self) -> DockerEngine {
        DockerEngine::new(self.docker_socket.clone())
            .with_api_version(self.docker_api_version.clone())
            .with_timeout(self.http_timeout)
    }
}

/// Normalize a store directory to `/a/b` form.
pub fn normalize_root(root: &str) -> Result<String, LifecycleError> {
    let trimmed = root.trim();
    if trimmed.is_empty() || trimmed.contains("//") || trimmed.split('/').any(|s| s == "..") {
        return Err(LifecycleError::InvalidRoot(root.to_string()));
    }
    Ok(format!("/{}", trimmed.trim_matches('/')))
}

/// Run the daemon against etcd and Docker until the agent finishes.
pub async fn run(config: &Config, root: &str) -> Result<AgentOutcome, LifecycleError> {
    let root = normalize_root(root)?;
    info!(
        root = %root,
        etcd = %config.etcd_addr,
        docker = %config.docker_socket.display(),
        api = %config.docker_api_version,
        "starting"
    );
    let agent = Agent::new(config.store(), config.runtime(), config.agent_config());
    let report = supervise(agent, &root, shutdown_signal()).await?;
    Ok(report.outcome)
}

/// Run `agent` until it finishes, cancelling it when `shutdown` resolves.
pub async fn supervise<S, R, F>(agent: Agent<S, R>, root: &str, shutdown: F) -> Result<AgentReport, LifecycleError>
where
    S: StoreAdapter,
    R: RuntimeAdapter,
    F: Future<Output = ()> + Send + 'static,
{
    let cancel = agent.cancel_token();
    let signal_task = tokio::spawn(async move {
        shutdown.await;
        info!("shutdown requested");
        cancel.cancel();
    });

    let result = agent.run(root).await;
    signal_task.abort();
    let report = result?;

    let failed = report.exits.values().filter(|e| matches!(e, WatcherExit::Failed { .. })).count();
    match report.outcome {
        AgentOutcome::Shutdown => info!(watchers = report.exits.len(), "shutdown complete"),
        AgentOutcome::AllWatchersStopped if failed > 0 => {
            error!(failed, watchers = report.exits.len(), "exiting: every watcher has stopped")
        }
        AgentOutcome::AllWatchersStopped => warn!("exiting: no watchers running"),
    }
    Ok(report)
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    Ok(()) = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "cannot install SIGTERM handler, using ctrl-c only");
                ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
