// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovery and supervision of per-container watchers.

use crate::container::{ContainerHandle, DEFAULT_STOP_GRACE};
use crate::retry::RetryPolicy;
use crate::watcher::{Watcher, WatcherExit};
use ed_adapters::store::join_key;
use ed_adapters::{RuntimeAdapter, StoreAdapter, StoreError};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Errors that prevent the agent from starting any watcher
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("failed to discover containers under {root}: {source}")]
    Discovery {
        root: String,
        #[source]
        source: StoreError,
    },
}

/// Tuning shared by every watcher the agent runs.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub retry: RetryPolicy,
    /// Grace period passed to the runtime when stopping a container
    pub stop_grace: Duration,
    /// How long watchers get to finish after shutdown is requested
    pub shutdown_grace: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            stop_grace: DEFAULT_STOP_GRACE,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl AgentConfig {
    ed_core::setters! {
        set {
            retry: RetryPolicy,
            stop_grace: Duration,
            shutdown_grace: Duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentOutcome {
    /// Every watcher stopped on its own.
    AllWatchersStopped,
    /// Shutdown was requested through the cancellation token.
    Shutdown,
}

/// Result of [`Agent::run`]: how it ended and how each watcher ended.
#[derive(Debug)]
pub struct AgentReport {
    pub outcome: AgentOutcome,
    pub exits: BTreeMap<String, WatcherExit>,
}

/// Runs one watcher per container defined under a root directory.
pub struct Agent<S, R> {
    store: S,
    runtime: R,
    config: AgentConfig,
    cancel: CancellationToken,
}

impl<S: StoreAdapter, R: RuntimeAdapter> Agent<S, R> {
    pub fn new(store: S, runtime: R, config: AgentConfig) -> Self {
        Self { store, runtime, config, cancel: CancellationToken::new() }
    }

    /// Token that shuts the agent down when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Container names directly under `root`.
    pub async fn discover(&self, root: &str) -> Result<Vec<String>, AgentError> {
        self.store
            .list_children(root)
            .await
            .map_err(|source| AgentError::Discovery { root: root.to_string(), source })
    }

    /// Discover containers once, then watch them until every watcher stops
    /// or shutdown is requested.
    pub async fn run(&self, root: &str) -> Result<AgentReport, AgentError> {
        let names = self.discover(root).await?;
        if names.is_empty() {
            warn!(root, "no containers defined");
            return Ok(AgentReport { outcome: AgentOutcome::AllWatchersStopped, exits: BTreeMap::new() });
        }
        info!(root, containers = ?names, "discovered containers");

        let mut tasks = JoinSet::new();
        let mut exits = Exits::default();
        for name in names {
            let handle = ContainerHandle::new(name.clone(), self.runtime.clone())
                .with_stop_grace(self.config.stop_grace);
            let watcher = Watcher::new(
                join_key(root, &name),
                self.store.clone(),
                handle,
                self.config.retry,
                self.cancel.clone(),
            );
            exits.pending.insert(name.clone());
            tasks.spawn(async move { (name, watcher.run().await) });
        }

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                joined = tasks.join_next() => match joined {
                    Some(joined) => exits.record(joined),
                    None => {
                        warn!("all watchers quit");
                        return Ok(exits.into_report(AgentOutcome::AllWatchersStopped));
                    }
                },
            }
        }

        info!(grace_ms = self.config.shutdown_grace.as_millis() as u64, "shutting down watchers");
        let drained = tokio::time::timeout(self.config.shutdown_grace, async {
            while let Some(joined) = tasks.join_next().await {
                exits.record(joined);
            }
        })
        .await;
        if drained.is_err() {
            warn!(remaining = tasks.len(), "shutdown grace elapsed, aborting watchers");
            tasks.abort_all();
            while let Some(joined) = tasks.join_next().await {
                exits.record(joined);
            }
        }
        Ok(exits.into_report(AgentOutcome::Shutdown))
    }
}

/// Watcher exits collected so far, plus the names still unaccounted for.
#[derive(Default)]
struct Exits {
    done: BTreeMap<String, WatcherExit>,
    pending: BTreeSet<String>,
}

impl Exits {
    fn record(&mut self, joined: Result<(String, WatcherExit), JoinError>) {
        match joined {
            Ok((name, exit)) => {
                match &exit {
                    WatcherExit::Failed { attempts, error } => {
                        error!(container = %name, attempts, error = %error, "watcher failed");
                    }
                    other => info!(container = %name, exit = %other, "watcher stopped"),
                }
                self.pending.remove(&name);
                self.done.insert(name, exit);
            }
            Err(e) if e.is_panic() => error!(error = %e, "watcher task panicked"),
            Err(_) => {}
        }
    }

    fn into_report(mut self, outcome: AgentOutcome) -> AgentReport {
        for name in std::mem::take(&mut self.pending) {
            self.done.insert(name, WatcherExit::Aborted);
        }
        AgentReport { outcome, exits: self.done }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
