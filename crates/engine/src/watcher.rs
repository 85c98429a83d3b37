// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-container watch loop
//!
//! ```text
//! Initializing ──► Watching ──change or retry──► Reconciling
//!                     ▲                               │
//!                     └───────────────────────────────┘
//!        (cancelled, or retries exhausted) ──► Stopped
//! ```
//!
//! A failed initial convergence does not hold the watcher in
//! `Initializing`: it starts watching and retries on the backoff timer.

use crate::container::{Applied, ContainerError, ContainerHandle, ErrorClass};
use crate::retry::{Backoff, RetryPolicy};
use ed_adapters::{RuntimeAdapter, StoreAdapter, StoreError};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn, Instrument};

/// Lifecycle position of a [`Watcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Initializing,
    Watching,
    Reconciling,
    Stopped,
}

ed_core::simple_display! {
    WatcherState {
        Initializing => "initializing",
        Watching => "watching",
        Reconciling => "reconciling",
        Stopped => "stopped",
    }
}

/// Failure that ended a watcher once retries ran out
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatcherError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// How a watcher ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherExit {
    /// The shared cancellation token fired.
    Cancelled,
    /// Consecutive retryable failures reached the retry ceiling.
    Failed { attempts: u32, error: WatcherError },
    /// The task was aborted or panicked before reporting.
    Aborted,
}

ed_core::simple_display! {
    WatcherExit {
        Cancelled => "cancelled",
        Failed { .. } => "failed",
        Aborted => "aborted",
    }
}

/// Keeps one container converged with its definition directory.
pub struct Watcher<S, R> {
    path: String,
    store: S,
    handle: ContainerHandle<R>,
    retry: RetryPolicy,
    cancel: CancellationToken,
    state: WatcherState,
    /// First store index not yet reflected in the container
    since: Option<u64>,
}

impl<S: StoreAdapter, R: RuntimeAdapter> Watcher<S, R> {
    pub fn new(
        path: impl Into<String>,
        store: S,
        handle: ContainerHandle<R>,
        retry: RetryPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            path: path.into(),
            store,
            handle,
            retry,
            cancel,
            state: WatcherState::Initializing,
            since: None,
        }
    }

    /// Run until cancelled or until retries are exhausted.
    pub async fn run(mut self) -> WatcherExit {
        let span = tracing::info_span!("watcher", container = %self.handle.name());
        async move {
            let exit = self.drive().await;
            self.transition(WatcherState::Stopped);
            debug!(%exit, "watcher stopped");
            exit
        }
        .instrument(span)
        .await
    }

    async fn drive(&mut self) -> WatcherExit {
        let mut backoff = self.retry.backoff();

        self.transition(WatcherState::Initializing);
        if self.cancel.is_cancelled() {
            return WatcherExit::Cancelled;
        }
        // Delay before an owed reconcile is retried without a new event
        let mut retry = None;
        let mut converged = false;
        match self.reconcile(true).await {
            Ok(()) => converged = true,
            Err(e) => {
                // Not counted against the ceiling; the watch starts regardless
                warn!(error = %e, "initial convergence failed, watching anyway");
                retry = Some(self.retry.delay_for(1));
            }
        }

        loop {
            self.transition(WatcherState::Watching);
            let woke = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return WatcherExit::Cancelled,
                _ = retry_timer(retry) => None,
                event = self.store.watch(&self.path, self.since) => Some(event),
            };
            match woke {
                None => debug!("retrying reconcile"),
                Some(Ok(change)) => {
                    debug!(key = %change.key, action = %change.action, index = change.index, "change");
                    self.since = Some(change.index + 1);
                }
                Some(Err(StoreError::EventIndexCleared(reason))) => {
                    warn!(%reason, "watch history cleared, resynchronizing");
                    self.since = None;
                }
                Some(Err(e)) => {
                    if let Some(exit) = self.back_off(&mut backoff, e.into()).await {
                        return exit;
                    }
                    continue;
                }
            }

            self.transition(WatcherState::Reconciling);
            match self.reconcile(!converged).await {
                Ok(()) => {
                    converged = true;
                    retry = None;
                    backoff.reset();
                }
                Err(e) => match Self::next_delay(&mut backoff, e) {
                    Ok(delay) => retry = Some(delay),
                    Err(exit) => return exit,
                },
            }
        }
    }

    fn transition(&mut self, next: WatcherState) {
        if self.state != next {
            trace!(from = %self.state, to = %next, "state");
            self.state = next;
        }
    }

    /// Read the definition and converge the container to it.
    ///
    /// Config-class failures are logged and swallowed; only retryable
    /// failures are returned.
    async fn reconcile(&mut self, initial: bool) -> Result<(), WatcherError> {
        let subtree = match self.store.read_subtree(&self.path).await {
            Ok(subtree) => subtree,
            Err(StoreError::NotFound(_)) => {
                warn!(path = %self.path, "definition removed, leaving container in place");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let next = subtree.index + 1;
        self.since = Some(self.since.map_or(next, |since| since.max(next)));

        let params = ed_core::convert(&subtree.entries);
        let result = if initial {
            self.handle.ensure_running(&params).await.map(|outcome| {
                info!(%outcome, "container converged");
            })
        } else {
            self.handle.apply_change(&params).await.map(|applied| match applied {
                Applied::Rebuilt { changed } => info!(?changed, "container rebuilt"),
                Applied::Unchanged(outcome) => debug!(%outcome, "definition unchanged"),
            })
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.class() == ErrorClass::Config => {
                warn!(error = %e, "cannot apply definition, waiting for a change");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Count a failure and pick the delay before the next attempt, or
    /// produce the exit once retries are exhausted.
    fn next_delay(backoff: &mut Backoff, error: WatcherError) -> Result<Duration, WatcherExit> {
        let Some(delay) = backoff.fail() else {
            error!(attempts = backoff.attempts(), error = %error, "giving up after repeated failures");
            return Err(WatcherExit::Failed { attempts: backoff.attempts(), error });
        };
        warn!(
            attempt = backoff.attempts(),
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "retrying"
        );
        Ok(delay)
    }

    /// Sleep out the next delay unless cancelled first.
    async fn back_off(&self, backoff: &mut Backoff, error: WatcherError) -> Option<WatcherExit> {
        let delay = match Self::next_delay(backoff, error) {
            Ok(delay) => delay,
            Err(exit) => return Some(exit),
        };
        tokio::select! {
            _ = self.cancel.cancelled() => Some(WatcherExit::Cancelled),
            _ = tokio::time::sleep(delay) => None,
        }
    }
}

async fn retry_timer(delay: Option<Duration>) {
    match delay {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
