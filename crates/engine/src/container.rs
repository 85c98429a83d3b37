// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idempotent lifecycle operations for one named container.

use ed_adapters::{RuntimeAdapter, RuntimeError};
use ed_core::{ContainerParams, RuntimeState};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub(crate) const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// Errors from container lifecycle operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    #[error("container {0} has neither image nor tag")]
    MissingImage(String),
    #[error(transparent)]
    RuntimeUnavailable(RuntimeError),
    #[error("{op} {name} failed: {source}")]
    Runtime {
        name: String,
        op: &'static str,
        #[source]
        source: RuntimeError,
    },
}

/// How a watcher should react to a [`ContainerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The definition cannot be applied as written; skip until it changes.
    Config,
    /// A collaborator failed; retry with backoff.
    Retryable,
}

impl ContainerError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ContainerError::MissingImage(_)
            | ContainerError::Runtime { source: RuntimeError::ImageNotFound(_), .. } => {
                ErrorClass::Config
            }
            _ => ErrorClass::Retryable,
        }
    }
}

/// What `ensure_running` had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converged {
    Created,
    Started,
    AlreadyRunning,
}

ed_core::simple_display! {
    Converged {
        Created => "created and started",
        Started => "started",
        AlreadyRunning => "already running",
    }
}

/// What `apply_change` had to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Torn down and recreated because these fields changed.
    Rebuilt { changed: Vec<String> },
    /// No field changed; the container was only brought back to running.
    Unchanged(Converged),
}

/// One named container and the parameters last applied to it.
pub struct ContainerHandle<R> {
    name: String,
    runtime: R,
    stop_grace: Duration,
    applied: Option<ContainerParams>,
}

impl<R: RuntimeAdapter> ContainerHandle<R> {
    pub fn new(name: impl Into<String>, runtime: R) -> Self {
        Self { name: name.into(), runtime, stop_grace: DEFAULT_STOP_GRACE, applied: None }
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters of the last successful converge, if any.
    pub fn applied(&self) -> Option<&ContainerParams> {
        self.applied.as_ref()
    }

    /// Bring the container to running with `params`, creating it if absent.
    ///
    /// A running container is left alone whatever it was created with.
    pub async fn ensure_running(&mut self, params: &ContainerParams) -> Result<Converged, ContainerError> {
        let image = self.require_image(params)?;
        let state = self.runtime.inspect(&self.name).await.map_err(|e| self.fail("inspect", e))?;
        debug!(container = %self.name, %state, "inspected");

        let outcome = match state {
            RuntimeState::Absent => {
                self.create(params, image).await?;
                self.start(params).await?;
                Converged::Created
            }
            RuntimeState::Created | RuntimeState::Stopped => {
                self.start(params).await?;
                Converged::Started
            }
            RuntimeState::Running => Converged::AlreadyRunning,
        };
        self.applied = Some(params.clone());
        Ok(outcome)
    }

    /// Converge to `params`, rebuilding the container if anything changed
    /// since the last apply.
    pub async fn apply_change(&mut self, params: &ContainerParams) -> Result<Applied, ContainerError> {
        let image = self.require_image(params)?;
        let changed = match &self.applied {
            Some(previous) => previous.diff(params),
            None => ContainerParams::default().diff(params),
        };
        if changed.is_empty() {
            return self.ensure_running(params).await.map(Applied::Unchanged);
        }

        info!(container = %self.name, ?changed, "definition changed, rebuilding");
        // None until the rebuild completes
        self.applied = None;
        self.teardown().await?;
        self.create(params, image).await?;
        self.start(params).await?;
        self.applied = Some(params.clone());
        Ok(Applied::Rebuilt { changed })
    }

    /// Stop then remove the container. A container that is already gone is
    /// not an error.
    pub async fn teardown(&mut self) -> Result<(), ContainerError> {
        match self.runtime.stop(&self.name, self.stop_grace).await {
            Ok(()) | Err(RuntimeError::NotFound(_)) => {}
            Err(e) => return Err(self.fail("stop", e)),
        }
        match self.runtime.remove(&self.name).await {
            Ok(()) | Err(RuntimeError::NotFound(_)) => {}
            Err(e) => return Err(self.fail("remove", e)),
        }
        self.applied = None;
        Ok(())
    }

    fn require_image(&self, params: &ContainerParams) -> Result<String, ContainerError> {
        params.image_ref().ok_or_else(|| ContainerError::MissingImage(self.name.clone()))
    }

    async fn create(&self, params: &ContainerParams, image: String) -> Result<(), ContainerError> {
        let options = params.create_options(image);
        self.runtime
            .create(&self.name, &options, &params.start_options())
            .await
            .map_err(|e| self.fail("create", e))?;
        debug!(container = %self.name, image = %options.image, "created");
        Ok(())
    }

    async fn start(&self, params: &ContainerParams) -> Result<(), ContainerError> {
        match self.runtime.start(&self.name, &params.start_options()).await {
            Ok(()) | Err(RuntimeError::AlreadyRunning(_)) => Ok(()),
            Err(e) => Err(self.fail("start", e)),
        }
    }

    fn fail(&self, op: &'static str, source: RuntimeError) -> ContainerError {
        match source {
            RuntimeError::Unavailable(_) => ContainerError::RuntimeUnavailable(source),
            source => ContainerError::Runtime { name: self.name.clone(), op, source },
        }
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
