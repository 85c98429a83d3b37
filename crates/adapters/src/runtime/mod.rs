// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container runtime adapters

mod docker;

pub use docker::{DockerEngine, DEFAULT_API_VERSION, DEFAULT_SOCKET};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeContainer, FakeRuntime, RuntimeCall};

use async_trait::async_trait;
use ed_core::{CreateOptions, RuntimeState, StartOptions};
use std::time::Duration;
use thiserror::Error;

/// Errors from runtime operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("runtime unavailable: {0}")]
    Unavailable(String),
    #[error("image not found: {0}")]
    ImageNotFound(String),
    #[error("container name already in use: {0}")]
    NameConflict(String),
    #[error("container already running: {0}")]
    AlreadyRunning(String),
    #[error("no such container: {0}")]
    NotFound(String),
    #[error("runtime API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("runtime protocol error: {0}")]
    Protocol(String),
}

/// Adapter for the runtime that runs containers
///
/// Every primitive addresses a container by name.
#[async_trait]
pub trait RuntimeAdapter: Clone + Send + Sync + 'static {
    /// Create (but do not start) a container.
    ///
    /// `host` is the host configuration the container will be started with;
    /// runtimes that fix it at creation take it from here.
    async fn create(&self, name: &str, options: &CreateOptions, host: &StartOptions) -> Result<(), RuntimeError>;

    /// Start a created or stopped container with the given host configuration.
    async fn start(&self, name: &str, options: &StartOptions) -> Result<(), RuntimeError>;

    /// Stop a container, killing it after `grace`.
    async fn stop(&self, name: &str, grace: Duration) -> Result<(), RuntimeError>;

    /// Remove a stopped container.
    async fn remove(&self, name: &str) -> Result<(), RuntimeError>;

    /// Current state; a missing container is [`RuntimeState::Absent`], not an error.
    async fn inspect(&self, name: &str) -> Result<RuntimeState, RuntimeError>;
}
