// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{RuntimeAdapter, RuntimeError};
use async_trait::async_trait;
use ed_core::{CreateOptions, RuntimeState, StartOptions};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Recorded runtime call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    Create { name: String, options: CreateOptions, host: StartOptions },
    Start { name: String, options: StartOptions },
    Stop { name: String, grace: Duration },
    Remove { name: String },
    Inspect { name: String },
}

impl RuntimeCall {
    pub fn name(&self) -> &str {
        match self {
            RuntimeCall::Create { name, .. }
            | RuntimeCall::Start { name, .. }
            | RuntimeCall::Stop { name, .. }
            | RuntimeCall::Remove { name }
            | RuntimeCall::Inspect { name } => name,
        }
    }

    /// Short operation label (`create`, `start`, ...).
    pub fn op(&self) -> &'static str {
        match self {
            RuntimeCall::Create { .. } => "create",
            RuntimeCall::Start { .. } => "start",
            RuntimeCall::Stop { .. } => "stop",
            RuntimeCall::Remove { .. } => "remove",
            RuntimeCall::Inspect { .. } => "inspect",
        }
    }
}

/// A container held by the fake runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeContainer {
    pub state: RuntimeState,
    pub create: CreateOptions,
    /// Options of the most recent successful start
    pub start: Option<StartOptions>,
}

#[derive(Default)]
struct FakeRuntimeState {
    containers: HashMap<String, FakeContainer>,
    calls: Vec<RuntimeCall>,
    /// When set, only these images exist
    images: Option<HashSet<String>>,
    unavailable: HashSet<String>,
    all_unavailable: bool,
    /// Calls for these names never complete
    hung: HashSet<String>,
}

/// Fake runtime for testing
///
/// Every call is recorded before it is evaluated, so failed calls show up too.
#[derive(Clone, Default)]
pub struct FakeRuntime {
    inner: Arc<Mutex<FakeRuntimeState>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the known images; creating anything else fails with `ImageNotFound`.
    pub fn with_images<I, S>(self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.lock().images = Some(images.into_iter().map(Into::into).collect());
        self
    }

    /// Make calls for `name` fail with `Unavailable`.
    pub fn set_unavailable(&self, name: &str, unavailable: bool) {
        let mut state = self.inner.lock();
        if unavailable {
            state.unavailable.insert(name.to_string());
        } else {
            state.unavailable.remove(name);
        }
    }

    /// Make every call fail with `Unavailable`.
    pub fn set_all_unavailable(&self, unavailable: bool) {
        self.inner.lock().all_unavailable = unavailable;
    }

    /// Make every later call for `name` block forever.
    pub fn hang(&self, name: &str) {
        self.inner.lock().hung.insert(name.to_string());
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.inner.lock().calls.clone()
    }

    /// Recorded calls for `name`, excluding inspects.
    pub fn mutations_for(&self, name: &str) -> Vec<RuntimeCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| c.name() == name && !matches!(c, RuntimeCall::Inspect { .. }))
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    pub fn state_of(&self, name: &str) -> RuntimeState {
        self.inner.lock().containers.get(name).map_or(RuntimeState::Absent, |c| c.state)
    }

    pub fn container(&self, name: &str) -> Option<FakeContainer> {
        self.inner.lock().containers.get(name).cloned()
    }

    /// Place a container directly, bypassing call recording.
    pub fn insert_container(&self, name: &str, container: FakeContainer) {
        self.inner.lock().containers.insert(name.to_string(), container);
    }

    /// Simulate a container exiting on its own.
    pub fn kill(&self, name: &str) {
        if let Some(container) = self.inner.lock().containers.get_mut(name) {
            container.state = RuntimeState::Stopped;
        }
    }

    /// Record `call` and never return if its container is hung.
    async fn stall(&self, call: &RuntimeCall) {
        let hung = {
            let mut state = self.inner.lock();
            let hung = state.hung.contains(call.name());
            if hung {
                state.calls.push(call.clone());
            }
            hung
        };
        if hung {
            std::future::pending::<()>().await;
        }
    }

    /// Record `call` and check reachability.
    fn enter(&self, call: RuntimeCall) -> Result<parking_lot::MutexGuard<'_, FakeRuntimeState>, RuntimeError> {
        let mut state = self.inner.lock();
        let name = call.name().to_string();
        state.calls.push(call);
        if state.all_unavailable || state.unavailable.contains(&name) {
            return Err(RuntimeError::Unavailable(format!("fake runtime offline for {name}")));
        }
        Ok(state)
    }
}

#[async_trait]
impl RuntimeAdapter for FakeRuntime {
    async fn create(&self, name: &str, options: &CreateOptions, host: &StartOptions) -> Result<(), RuntimeError> {
        let call = RuntimeCall::Create { name: name.to_string(), options: options.clone(), host: host.clone() };
        self.stall(&call).await;
        let mut state = self.enter(call)?;
        if state.containers.contains_key(name) {
            return Err(RuntimeError::NameConflict(name.to_string()));
        }
        if let Some(images) = &state.images {
            if !images.contains(&options.image) {
                return Err(RuntimeError::ImageNotFound(options.image.clone()));
            }
        }
        state.containers.insert(
            name.to_string(),
            FakeContainer { state: RuntimeState::Created, create: options.clone(), start: None },
        );
        Ok(())
    }

    async fn start(&self, name: &str, options: &StartOptions) -> Result<(), RuntimeError> {
        let call = RuntimeCall::Start { name: name.to_string(), options: options.clone() };
        self.stall(&call).await;
        let mut state = self.enter(call)?;
        let container =
            state.containers.get_mut(name).ok_or_else(|| RuntimeError::NotFound(name.to_string()))?;
        if container.state == RuntimeState::Running {
            return Err(RuntimeError::AlreadyRunning(name.to_string()));
        }
        container.state = RuntimeState::Running;
        container.start = Some(options.clone());
        Ok(())
    }

    async fn stop(&self, name: &str, grace: Duration) -> Result<(), RuntimeError> {
        let call = RuntimeCall::Stop { name: name.to_string(), grace };
        self.stall(&call).await;
        let mut state = self.enter(call)?;
        let container =
            state.containers.get_mut(name).ok_or_else(|| RuntimeError::NotFound(name.to_string()))?;
        if container.state == RuntimeState::Running {
            container.state = RuntimeState::Stopped;
        }
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), RuntimeError> {
        let call = RuntimeCall::Remove { name: name.to_string() };
        self.stall(&call).await;
        let mut state = self.enter(call)?;
        match state.containers.get(name).map(|c| c.state) {
            None => Err(RuntimeError::NotFound(name.to_string())),
            Some(RuntimeState::Running) => Err(RuntimeError::Api {
                status: 409,
                message: format!("cannot remove running container {name}"),
            }),
            Some(_) => {
                state.containers.remove(name);
                Ok(())
            }
        }
    }

    async fn inspect(&self, name: &str) -> Result<RuntimeState, RuntimeError> {
        let call = RuntimeCall::Inspect { name: name.to_string() };
        self.stall(&call).await;
        let state = self.enter(call)?;
        Ok(state.containers.get(name).map_or(RuntimeState::Absent, |c| c.state))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
