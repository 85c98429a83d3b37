// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ed-engine: watch-and-reconcile engine for etcdocker
//!
//! The [`Agent`] discovers container definitions under a store directory and
//! runs one [`Watcher`] per container. Each watcher owns a
//! [`ContainerHandle`] that converges its container toward the definition.

mod agent;
mod container;
mod retry;
mod watcher;

pub use agent::{Agent, AgentConfig, AgentError, AgentOutcome, AgentReport};
pub use container::{Applied, ContainerError, ContainerHandle, Converged, ErrorClass};
pub use retry::{Backoff, RetryPolicy};
pub use watcher::{Watcher, WatcherError, WatcherExit, WatcherState};

#[cfg(test)]
mod test_helpers;
