// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the two external services etcdocker reconciles between:
//! the key-value store holding definitions and the container runtime.

pub mod http;
pub mod runtime;
pub mod store;

pub use runtime::{DockerEngine, RuntimeAdapter, RuntimeError};
pub use store::{ChangeEvent, EtcdStore, StoreAdapter, StoreError, Subtree};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use runtime::{FakeContainer, FakeRuntime, RuntimeCall};
#[cfg(any(test, feature = "test-support"))]
pub use store::FakeStore;
