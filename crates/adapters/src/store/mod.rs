// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hierarchical key-value store adapters
//!
//! Container definitions live one directory per container under a root:
//!
//! ```text
//! /app                 root passed on the command line
//!  ├── web/            container name
//!  │    ├── image      "nginx"
//!  │    └── ports      "{80: 8080}"
//!  └── cache/
//!       └── image      "redis"
//! ```

mod etcd;

pub use etcd::EtcdStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeStore;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("key not found: {0}")]
    NotFound(String),
    /// The requested watch index has been compacted out of the event history.
    #[error("event index cleared: {0}")]
    EventIndexCleared(String),
    #[error("store protocol error: {0}")]
    Protocol(String),
}

/// The leaf entries directly under a directory, with the store index they
/// were read at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subtree {
    /// Field name (last key segment) to raw value
    pub entries: HashMap<String, String>,
    pub index: u64,
}

/// A single change delivered by a watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Full key that changed
    pub key: String,
    /// Store action (`set`, `delete`, `expire`, ...)
    pub action: String,
    /// Modification index of the change
    pub index: u64,
}

/// Adapter for the store holding container definitions
#[async_trait]
pub trait StoreAdapter: Clone + Send + Sync + 'static {
    /// Names (last path segment) of the directories directly under `path`.
    async fn list_children(&self, path: &str) -> Result<Vec<String>, StoreError>;

    /// Leaf entries directly under `path`.
    async fn read_subtree(&self, path: &str) -> Result<Subtree, StoreError>;

    /// Wait for the next change at or under `path`.
    ///
    /// `since` is the first index of interest; `None` waits for the next
    /// change after now. Dropping the future cancels the wait.
    async fn watch(&self, path: &str, since: Option<u64>) -> Result<ChangeEvent, StoreError>;
}

/// Join a directory path and a child name with exactly one separator.
pub fn join_key(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name.trim_start_matches('/'))
}

/// Last `/`-separated segment of a key.
pub fn last_segment(key: &str) -> &str {
    let key = key.trim_end_matches('/');
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
