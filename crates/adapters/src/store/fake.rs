// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store for tests.

use super::{last_segment, ChangeEvent, StoreAdapter, StoreError, Subtree};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Default)]
struct FakeStoreState {
    /// Full key to value; directories are implied by key prefixes
    values: BTreeMap<String, String>,
    index: u64,
    history: Vec<ChangeEvent>,
    unavailable: bool,
    watch_errors: HashMap<String, VecDeque<StoreError>>,
    watch_calls: HashMap<String, usize>,
}

/// Fake store with etcd-like indexes and watch semantics.
#[derive(Clone)]
pub struct FakeStore {
    inner: Arc<Mutex<FakeStoreState>>,
    changed: Arc<watch::Sender<u64>>,
}

impl Default for FakeStore {
    fn default() -> Self {
        let (changed, _) = watch::channel(0);
        Self { inner: Arc::new(Mutex::new(FakeStoreState::default())), changed: Arc::new(changed) }
    }
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, recording a `set` event.
    pub fn set(&self, key: &str, value: &str) {
        let index = {
            let mut state = self.inner.lock();
            state.index += 1;
            let index = state.index;
            state.values.insert(key.to_string(), value.to_string());
            state.history.push(ChangeEvent { key: key.to_string(), action: "set".into(), index });
            index
        };
        self.notify(index);
    }

    /// Set a key without producing a watch event (seed data).
    pub fn set_without_event(&self, key: &str, value: &str) {
        let mut state = self.inner.lock();
        state.index += 1;
        state.values.insert(key.to_string(), value.to_string());
    }

    /// Remove a directory and everything under it, recording one `delete`.
    pub fn remove_dir(&self, path: &str) {
        let index = {
            let mut state = self.inner.lock();
            let prefix = dir_prefix(path);
            state.values.retain(|k, _| !k.starts_with(&prefix));
            state.index += 1;
            let index = state.index;
            state.history.push(ChangeEvent {
                key: path.trim_end_matches('/').to_string(),
                action: "delete".into(),
                index,
            });
            index
        };
        self.notify(index);
    }

    /// Make every operation fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unavailable = unavailable;
        let index = self.index();
        self.notify(index);
    }

    /// Fail the next `n` watches on `path` with `Unavailable`.
    pub fn fail_next_watches(&self, path: &str, n: usize) {
        for _ in 0..n {
            self.queue_watch_error(path, StoreError::Unavailable("injected".into()));
        }
    }

    /// Fail the next watch on `path` with `err`, waking any pending watcher.
    pub fn push_watch_error(&self, path: &str, err: StoreError) {
        self.queue_watch_error(path, err);
        let index = self.index();
        self.notify(index);
    }

    /// Number of `watch` calls made on `path`.
    pub fn watch_calls(&self, path: &str) -> usize {
        self.inner.lock().watch_calls.get(path).copied().unwrap_or(0)
    }

    pub fn index(&self) -> u64 {
        self.inner.lock().index
    }

    fn queue_watch_error(&self, path: &str, err: StoreError) {
        self.inner.lock().watch_errors.entry(path.to_string()).or_default().push_back(err);
    }

    fn notify(&self, index: u64) {
        self.changed.send_modify(|current| *current = index);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.inner.lock().unavailable {
            return Err(StoreError::Unavailable("fake store offline".into()));
        }
        Ok(())
    }

    /// Poll once for a watch result; `None` means keep waiting.
    fn poll_watch(&self, path: &str, since: u64) -> Option<Result<ChangeEvent, StoreError>> {
        let mut state = self.inner.lock();
        if state.unavailable {
            return Some(Err(StoreError::Unavailable("fake store offline".into())));
        }
        if let Some(err) = state.watch_errors.get_mut(path).and_then(VecDeque::pop_front) {
            return Some(Err(err));
        }
        let path = path.trim_end_matches('/');
        let prefix = dir_prefix(path);
        state
            .history
            .iter()
            .find(|event| {
                event.index >= since && (event.key == path || event.key.starts_with(&prefix))
            })
            .cloned()
            .map(Ok)
    }
}

#[async_trait]
impl StoreAdapter for FakeStore {
    async fn list_children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        let state = self.inner.lock();
        let prefix = dir_prefix(path);
        let mut found = false;
        let mut children = Vec::new();
        for key in state.values.keys().filter(|k| k.starts_with(&prefix)) {
            found = true;
            let rest = &key[prefix.len()..];
            if let Some((dir, _)) = rest.split_once('/') {
                if children.last().map(String::as_str) != Some(dir) {
                    children.push(dir.to_string());
                }
            }
        }
        if !found {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(children)
    }

    async fn read_subtree(&self, path: &str) -> Result<Subtree, StoreError> {
        self.check_available()?;
        let state = self.inner.lock();
        let prefix = dir_prefix(path);
        let mut found = false;
        let mut entries = HashMap::new();
        for (key, value) in state.values.iter().filter(|(k, _)| k.starts_with(&prefix)) {
            found = true;
            let rest = &key[prefix.len()..];
            if !rest.contains('/') {
                entries.insert(last_segment(key).to_string(), value.clone());
            }
        }
        if !found {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(Subtree { entries, index: state.index })
    }

    async fn watch(&self, path: &str, since: Option<u64>) -> Result<ChangeEvent, StoreError> {
        let since = {
            let mut state = self.inner.lock();
            *state.watch_calls.entry(path.to_string()).or_default() += 1;
            since.unwrap_or(state.index + 1)
        };
        let mut changed = self.changed.subscribe();
        loop {
            if let Some(result) = self.poll_watch(path, since) {
                return result;
            }
            if changed.changed().await.is_err() {
                return Err(StoreError::Unavailable("fake store dropped".into()));
            }
        }
    }
}

fn dir_prefix(path: &str) -> String {
    format!("{}/", path.trim_end_matches('/'))
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
