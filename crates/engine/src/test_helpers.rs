// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use crate::RetryPolicy;
use ed_adapters::{FakeRuntime, FakeStore};
use ed_core::ContainerParams;
use std::collections::HashMap;
use std::time::Duration;

/// Convert literal entries the way a watcher would.
pub(crate) fn params(entries: &[(&str, &str)]) -> ContainerParams {
    let raw: HashMap<String, String> =
        entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    ed_core::convert(&raw)
}

/// Operation labels of the mutating calls made for `name`.
pub(crate) fn ops(runtime: &FakeRuntime, name: &str) -> Vec<&'static str> {
    runtime.mutations_for(name).iter().map(|c| c.op()).collect()
}

/// Seed a container definition without producing watch events.
pub(crate) fn define(store: &FakeStore, dir: &str, entries: &[(&str, &str)]) {
    for (field, value) in entries {
        store.set_without_event(&format!("{dir}/{field}"), value);
    }
}

/// Millisecond-scale retry policy for tests.
pub(crate) fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::default()
        .max_attempts(max_attempts)
        .base_delay(Duration::from_millis(5))
        .max_delay(Duration::from_millis(20))
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub(crate) async fn eventually(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
