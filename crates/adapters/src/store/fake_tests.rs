// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

fn seeded() -> FakeStore {
    let store = FakeStore::new();
    store.set_without_event("/app/web/image", "nginx");
    store.set_without_event("/app/web/ports", "{80: 8080}");
    store.set_without_event("/app/web/nested/deep", "x");
    store.set_without_event("/app/cache/image", "redis");
    store.set_without_event("/app/readme", "hello");
    store
}

#[tokio::test]
async fn lists_directory_children_in_order() {
    let store = seeded();
    assert_eq!(store.list_children("/app").await.unwrap(), vec!["cache", "web"]);
    assert_eq!(store.list_children("/app/").await.unwrap(), vec!["cache", "web"]);
}

#[tokio::test]
async fn reads_direct_leaves_with_current_index() {
    let store = seeded();
    let subtree = store.read_subtree("/app/web").await.unwrap();
    assert_eq!(subtree.entries.len(), 2);
    assert_eq!(subtree.entries["image"], "nginx");
    assert_eq!(subtree.index, 5);
}

#[tokio::test]
async fn missing_paths_are_not_found() {
    let store = seeded();
    assert_eq!(
        store.read_subtree("/app/db").await.unwrap_err(),
        StoreError::NotFound("/app/db".into())
    );
    assert!(matches!(store.list_children("/other").await, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn watch_waits_for_the_next_change_under_path() {
    let store = seeded();
    let watcher = {
        let store = store.clone();
        tokio::spawn(async move { store.watch("/app/web", None).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    store.set("/app/cache/image", "redis:7");
    store.set("/app/web/ports", "{80: 9090}");

    let event = tokio::time::timeout(Duration::from_secs(2), watcher).await.unwrap().unwrap().unwrap();
    assert_eq!(event.key, "/app/web/ports");
    assert_eq!(event.action, "set");
    assert_eq!(event.index, 7);
}

#[tokio::test]
async fn watch_from_index_replays_history() {
    let store = seeded();
    store.set("/app/web/tag", "1.25");
    store.set("/app/web/tag", "1.26");

    let first = store.watch("/app/web", Some(1)).await.unwrap();
    let second = store.watch("/app/web", Some(first.index + 1)).await.unwrap();

    assert_eq!(first.index, 6);
    assert_eq!(second.index, 7);
    assert_eq!(store.watch_calls("/app/web"), 2);
}

#[tokio::test]
async fn sibling_prefixes_do_not_match() {
    let store = seeded();
    store.set("/app/web2/image", "nginx");
    let pending = store.watch("/app/web", Some(1));
    assert!(tokio::time::timeout(Duration::from_millis(30), pending).await.is_err());
}

#[tokio::test]
async fn remove_dir_emits_delete_for_the_directory() {
    let store = seeded();
    store.remove_dir("/app/web");

    let event = store.watch("/app/web", Some(1)).await.unwrap();
    assert_eq!(event.action, "delete");
    assert_eq!(event.key, "/app/web");
    assert!(matches!(store.read_subtree("/app/web").await, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn injected_watch_errors_come_first_then_clear() {
    let store = seeded();
    store.fail_next_watches("/app/web", 2);
    store.set("/app/web/tag", "x");

    assert!(matches!(store.watch("/app/web", Some(1)).await, Err(StoreError::Unavailable(_))));
    assert!(matches!(store.watch("/app/web", Some(1)).await, Err(StoreError::Unavailable(_))));
    assert!(store.watch("/app/web", Some(1)).await.is_ok());
}

#[tokio::test]
async fn pushed_error_wakes_pending_watch() {
    let store = seeded();
    let watcher = {
        let store = store.clone();
        tokio::spawn(async move { store.watch("/app/web", None).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    store.push_watch_error("/app/web", StoreError::EventIndexCleared("compacted".into()));

    let result = tokio::time::timeout(Duration::from_secs(2), watcher).await.unwrap().unwrap();
    assert!(matches!(result, Err(StoreError::EventIndexCleared(_))));
}

#[tokio::test]
async fn unavailable_store_fails_everything() {
    let store = seeded();
    store.set_unavailable(true);
    assert!(matches!(store.list_children("/app").await, Err(StoreError::Unavailable(_))));
    assert!(matches!(store.read_subtree("/app/web").await, Err(StoreError::Unavailable(_))));
    assert!(matches!(store.watch("/app/web", None).await, Err(StoreError::Unavailable(_))));

    store.set_unavailable(false);
    assert!(store.list_children("/app").await.is_ok());
}
