// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! etcd v2 keyspace adapter (HTTP/JSON over TCP).

use super::{last_segment, ChangeEvent, StoreAdapter, StoreError, Subtree};
use crate::http::{self, HttpError, Response};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// etcd error code for a missing key
const KEY_NOT_FOUND: u32 = 100;
/// etcd error code for a watch index older than the retained history
const EVENT_INDEX_CLEARED: u32 = 401;

/// etcd v2 client.
///
/// Stateless apart from its address; every request opens its own connection,
/// so clones can be shared freely across watchers.
#[derive(Debug, Clone)]
pub struct EtcdStore {
    addr: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct KeysResponse {
    #[serde(default)]
    action: String,
    node: Node,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Node {
    #[serde(default)]
    key: String,
    #[serde(default)]
    dir: bool,
    value: Option<String>,
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    modified_index: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EtcdErrorBody {
    error_code: u32,
    #[serde(default)]
    message: String,
    #[serde(default)]
    cause: String,
}

impl EtcdStore {
    /// Client for the etcd member at `addr` (`host:port`).
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into(), timeout: DEFAULT_TIMEOUT }
    }

    /// Bound for list and read requests. Watches are never timed out.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn get(&self, target: &str) -> Result<Response, StoreError> {
        http::timed(self.timeout, self.get_untimed(target)).await.map_err(transport_error)
    }

    async fn get_untimed(&self, target: &str) -> Result<Response, HttpError> {
        let request = http::format_request("GET", target, &self.addr, None);
        let stream = http::connect_tcp(&self.addr).await?;
        http::send(stream, &request).await
    }

    /// Fetch the directory node at `path` and the store index it was read at.
    async fn get_dir(&self, path: &str) -> Result<(Node, u64), StoreError> {
        let response = self.get(&format!("{}?sorted=true", keys_path(path))).await?;
        let header_index = response.header("x-etcd-index").map(str::to_string);
        let body = decode(path, response)?;
        if !body.node.dir {
            return Err(StoreError::Protocol(format!("{path} is not a directory")));
        }

        let index = match header_index {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| StoreError::Protocol(format!("bad X-Etcd-Index {raw:?}")))?,
            None => body.node.nodes.iter().map(|n| n.modified_index).max().unwrap_or(0),
        };
        Ok((body.node, index))
    }
}

#[async_trait]
impl StoreAdapter for EtcdStore {
    async fn list_children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let (node, _) = self.get_dir(path).await?;
        Ok(node
            .nodes
            .into_iter()
            .filter(|child| child.dir)
            .map(|child| last_segment(&child.key).to_string())
            .collect())
    }

    async fn read_subtree(&self, path: &str) -> Result<Subtree, StoreError> {
        let (node, index) = self.get_dir(path).await?;
        let entries = node
            .nodes
            .into_iter()
            .filter(|child| !child.dir)
            .filter_map(|child| {
                let value = child.value?;
                Some((last_segment(&child.key).to_string(), value))
            })
            .collect();
        Ok(Subtree { entries, index })
    }

    async fn watch(&self, path: &str, since: Option<u64>) -> Result<ChangeEvent, StoreError> {
        let mut target = format!("{}?wait=true&recursive=true", keys_path(path));
        if let Some(index) = since {
            target.push_str(&format!("&waitIndex={index}"));
        }

        loop {
            let response = self.get_untimed(&target).await.map_err(transport_error)?;
            // etcd ends idle long polls with an empty 200
            if response.is_success() && response.body.trim().is_empty() {
                tracing::debug!(path, "watch returned empty, re-polling");
                continue;
            }
            let body = decode(path, response)?;
            return Ok(ChangeEvent {
                key: body.node.key,
                action: body.action,
                index: body.node.modified_index,
            });
        }
    }
}

fn keys_path(path: &str) -> String {
    format!("/v2/keys/{}", path.trim_start_matches('/'))
}

fn transport_error(e: HttpError) -> StoreError {
    match e {
        HttpError::Malformed(msg) => StoreError::Protocol(msg),
        other => StoreError::Unavailable(other.to_string()),
    }
}

fn decode(path: &str, response: Response) -> Result<KeysResponse, StoreError> {
    if response.is_success() {
        return serde_json::from_str(&response.body)
            .map_err(|e| StoreError::Protocol(format!("invalid keys response for {path}: {e}")));
    }

    match serde_json::from_str::<EtcdErrorBody>(&response.body) {
        Ok(err) if err.error_code == KEY_NOT_FOUND => {
            let cause = if err.cause.is_empty() { path.to_string() } else { err.cause };
            Err(StoreError::NotFound(cause))
        }
        Ok(err) if err.error_code == EVENT_INDEX_CLEARED => {
            Err(StoreError::EventIndexCleared(format!("{path}: {}", err.cause)))
        }
        Ok(err) => Err(StoreError::Protocol(format!(
            "etcd error {} on {path}: {}",
            err.error_code, err.message
        ))),
        Err(_) if response.status >= 500 => {
            Err(StoreError::Unavailable(format!("HTTP {} from etcd", response.status)))
        }
        Err(_) => Err(StoreError::Protocol(format!(
            "HTTP {} on {path}: {}",
            response.status,
            response.body.trim()
        ))),
    }
}

#[cfg(test)]
#[path = "etcd_tests.rs"]
mod tests;
