// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker Engine API adapter over the daemon's Unix socket.
//!
//! Host configuration (port bindings, binds, volumes-from, privileged) goes
//! into the create request. Engines only accept it on start before API
//! v1.24, so older configured versions send it there instead.

use super::{RuntimeAdapter, RuntimeError};
use crate::http::{self, HttpError, Response};
use async_trait::async_trait;
use ed_core::{CreateOptions, RuntimeState, StartOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SOCKET: &str = "/var/run/docker.sock";
pub const DEFAULT_API_VERSION: &str = "v1.41";
/// First API version that rejects host configuration on start
const CREATE_HOST_CONFIG_SINCE: (u32, u32) = (1, 24);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Docker Engine client.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    socket: PathBuf,
    api_version: String,
    timeout: Duration,
}

/// Serializes as `{}`; Docker uses empty objects as set members.
#[derive(Debug, Serialize)]
struct Empty {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateBody<'a> {
    image: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    exposed_ports: BTreeMap<&'a str, Empty>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    volumes: BTreeMap<&'a str, Empty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    host_config: Option<HostConfigBody<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct HostConfigBody<'a> {
    port_bindings: BTreeMap<&'a str, Vec<HostBinding>>,
    binds: &'a [String],
    volumes_from: &'a [String],
    privileged: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct HostBinding {
    host_ip: String,
    /// Empty string asks the engine for a random port
    host_port: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectBody {
    state: InspectState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectState {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    running: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl Default for DockerEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SOCKET)
    }
}

impl DockerEngine {
    pub fn new(socket: impl Into<PathBuf>) -> Self {
        Self {
            socket: socket.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// API version prefix, with or without the leading `v`.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.api_version = if version.starts_with('v') { version } else { format!("v{version}") };
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn socket(&self) -> &Path {
        &self.socket
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Whether host configuration rides on create rather than start.
    fn host_config_on_create(&self) -> bool {
        parse_api_version(&self.api_version).map_or(true, |v| v >= CREATE_HOST_CONFIG_SINCE)
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<String>,
        limit: Duration,
    ) -> Result<Response, RuntimeError> {
        let target = format!("/{}{}", self.api_version, path);
        let request = http::format_request(method, &target, "docker", body.as_deref());
        tracing::debug!(method, target = %target, "docker request");
        http::timed(limit, self.exchange(&request)).await.map_err(transport_error)
    }

    #[cfg(unix)]
    async fn exchange(&self, request: &str) -> Result<Response, HttpError> {
        let stream = http::connect_unix(&self.socket).await?;
        http::send(stream, request).await
    }

    #[cfg(not(unix))]
    async fn exchange(&self, _request: &str) -> Result<Response, HttpError> {
        Err(HttpError::Connect {
            addr: self.socket.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Unsupported, "unix sockets unavailable"),
        })
    }
}

#[async_trait]
impl RuntimeAdapter for DockerEngine {
    async fn create(&self, name: &str, options: &CreateOptions, host: &StartOptions) -> Result<(), RuntimeError> {
        let body = CreateBody {
            image: &options.image,
            exposed_ports: options.exposed_ports.iter().map(|p| (p.as_str(), Empty {})).collect(),
            volumes: options.volumes.iter().map(|v| (v.as_str(), Empty {})).collect(),
            host_config: self.host_config_on_create().then(|| host_config(host)),
        };
        let body = to_json(&body)?;
        let response =
            self.request("POST", &format!("/containers/create?name={name}"), Some(body), self.timeout).await?;
        match response.status {
            s if (200..300).contains(&s) => Ok(()),
            404 => Err(RuntimeError::ImageNotFound(options.image.clone())),
            409 => Err(RuntimeError::NameConflict(name.to_string())),
            _ => Err(api_error(&response)),
        }
    }

    async fn start(&self, name: &str, options: &StartOptions) -> Result<(), RuntimeError> {
        let body = if self.host_config_on_create() {
            None
        } else {
            Some(to_json(&host_config(options))?)
        };
        let response =
            self.request("POST", &format!("/containers/{name}/start"), body, self.timeout).await?;
        match response.status {
            s if (200..300).contains(&s) => Ok(()),
            304 => Err(RuntimeError::AlreadyRunning(name.to_string())),
            404 => Err(RuntimeError::NotFound(name.to_string())),
            _ => Err(api_error(&response)),
        }
    }

    async fn stop(&self, name: &str, grace: Duration) -> Result<(), RuntimeError> {
        let path = format!("/containers/{name}/stop?t={}", grace.as_secs());
        let response = self.request("POST", &path, None, self.timeout + grace).await?;
        match response.status {
            // 304: already stopped
            s if (200..300).contains(&s) || s == 304 => Ok(()),
            404 => Err(RuntimeError::NotFound(name.to_string())),
            _ => Err(api_error(&response)),
        }
    }

    async fn remove(&self, name: &str) -> Result<(), RuntimeError> {
        let response = self.request("DELETE", &format!("/containers/{name}"), None, self.timeout).await?;
        match response.status {
            s if (200..300).contains(&s) => Ok(()),
            404 => Err(RuntimeError::NotFound(name.to_string())),
            _ => Err(api_error(&response)),
        }
    }

    async fn inspect(&self, name: &str) -> Result<RuntimeState, RuntimeError> {
        let response = self.request("GET", &format!("/containers/{name}/json"), None, self.timeout).await?;
        match response.status {
            200 => {
                let body: InspectBody = serde_json::from_str(&response.body)
                    .map_err(|e| RuntimeError::Protocol(format!("inspect {name}: {e}")))?;
                Ok(state_of(&body.state))
            }
            404 => Ok(RuntimeState::Absent),
            _ => Err(api_error(&response)),
        }
    }
}

fn host_config(options: &StartOptions) -> HostConfigBody<'_> {
    let port_bindings = options
        .port_bindings
        .iter()
        .filter(|(_, bindings)| !bindings.is_empty())
        .map(|(port, bindings)| {
            let bindings = bindings
                .iter()
                .map(|b| HostBinding {
                    host_ip: b.host_ip.clone().unwrap_or_default(),
                    host_port: b.host_port.map(|p| p.to_string()).unwrap_or_default(),
                })
                .collect::<Vec<_>>();
            (port, bindings)
        })
        .collect();
    HostConfigBody {
        port_bindings,
        binds: &options.binds,
        volumes_from: &options.volumes_from,
        privileged: options.privileged,
    }
}

/// `v1.41` → `(1, 41)`
fn parse_api_version(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.trim_start_matches('v').split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

fn state_of(state: &InspectState) -> RuntimeState {
    match state.status.as_deref() {
        Some("created") => RuntimeState::Created,
        Some("running" | "restarting" | "paused") => RuntimeState::Running,
        Some(_) => RuntimeState::Stopped,
        // Engines before API v1.21 only report the Running flag
        None if state.running => RuntimeState::Running,
        None => RuntimeState::Stopped,
    }
}

fn to_json<T: Serialize>(body: &T) -> Result<String, RuntimeError> {
    serde_json::to_string(body).map_err(|e| RuntimeError::Protocol(e.to_string()))
}

fn transport_error(e: HttpError) -> RuntimeError {
    match e {
        HttpError::Malformed(msg) => RuntimeError::Protocol(msg),
        other => RuntimeError::Unavailable(other.to_string()),
    }
}

fn api_error(response: &Response) -> RuntimeError {
    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .map(|b| b.message)
        .unwrap_or_else(|_| response.body.trim().to_string());
    RuntimeError::Api { status: response.status, message }
}

#[cfg(all(test, unix))]
#[path = "docker_tests.rs"]
mod tests;
