// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed container parameters and the converter from raw store entries.
//!
//! A container directory in the store is a flat set of string entries:
//!
//! ```text
//! /app/web/image        nginx
//! /app/web/tag          latest
//! /app/web/ports        {80: 8080}
//! /app/web/volumes      ['/data', '/srv/www:/usr/share/nginx/html:ro']
//! /app/web/volumes_from ['web-config']
//! /app/web/privileged   false
//! ```
//!
//! [`convert`] never fails. A structured field that does not parse degrades
//! to `None` and the rest of the definition is still converted.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::literal::{self, Literal, LiteralError};
use crate::runtime::{CreateOptions, StartOptions};

pub const IMAGE: &str = "image";
pub const TAG: &str = "tag";
pub const PORTS: &str = "ports";
pub const VOLUMES: &str = "volumes";
pub const VOLUMES_FROM: &str = "volumes_from";
pub const PRIVILEGED: &str = "privileged";

/// camelCase spelling accepted for `volumes_from`; the snake_case key wins if both exist.
const VOLUMES_FROM_ALIAS: &str = "volumesFrom";

/// Why a structured field was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error(transparent)]
    Literal(#[from] LiteralError),

    #[error("expected {expected}, found {found}")]
    Shape { expected: &'static str, found: &'static str },

    #[error("invalid port '{0}'")]
    InvalidPort(String),

    #[error("invalid volume spec '{0}'")]
    InvalidVolume(String),
}

/// One host-side binding for a container port.
///
/// Both parts empty means "publish on a random host port".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortBinding {
    pub host_ip: Option<String>,
    pub host_port: Option<u16>,
}

impl PortBinding {
    pub fn port(host_port: u16) -> Self {
        Self { host_ip: None, host_port: Some(host_port) }
    }
}

/// Container ports (`80/tcp`) mapped to their host bindings.
///
/// A port with no bindings is exposed but not published.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortMap(BTreeMap<String, Vec<PortBinding>>);

impl PortMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding for a TCP container port.
    pub fn with_binding(mut self, container_port: u16, binding: PortBinding) -> Self {
        self.0.entry(format!("{container_port}/tcp")).or_default().push(binding);
        self
    }

    /// Interpret a parsed literal.
    ///
    /// Mappings go from container port to host binding(s); a list names
    /// container ports to expose without publishing them.
    pub fn from_literal(lit: &Literal) -> Result<Self, FieldError> {
        let mut map = BTreeMap::<String, Vec<PortBinding>>::new();
        match lit {
            Literal::Map(entries) => {
                for (key, value) in entries {
                    map.entry(container_port(key)?).or_default().extend(bindings(value)?);
                }
            }
            Literal::List(items) | Literal::Tuple(items) => {
                for item in items {
                    map.entry(container_port(item)?).or_default();
                }
            }
            other => {
                return Err(FieldError::Shape { expected: "mapping or list", found: other.kind() })
            }
        }
        Ok(Self(map))
    }

    /// Container ports in sorted order.
    pub fn exposed(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn get(&self, container_port: &str) -> Option<&[PortBinding]> {
        self.0.get(container_port).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PortBinding])> {
        self.0.iter().map(|(port, bindings)| (port.as_str(), bindings.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Normalize a container port key to `port/proto`.
fn container_port(lit: &Literal) -> Result<String, FieldError> {
    match lit {
        Literal::Int(n) => Ok(format!("{}/tcp", port_number(*n, &n.to_string())?)),
        Literal::Str(s) => {
            let (number, proto) = s.split_once('/').unwrap_or((s.as_str(), "tcp"));
            let port = number
                .trim()
                .parse::<i64>()
                .map_err(|_| FieldError::InvalidPort(s.clone()))
                .and_then(|n| port_number(n, s))?;
            match proto {
                "tcp" | "udp" | "sctp" => Ok(format!("{port}/{proto}")),
                _ => Err(FieldError::InvalidPort(s.clone())),
            }
        }
        other => Err(FieldError::Shape { expected: "port", found: other.kind() }),
    }
}

fn port_number(n: i64, raw: &str) -> Result<u16, FieldError> {
    u16::try_from(n)
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| FieldError::InvalidPort(raw.to_string()))
}

/// Host bindings for one container port.
fn bindings(lit: &Literal) -> Result<Vec<PortBinding>, FieldError> {
    match lit {
        Literal::List(items) => items.iter().map(binding).collect(),
        single => binding(single).map(|b| vec![b]),
    }
}

fn binding(lit: &Literal) -> Result<PortBinding, FieldError> {
    match lit {
        Literal::None => Ok(PortBinding::default()),
        Literal::Int(_) | Literal::Str(_) => host_port(lit).map(PortBinding::port),
        Literal::Tuple(items) => match items.as_slice() {
            [ip] => Ok(PortBinding { host_ip: Some(host_ip(ip)?), host_port: None }),
            [ip, port] => {
                Ok(PortBinding { host_ip: Some(host_ip(ip)?), host_port: Some(host_port(port)?) })
            }
            _ => Err(FieldError::Shape { expected: "(ip, port)", found: "tuple" }),
        },
        other => Err(FieldError::Shape { expected: "host port", found: other.kind() }),
    }
}

fn host_ip(lit: &Literal) -> Result<String, FieldError> {
    lit.as_str()
        .map(str::to_string)
        .ok_or(FieldError::Shape { expected: "host ip string", found: lit.kind() })
}

fn host_port(lit: &Literal) -> Result<u16, FieldError> {
    match lit {
        Literal::Int(n) => port_number(*n, &n.to_string()),
        Literal::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| FieldError::InvalidPort(s.clone()))
            .and_then(|n| port_number(n, s)),
        other => Err(FieldError::Shape { expected: "host port", found: other.kind() }),
    }
}

/// A mount spec: `/data`, `/host:/data`, or `/host:/data:ro`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSpec {
    pub host: Option<String>,
    pub container: String,
    pub mode: Option<String>,
}

impl VolumeSpec {
    pub fn parse(spec: &str) -> Result<Self, FieldError> {
        let invalid = || FieldError::InvalidVolume(spec.to_string());
        let parts: Vec<&str> = spec.split(':').collect();
        let (host, container, mode) = match parts.as_slice() {
            [container] => (None, *container, None),
            [container, mode] if is_mode(mode) => (None, *container, Some(*mode)),
            [host, container] => (Some(*host), *container, None),
            [host, container, mode] if is_mode(mode) => (Some(*host), *container, Some(*mode)),
            _ => return Err(invalid()),
        };
        if container.is_empty() || host.is_some_and(str::is_empty) {
            return Err(invalid());
        }
        Ok(Self {
            host: host.map(str::to_string),
            container: container.to_string(),
            mode: mode.map(str::to_string),
        })
    }

    /// True when the spec names a host path to bind.
    pub fn is_bind(&self) -> bool {
        self.host.is_some()
    }
}

impl fmt::Display for VolumeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(host) = &self.host {
            write!(f, "{host}:")?;
        }
        f.write_str(&self.container)?;
        if let Some(mode) = &self.mode {
            write!(f, ":{mode}")?;
        }
        Ok(())
    }
}

fn is_mode(s: &str) -> bool {
    !s.is_empty()
        && s.split(',').all(|m| matches!(m, "ro" | "rw" | "z" | "Z" | "nocopy"))
}

fn strings(lit: &Literal) -> Result<Vec<String>, FieldError> {
    match lit {
        Literal::Str(s) => Ok(vec![s.clone()]),
        Literal::List(items) | Literal::Tuple(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or(FieldError::Shape { expected: "string", found: item.kind() })
            })
            .collect(),
        other => Err(FieldError::Shape { expected: "list of strings", found: other.kind() }),
    }
}

fn volume_specs(lit: &Literal) -> Result<Vec<VolumeSpec>, FieldError> {
    strings(lit)?.iter().map(|s| VolumeSpec::parse(s)).collect()
}

/// Typed parameters for one container.
///
/// Every recognized field is always present (possibly `None`); entries with
/// other names are carried in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContainerParams {
    pub image: Option<String>,
    pub tag: Option<String>,
    pub ports: Option<PortMap>,
    pub volumes: Option<Vec<VolumeSpec>>,
    pub volumes_from: Option<Vec<String>>,
    pub privileged: Option<bool>,
    pub extra: BTreeMap<String, String>,
}

impl ContainerParams {
    /// Image reference to create from.
    ///
    /// `image:tag` when both are set. A lone `tag` is taken as a complete
    /// reference. `None` when neither is set.
    pub fn image_ref(&self) -> Option<String> {
        match (self.image.as_deref(), self.tag.as_deref()) {
            (Some(image), Some(tag)) => Some(format!("{image}:{tag}")),
            (Some(image), None) => Some(image.to_string()),
            (None, Some(tag)) => Some(tag.to_string()),
            (None, None) => None,
        }
    }

    pub fn create_options(&self, image: String) -> CreateOptions {
        CreateOptions {
            image,
            volumes: self.volumes.iter().flatten().map(|v| v.container.clone()).collect(),
            exposed_ports: self.ports.as_ref().map(PortMap::exposed).unwrap_or_default(),
        }
    }

    pub fn start_options(&self) -> StartOptions {
        StartOptions {
            port_bindings: self.ports.clone().unwrap_or_default(),
            binds: self
                .volumes
                .iter()
                .flatten()
                .filter(|v| v.is_bind())
                .map(VolumeSpec::to_string)
                .collect(),
            volumes_from: self.volumes_from.clone().unwrap_or_default(),
            privileged: self.privileged.unwrap_or(false),
        }
    }

    /// Names of the fields that differ from `other`, extra keys included.
    pub fn diff(&self, other: &Self) -> Vec<String> {
        let mut changed = Vec::new();
        let mut check = |differs: bool, field: &str| {
            if differs {
                changed.push(field.to_string());
            }
        };
        check(self.image != other.image, IMAGE);
        check(self.tag != other.tag, TAG);
        check(self.ports != other.ports, PORTS);
        check(self.volumes != other.volumes, VOLUMES);
        check(self.volumes_from != other.volumes_from, VOLUMES_FROM);
        check(self.privileged != other.privileged, PRIVILEGED);

        let mut extra_keys: Vec<&String> = self.extra.keys().chain(other.extra.keys()).collect();
        extra_keys.sort();
        extra_keys.dedup();
        for key in extra_keys {
            if self.extra.get(key) != other.extra.get(key) {
                changed.push(key.clone());
            }
        }
        changed
    }
}

/// Convert raw store entries into typed parameters.
pub fn convert(raw: &HashMap<String, String>) -> ContainerParams {
    let mut params = ContainerParams::default();
    for (key, value) in raw {
        match key.as_str() {
            IMAGE => params.image = non_empty(value),
            TAG => params.tag = non_empty(value),
            PORTS => params.ports = structured(PORTS, value, PortMap::from_literal),
            VOLUMES => params.volumes = structured(VOLUMES, value, volume_specs),
            VOLUMES_FROM => params.volumes_from = structured(VOLUMES_FROM, value, strings),
            VOLUMES_FROM_ALIAS if !raw.contains_key(VOLUMES_FROM) => {
                params.volumes_from = structured(VOLUMES_FROM_ALIAS, value, strings)
            }
            VOLUMES_FROM_ALIAS => {}
            PRIVILEGED => params.privileged = flag(value),
            _ => {
                params.extra.insert(key.clone(), value.clone());
            }
        }
    }
    params
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn structured<T>(
    field: &str,
    raw: &str,
    shape: fn(&Literal) -> Result<T, FieldError>,
) -> Option<T> {
    if raw.trim().is_empty() {
        return None;
    }
    match literal::parse(raw).map_err(FieldError::from).and_then(|lit| shape(&lit)) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(field, value = raw, error = %e, "ignoring malformed structured field");
            None
        }
    }
}

fn flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        "" => None,
        _ => {
            warn!(field = PRIVILEGED, value = raw, "ignoring non-boolean flag");
            None
        }
    }
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
