// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime-facing types: observed container state and the options passed to
//! the runtime's create and start primitives.

use crate::params::PortMap;

/// Observable state of a named container in the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeState {
    /// No container with that name exists.
    Absent,
    /// Created but never started.
    Created,
    Running,
    /// Exited, dead, or otherwise not running.
    Stopped,
}

crate::simple_display! {
    RuntimeState {
        Absent => "absent",
        Created => "created",
        Running => "running",
        Stopped => "stopped",
    }
}

/// Arguments for creating a container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateOptions {
    /// Full image reference (`image:tag`)
    pub image: String,
    /// Container-side volume paths
    pub volumes: Vec<String>,
    /// Container ports to expose (`80/tcp`); host bindings are a start option
    pub exposed_ports: Vec<String>,
}

/// Host configuration applied when starting a container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StartOptions {
    pub port_bindings: PortMap,
    /// Host bind mounts (`/host:/container[:mode]`)
    pub binds: Vec<String>,
    pub volumes_from: Vec<String>,
    pub privileged: bool,
}
