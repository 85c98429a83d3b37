// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ed-core: container definitions for etcdocker
//!
//! Turns the flat string entries an operator writes under a container's
//! store directory into typed runtime parameters.

pub mod macros;

pub mod literal;
pub mod params;
pub mod runtime;

pub use literal::{Literal, LiteralError};
pub use params::{
    convert, ContainerParams, FieldError, PortBinding, PortMap, VolumeSpec, IMAGE, PORTS,
    PRIVILEGED, TAG, VOLUMES, VOLUMES_FROM,
};
pub use runtime::{CreateOptions, RuntimeState, StartOptions};
