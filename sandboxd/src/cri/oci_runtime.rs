/* -------------------------------------------------------------------------- *\
 *                |   █████╗ ██╗   ██╗██████╗  █████╗ ███████╗ |              *
 *                |  ██╔══██╗██║   ██║██╔══██╗██╔══██╗██╔════╝ |              *
 *                |  ███████║██║   ██║██████╔╝███████║█████╗   |              *
 *                |  ██╔══██║██║   ██║██╔══██╗██╔══██║██╔══╝   |              *
 *                |  ██║  ██║╚██████╔╝██║  ██║██║  ██║███████╗ |              *
 *                |  ╚═╝  ╚═╝ ╚═════╝ ╚═╝  ╚═╝╚═╝  ╚═╝╚══════╝ |              *
 *                +--------------------------------------------+              *
 *                                                                            *
 *                         Distributed Systems Runtime                        *
 * -------------------------------------------------------------------------- *
 * Copyright 2022 - 2024, the aurae contributors                              *
 * SPDX-License-Identifier: Apache-2.0                                        *
\* -------------------------------------------------------------------------- */

//! Contracts of the OCI runtime and of the container storage layer.

use super::container::{Container, ContainerState};
use std::fmt::Debug;
use thiserror::Error;

/// Timeout passed to [ContainerRuntime::stop_container] to kill without a
/// grace period.
pub const STOP_TIMEOUT_IMMEDIATE: i64 = -1;

#[tonic::async_trait]
pub trait ContainerRuntime: Send + Sync + Debug {
    /// Refreshes the state held by `container` from the runtime.
    async fn update_status(&self, container: &mut Container)
        -> anyhow::Result<()>;

    /// Last state observed by [ContainerRuntime::update_status].
    fn container_status(&self, container: &Container) -> ContainerState {
        container.state().clone()
    }

    /// Stops the container, waiting up to `timeout` seconds before killing
    /// it. A negative timeout kills immediately. On success the runtime
    /// leaves a terminal state in `container`.
    async fn stop_container(
        &self,
        container: &mut Container,
        timeout: i64,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage has no record of the container. Storage and runtime race
    /// during teardown, so this means "already cleaned up".
    #[error("container '{id}' is not known to storage")]
    ContainerUnknown { id: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Storage side of a container: its mounted root filesystem.
#[tonic::async_trait]
pub trait RuntimeStorage: Send + Sync + Debug {
    /// Unmounts the container's storage.
    async fn stop_container(&self, id: &str) -> Result<(), StorageError>;
}
