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

//! Image pull and pod sandbox lifecycle.

pub use container::{Container, ContainerRole, ContainerState, ContainerStatus};
pub use error::SandboxServiceError;
pub use image_service::{
    decode_docker_auth, AuthConfig, ImageService, ImageSpec, PullImageRequest,
    PullImageResponse,
};
pub use image_store::{
    CanPull, DockerAuthConfig, ImageRecord, ImageStore, PreparedImage,
    PullOptions,
};
pub use label::{LabelError, LabelReleaser, McsLabels};
pub use mount::{follow_symlink_in_scope, HostMounts, MountOps};
pub use netns::NetNs;
pub use network::{
    HostportManager, NetworkManager, PodPortMapping, PortMapping, Protocol,
};
pub use oci_runtime::{
    ContainerRuntime, RuntimeStorage, StorageError, STOP_TIMEOUT_IMMEDIATE,
};
pub use runtime_service::{RuntimeService, Subsystems};
pub use sandbox::{Sandbox, SandboxBuilder};
pub use sandbox_cache::SandboxCache;
pub use teardown::{Teardown, TeardownStep, TeardownWarning};

mod container;
mod error;
#[cfg(test)]
mod fakes;
mod image_service;
mod image_store;
mod label;
mod mount;
mod netns;
mod network;
mod oci_runtime;
mod runtime_service;
mod sandbox;
mod sandbox_cache;
mod sandbox_network;
mod sandbox_stop;
mod teardown;
