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

use std::path::PathBuf;
use thiserror::Error;
use tonic::Status;
use tracing::error;

pub(crate) type Result<T> = std::result::Result<T, SandboxServiceError>;

#[derive(Debug, Error)]
pub enum SandboxServiceError {
    #[error("PodSandboxId should not be empty")]
    SandboxIdEmpty,
    #[error("sandbox '{sandbox_id}' already exists")]
    SandboxExists { sandbox_id: String },
    #[error("sandbox '{sandbox_id}' not found")]
    SandboxNotFound { sandbox_id: String },
    #[error("sandbox id prefix '{prefix}' matches multiple sandboxes")]
    AmbiguousSandboxId { prefix: String },
    #[error("failed to decode registry auth: {source}")]
    AuthDecode { source: base64::DecodeError },
    #[error("registry auth is not valid utf-8: {source}")]
    AuthNotUtf8 { source: std::string::FromUtf8Error },
    #[error("not allowed to pull image '{image}': {source}")]
    PullNotPermitted { image: String, source: anyhow::Error },
    #[error("failed to pull image '{image}': {source}")]
    PullFailed { image: String, source: anyhow::Error },
    #[error(
        "failed to create network for container {name} in sandbox {sandbox_id}: {source}"
    )]
    NetworkSetup { name: String, sandbox_id: String, source: anyhow::Error },
    #[error(
        "failed to get network status for container {name} in sandbox {sandbox_id}: {source}"
    )]
    NetworkStatus { name: String, sandbox_id: String, source: anyhow::Error },
    #[error(
        "failed to get valid ipv4 address for container {name} in sandbox {sandbox_id}: got '{ip}'"
    )]
    InvalidPodIp { name: String, sandbox_id: String, ip: String },
    #[error(
        "failed to add hostport mapping for container {name} in sandbox {sandbox_id}: {source}"
    )]
    HostportAdd { name: String, sandbox_id: String, source: anyhow::Error },
    #[error("failed to remove network namespace of sandbox {sandbox_id}: {source}")]
    NetNsRemove { sandbox_id: String, source: std::io::Error },
    #[error(
        "failed to update status of container {name} in pod sandbox {sandbox_id}: {source}"
    )]
    ContainerStatus { name: String, sandbox_id: String, source: anyhow::Error },
    #[error(
        "failed to stop container {name} in pod sandbox {sandbox_id}: {source}"
    )]
    ContainerStop { name: String, sandbox_id: String, source: anyhow::Error },
    #[error(
        "failed to release process label '{label}' of sandbox {sandbox_id}: {source}"
    )]
    ReleaseLabel { label: String, sandbox_id: String, source: anyhow::Error },
    #[error(
        "failed to resolve shm path '{}' of sandbox {sandbox_id}: {source}",
        .path.display()
    )]
    ShmResolve { path: PathBuf, sandbox_id: String, source: std::io::Error },
    #[error(
        "failed to unmount shm '{}' of sandbox {sandbox_id}: {source}",
        .path.display()
    )]
    ShmUnmount { path: PathBuf, sandbox_id: String, source: std::io::Error },
}

impl From<SandboxServiceError> for Status {
    fn from(err: SandboxServiceError) -> Self {
        let msg = err.to_string();
        error!("{msg}");
        match err {
            SandboxServiceError::SandboxIdEmpty
            | SandboxServiceError::AmbiguousSandboxId { .. } => {
                Status::invalid_argument(msg)
            }
            SandboxServiceError::SandboxExists { .. } => {
                Status::already_exists(msg)
            }
            SandboxServiceError::SandboxNotFound { .. } => {
                Status::not_found(msg)
            }
            SandboxServiceError::AuthDecode { .. }
            | SandboxServiceError::AuthNotUtf8 { .. } => {
                Status::unauthenticated(msg)
            }
            SandboxServiceError::PullNotPermitted { .. } => {
                Status::permission_denied(msg)
            }
            SandboxServiceError::InvalidPodIp { .. } => {
                Status::failed_precondition(msg)
            }
            SandboxServiceError::PullFailed { .. }
            | SandboxServiceError::NetworkSetup { .. }
            | SandboxServiceError::NetworkStatus { .. }
            | SandboxServiceError::HostportAdd { .. }
            | SandboxServiceError::NetNsRemove { .. }
            | SandboxServiceError::ContainerStatus { .. }
            | SandboxServiceError::ContainerStop { .. }
            | SandboxServiceError::ReleaseLabel { .. }
            | SandboxServiceError::ShmResolve { .. }
            | SandboxServiceError::ShmUnmount { .. } => Status::internal(msg),
        }
    }
}
