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

//! Contract of the content addressed image store.

use std::fmt::Debug;

/// Credentials forwarded to the registry.
#[derive(Clone, PartialEq, Eq)]
pub struct DockerAuthConfig {
    pub username: String,
    pub password: String,
}

impl Debug for DockerAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockerAuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullOptions {
    pub auth: Option<DockerAuthConfig>,
}

/// Verdict of the store's pull gate.
///
/// Both halves are reported as the store saw them. A pull is only refused
/// when it is not allowed and the store also says why.
#[derive(Debug, Default)]
pub struct CanPull {
    pub allowed: bool,
    pub error: Option<anyhow::Error>,
}

impl CanPull {
    pub fn allowed() -> Self {
        Self { allowed: true, error: None }
    }

    pub fn denied(error: anyhow::Error) -> Self {
        Self { allowed: false, error: Some(error) }
    }
}

/// An image as recorded in the local store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: String,
    pub names: Vec<String>,
    pub config_digest: String,
}

/// A remote image that was resolved but not committed to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedImage {
    /// Empty for schema1 manifests, which carry no config blob.
    pub config_digest: String,
}

#[tonic::async_trait]
pub trait ImageStore: Send + Sync + Debug {
    /// Authorization and availability gate.
    async fn can_pull(&self, image: &str, options: &PullOptions) -> CanPull;

    /// Fails if the image is not in the store.
    async fn image_status(&self, image: &str) -> anyhow::Result<ImageRecord>;

    async fn prepare_image(
        &self,
        image: &str,
        options: &PullOptions,
    ) -> anyhow::Result<PreparedImage>;

    async fn pull_image(
        &self,
        image: &str,
        options: &PullOptions,
    ) -> anyhow::Result<ImageRecord>;
}
