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

use super::{
    container::Container,
    error::Result,
    label::LabelReleaser,
    mount::MountOps,
    network::{HostportManager, NetworkManager},
    oci_runtime::{ContainerRuntime, RuntimeStorage},
    sandbox::Sandbox,
    sandbox_cache::SandboxCache,
};
use crate::RuntimeConfig;
use anyhow::Context;
use std::{path::PathBuf, sync::Arc};

/// The node subsystems a [RuntimeService] drives.
#[derive(Debug, Clone)]
pub struct Subsystems {
    pub network: Arc<dyn NetworkManager>,
    pub hostports: Arc<dyn HostportManager>,
    pub runtime: Arc<dyn ContainerRuntime>,
    pub storage: Arc<dyn RuntimeStorage>,
    pub labels: Arc<dyn LabelReleaser>,
    pub mounts: Arc<dyn MountOps>,
}

/// Sandbox lifecycle on top of the node subsystems.
///
/// Network start and stop live in `sandbox_network`, the stop sequence in
/// `sandbox_stop`.
#[derive(Debug, Clone)]
pub struct RuntimeService {
    pub(crate) config: Arc<RuntimeConfig>,
    pub(crate) sandboxes: SandboxCache,
    pub(crate) subsystems: Subsystems,
}

impl RuntimeService {
    pub fn new(config: RuntimeConfig, subsystems: Subsystems) -> Self {
        Self {
            config: Arc::new(config),
            sandboxes: SandboxCache::default(),
            subsystems,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn sandboxes(&self) -> &SandboxCache {
        &self.sandboxes
    }

    /// Registers a sandbox created elsewhere.
    pub async fn add_sandbox(&self, sandbox: Sandbox) -> Result<()> {
        self.sandboxes.add(sandbox).await
    }

    pub fn container_state_path(&self, container_id: &str) -> PathBuf {
        self.config.container_state_dir.join(format!("{container_id}.json"))
    }

    /// Persists the last known state of `container`, replacing any earlier
    /// record atomically.
    pub(crate) async fn container_state_to_disk(
        &self,
        container: &Container,
    ) -> anyhow::Result<()> {
        let path = self.container_state_path(container.id());
        let state =
            self.subsystems.runtime.container_status(container);
        let json = serde_json::to_vec_pretty(&state)?;

        tokio::fs::create_dir_all(&self.config.container_state_dir)
            .await
            .with_context(|| {
                format!(
                    "failed to create {}",
                    self.config.container_state_dir.display()
                )
            })?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("failed to rename to {}", path.display()))?;
        Ok(())
    }
}
