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
    container::{ContainerRole, ContainerStatus},
    error::{Result, SandboxServiceError},
    oci_runtime::{StorageError, STOP_TIMEOUT_IMMEDIATE},
    runtime_service::RuntimeService,
    sandbox::Sandbox,
    teardown::{Teardown, TeardownStep},
};
use std::path::Path;
use tracing::{debug, warn};

impl RuntimeService {
    /// Stops every container of the sandbox and releases what it holds on
    /// the node.
    ///
    /// A sandbox that cannot be found counts as already stopped. Only
    /// failures that would leak a kernel or runtime resource are returned;
    /// everything else ends up in the returned [Teardown].
    #[tracing::instrument(skip(self))]
    pub async fn stop_pod_sandbox(&self, sandbox_id: &str) -> Result<Teardown> {
        debug!("StopPodSandboxRequest {sandbox_id}");

        let sandbox = match self.sandboxes.get(sandbox_id).await {
            Ok(sandbox) => sandbox,
            Err(e @ SandboxServiceError::SandboxIdEmpty) => return Err(e),
            Err(e) => {
                warn!(
                    "could not get sandbox {sandbox_id}, it's probably been stopped already: {e}"
                );
                return Ok(Teardown::default());
            }
        };

        // held for the whole sequence, concurrent stops of one sandbox queue
        let mut sandbox = sandbox.lock().await;
        let teardown = self.teardown(&mut sandbox).await?;

        debug!("StopPodSandboxResponse: {teardown:?}");
        Ok(teardown)
    }

    /// Stops every known sandbox. Failures are logged and never stop the
    /// sweep.
    pub async fn stop_all_pod_sandboxes(&self) {
        debug!("StopAllPodSandboxes");
        for sandbox_id in self.sandboxes.ids().await {
            match self.stop_pod_sandbox(&sandbox_id).await {
                Ok(teardown) if !teardown.is_clean() => {
                    debug!(
                        "sandbox {sandbox_id} stopped with {} warnings",
                        teardown.warnings().len()
                    );
                }
                Ok(_) => {}
                Err(e) => warn!("could not StopPodSandbox {sandbox_id}: {e}"),
            }
        }
    }

    async fn teardown(&self, sandbox: &mut Sandbox) -> Result<Teardown> {
        let host_network = sandbox.net_ns_path().is_empty();
        let mut teardown = self.network_stop(host_network, sandbox).await;

        sandbox.net_ns_remove(self.subsystems.mounts.as_ref()).map_err(
            |source| SandboxServiceError::NetNsRemove {
                sandbox_id: sandbox.id().to_string(),
                source,
            },
        )?;

        for container_id in sandbox.teardown_order() {
            teardown.merge(self.stop_container(sandbox, &container_id).await?);
        }

        let label = sandbox.process_label();
        self.subsystems.labels.release_label(label).map_err(|source| {
            SandboxServiceError::ReleaseLabel {
                label: label.to_string(),
                sandbox_id: sandbox.id().to_string(),
                source,
            }
        })?;

        self.unmount_shm(sandbox)?;

        match self.subsystems.storage.stop_container(sandbox.id()).await {
            Ok(()) => {}
            Err(StorageError::ContainerUnknown { .. }) => warn!(
                "sandbox container {} already removed from storage",
                sandbox.id()
            ),
            Err(e) => teardown.warn(
                TeardownStep::SandboxStorageStop,
                sandbox.id(),
                format!(
                    "failed to stop sandbox container in pod sandbox {}: {e}",
                    sandbox.id()
                ),
            ),
        }

        Ok(teardown)
    }

    async fn stop_container(
        &self,
        sandbox: &mut Sandbox,
        container_id: &str,
    ) -> Result<Teardown> {
        let mut teardown = Teardown::default();
        let sandbox_id = sandbox.id().to_string();
        let Some(container) = sandbox.container_mut(container_id) else {
            return Ok(teardown);
        };
        let name = container.name().to_string();
        let runtime = &self.subsystems.runtime;

        runtime.update_status(container).await.map_err(|source| {
            SandboxServiceError::ContainerStatus {
                name: name.clone(),
                sandbox_id: sandbox_id.clone(),
                source,
            }
        })?;

        if runtime.container_status(container).status
            != ContainerStatus::Stopped
        {
            runtime
                .stop_container(container, STOP_TIMEOUT_IMMEDIATE)
                .await
                .map_err(|source| SandboxServiceError::ContainerStop {
                    name: name.clone(),
                    sandbox_id: sandbox_id.clone(),
                    source,
                })?;

            // the infra container goes with the sandbox's storage container
            if container.role() == ContainerRole::Regular {
                match self.subsystems.storage.stop_container(container.id()).await
                {
                    Ok(()) => {}
                    Err(StorageError::ContainerUnknown { .. }) => warn!(
                        "container {} already removed from storage",
                        container.id()
                    ),
                    Err(e) => teardown.warn(
                        TeardownStep::ContainerStorageStop,
                        container.id(),
                        format!(
                            "failed to stop container {name} in pod sandbox {sandbox_id}: {e}"
                        ),
                    ),
                }
            }
        }

        if let Err(e) = self.container_state_to_disk(container).await {
            teardown.warn(TeardownStep::ContainerStateToDisk, container.id(), e);
        }

        Ok(teardown)
    }

    /// Unmounts the sandbox private shm. The host's shm is shared with every
    /// other process and stays mounted.
    fn unmount_shm(&self, sandbox: &Sandbox) -> Result<()> {
        let shm_path = sandbox.shm_path();
        if shm_path.as_os_str().is_empty()
            || shm_path == self.config.default_shm_path
        {
            return Ok(());
        }

        let mounts = self.subsystems.mounts.as_ref();
        // /var/run is commonly a symlink to /run
        let resolved = mounts
            .follow_symlink_in_scope(shm_path, Path::new("/"))
            .map_err(|source| SandboxServiceError::ShmResolve {
                path: shm_path.to_path_buf(),
                sandbox_id: sandbox.id().to_string(),
                source,
            })?;

        match mounts.is_mounted(&resolved) {
            Ok(true) => mounts.force_unmount(&resolved).map_err(|source| {
                SandboxServiceError::ShmUnmount {
                    path: resolved.clone(),
                    sandbox_id: sandbox.id().to_string(),
                    source,
                }
            }),
            Ok(false) => Ok(()),
            Err(e) => {
                debug!(
                    "could not check whether {} is mounted, skipping: {e}",
                    resolved.display()
                );
                Ok(())
            }
        }
    }
}
