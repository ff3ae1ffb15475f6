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

//! Recording fakes of every subsystem the core talks to.

use super::{
    container::{Container, ContainerStatus},
    image_store::{
        CanPull, ImageRecord, ImageStore, PreparedImage, PullOptions,
    },
    label::LabelReleaser,
    mount::MountOps,
    network::{HostportManager, NetworkManager, PodPortMapping},
    oci_runtime::{ContainerRuntime, RuntimeStorage, StorageError},
    RuntimeService, Subsystems,
};
use crate::RuntimeConfig;
use std::{
    collections::{HashMap, HashSet},
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

/// Calls across all fakes of one test, in the order they happened.
#[derive(Debug, Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn record(&self, call: impl Into<String>) {
        self.0.lock().expect("call log").push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().expect("call log").clone()
    }

    /// Number of calls whose name (before the first `:`) is `name`.
    pub fn count(&self, name: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.split(':').next() == Some(name))
            .count()
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls().iter().position(|c| c == call)
    }
}

/// Operations that should fail, keyed by `op` or `op:id`.
#[derive(Debug, Default)]
pub(crate) struct Failures(Mutex<HashSet<String>>);

impl Failures {
    pub fn fail(&self, key: impl Into<String>) {
        let _ = self.0.lock().expect("failures").insert(key.into());
    }

    fn should_fail(&self, op: &str, id: &str) -> bool {
        let failures = self.0.lock().expect("failures");
        failures.contains(op) || failures.contains(&format!("{op}:{id}"))
    }

    pub fn check(&self, op: &str, id: &str) -> anyhow::Result<()> {
        if self.should_fail(op, id) {
            anyhow::bail!("injected {op} failure");
        }
        Ok(())
    }

    pub fn check_io(&self, op: &str, id: &str) -> io::Result<()> {
        if self.should_fail(op, id) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected {op} failure"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeImageStore {
    pub log: CallLog,
    pub failures: Failures,
    pub stored: Mutex<HashMap<String, ImageRecord>>,
    /// Config digest of the remote image. `None` makes prepare fail.
    pub remote_digest: Mutex<Option<String>>,
    pub pulled_with: Mutex<Vec<PullOptions>>,
    /// Pull gate verdict as `(allowed, error)`. Unset means allowed.
    pub verdict: Mutex<Option<(bool, Option<&'static str>)>>,
}

impl FakeImageStore {
    pub fn with_stored(self, image: &str, config_digest: &str) -> Self {
        let _ = self.stored.lock().expect("stored").insert(
            image.to_string(),
            ImageRecord {
                id: format!("id-{config_digest}"),
                names: vec![image.to_string()],
                config_digest: config_digest.to_string(),
            },
        );
        self
    }

    pub fn set_verdict(&self, allowed: bool, error: Option<&'static str>) {
        *self.verdict.lock().expect("verdict") = Some((allowed, error));
    }

    pub fn with_remote(self, config_digest: &str) -> Self {
        *self.remote_digest.lock().expect("remote") =
            Some(config_digest.to_string());
        self
    }
}

#[tonic::async_trait]
impl ImageStore for FakeImageStore {
    async fn can_pull(&self, image: &str, _options: &PullOptions) -> CanPull {
        self.log.record(format!("can_pull:{image}"));
        match *self.verdict.lock().expect("verdict") {
            Some((allowed, error)) => CanPull {
                allowed,
                error: error.map(|e| anyhow::anyhow!("{e}")),
            },
            None => CanPull::allowed(),
        }
    }

    async fn image_status(&self, image: &str) -> anyhow::Result<ImageRecord> {
        self.log.record(format!("image_status:{image}"));
        self.stored
            .lock()
            .expect("stored")
            .get(image)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("image {image} not known"))
    }

    async fn prepare_image(
        &self,
        image: &str,
        _options: &PullOptions,
    ) -> anyhow::Result<PreparedImage> {
        self.log.record(format!("prepare_image:{image}"));
        self.remote_digest
            .lock()
            .expect("remote")
            .clone()
            .map(|config_digest| PreparedImage { config_digest })
            .ok_or_else(|| anyhow::anyhow!("registry unreachable"))
    }

    async fn pull_image(
        &self,
        image: &str,
        options: &PullOptions,
    ) -> anyhow::Result<ImageRecord> {
        self.log.record(format!("pull_image:{image}"));
        self.failures.check("pull_image", image)?;
        self.pulled_with.lock().expect("pulled").push(options.clone());

        let config_digest =
            self.remote_digest.lock().expect("remote").clone().unwrap_or_default();
        let record = ImageRecord {
            id: format!("id-{config_digest}"),
            names: vec![image.to_string()],
            config_digest,
        };
        let _ = self
            .stored
            .lock()
            .expect("stored")
            .insert(image.to_string(), record.clone());
        Ok(record)
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeNetwork {
    pub log: CallLog,
    pub failures: Failures,
    /// What the plugin reports as the pod IP.
    pub ip: Mutex<String>,
}

#[tonic::async_trait]
impl NetworkManager for FakeNetwork {
    async fn set_up_pod(
        &self,
        _net_ns_path: &str,
        _namespace: &str,
        _name: &str,
        id: &str,
    ) -> anyhow::Result<()> {
        self.log.record(format!("set_up_pod:{id}"));
        self.failures.check("set_up_pod", id)
    }

    async fn tear_down_pod(
        &self,
        _net_ns_path: &str,
        _namespace: &str,
        _name: &str,
        id: &str,
    ) -> anyhow::Result<()> {
        self.log.record(format!("tear_down_pod:{id}"));
        self.failures.check("tear_down_pod", id)
    }

    async fn get_container_network_status(
        &self,
        _net_ns_path: &str,
        _namespace: &str,
        id: &str,
        _name: &str,
    ) -> anyhow::Result<String> {
        self.log.record(format!("get_container_network_status:{id}"));
        self.failures.check("get_container_network_status", id)?;
        Ok(self.ip.lock().expect("ip").clone())
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeHostports {
    pub log: CallLog,
    pub failures: Failures,
    pub added: Mutex<Vec<(String, PodPortMapping, String)>>,
}

#[tonic::async_trait]
impl HostportManager for FakeHostports {
    async fn add(
        &self,
        sandbox_id: &str,
        mapping: &PodPortMapping,
        interface: &str,
    ) -> anyhow::Result<()> {
        self.log.record(format!("hostport_add:{sandbox_id}"));
        self.failures.check("hostport_add", sandbox_id)?;
        self.added.lock().expect("added").push((
            sandbox_id.to_string(),
            mapping.clone(),
            interface.to_string(),
        ));
        Ok(())
    }

    async fn remove(
        &self,
        sandbox_id: &str,
        _mapping: &PodPortMapping,
    ) -> anyhow::Result<()> {
        self.log.record(format!("hostport_remove:{sandbox_id}"));
        self.failures.check("hostport_remove", sandbox_id)
    }
}

/// Containers start out running and stay stopped once stopped.
#[derive(Debug, Default)]
pub(crate) struct FakeRuntime {
    pub log: CallLog,
    pub failures: Failures,
    pub stopped: Mutex<HashSet<String>>,
}

#[tonic::async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn update_status(
        &self,
        container: &mut Container,
    ) -> anyhow::Result<()> {
        self.log.record(format!("update_status:{}", container.id()));
        self.failures.check("update_status", container.id())?;

        let stopped =
            self.stopped.lock().expect("stopped").contains(container.id());
        let state = container.state_mut();
        if stopped {
            state.status = ContainerStatus::Stopped;
        } else if state.status != ContainerStatus::Stopped {
            state.status = ContainerStatus::Running;
        }
        Ok(())
    }

    async fn stop_container(
        &self,
        container: &mut Container,
        timeout: i64,
    ) -> anyhow::Result<()> {
        self.log.record(format!("stop_container:{}:{timeout}", container.id()));
        self.failures.check("stop_container", container.id())?;

        container.state_mut().stop(137);
        let _ = self
            .stopped
            .lock()
            .expect("stopped")
            .insert(container.id().to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeStorage {
    pub log: CallLog,
    pub failures: Failures,
    pub unknown: Mutex<HashSet<String>>,
}

impl FakeStorage {
    pub fn forget(&self, id: &str) {
        let _ = self.unknown.lock().expect("unknown").insert(id.to_string());
    }
}

#[tonic::async_trait]
impl RuntimeStorage for FakeStorage {
    async fn stop_container(&self, id: &str) -> Result<(), StorageError> {
        self.log.record(format!("storage_stop:{id}"));
        if self.unknown.lock().expect("unknown").contains(id) {
            return Err(StorageError::ContainerUnknown { id: id.to_string() });
        }
        self.failures.check("storage_stop", id)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeLabels {
    pub log: CallLog,
    pub failures: Failures,
}

impl LabelReleaser for FakeLabels {
    fn release_label(&self, label: &str) -> anyhow::Result<()> {
        self.log.record(format!("release_label:{label}"));
        self.failures.check("release_label", label)
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeMounts {
    pub log: CallLog,
    pub failures: Failures,
    pub mounted: Mutex<HashSet<PathBuf>>,
    pub symlinks: Mutex<HashMap<PathBuf, PathBuf>>,
    /// Bind files that are already gone.
    pub vanished: Mutex<HashSet<PathBuf>>,
}

impl FakeMounts {
    pub fn new(log: CallLog) -> Self {
        Self { log, ..Self::default() }
    }

    pub fn mount(&self, path: &Path) {
        let _ = self.mounted.lock().expect("mounted").insert(path.to_path_buf());
    }

    pub fn vanish(&self, path: &Path) {
        let _ =
            self.vanished.lock().expect("vanished").insert(path.to_path_buf());
    }

    pub fn link(&self, from: &Path, to: &Path) {
        let _ = self
            .symlinks
            .lock()
            .expect("symlinks")
            .insert(from.to_path_buf(), to.to_path_buf());
    }
}

impl MountOps for FakeMounts {
    fn follow_symlink_in_scope(
        &self,
        path: &Path,
        _root: &Path,
    ) -> io::Result<PathBuf> {
        self.log.record(format!("follow_symlink:{}", path.display()));
        self.failures.check_io("follow_symlink", &path.display().to_string())?;
        Ok(self
            .symlinks
            .lock()
            .expect("symlinks")
            .get(path)
            .cloned()
            .unwrap_or_else(|| path.to_path_buf()))
    }

    fn is_mounted(&self, path: &Path) -> io::Result<bool> {
        self.log.record(format!("is_mounted:{}", path.display()));
        self.failures.check_io("is_mounted", &path.display().to_string())?;
        Ok(self.mounted.lock().expect("mounted").contains(path))
    }

    fn force_unmount(&self, path: &Path) -> io::Result<()> {
        self.log.record(format!("force_unmount:{}", path.display()));
        self.failures.check_io("force_unmount", &path.display().to_string())?;
        let _ = self.mounted.lock().expect("mounted").remove(path);
        Ok(())
    }

    fn remove_bind_file(&self, path: &Path) -> io::Result<()> {
        self.log.record(format!("remove_bind_file:{}", path.display()));
        self.failures.check_io("remove_bind_file", &path.display().to_string())?;
        if !self.vanished.lock().expect("vanished").insert(path.to_path_buf()) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            ));
        }
        Ok(())
    }
}

/// A [RuntimeService] wired to fakes that all write to one [CallLog].
#[derive(Debug)]
pub(crate) struct Harness {
    pub log: CallLog,
    pub network: Arc<FakeNetwork>,
    pub hostports: Arc<FakeHostports>,
    pub runtime: Arc<FakeRuntime>,
    pub storage: Arc<FakeStorage>,
    pub labels: Arc<FakeLabels>,
    pub mounts: Arc<FakeMounts>,
    pub config: RuntimeConfig,
    pub service: RuntimeService,
}

impl Harness {
    pub fn new() -> Self {
        let log = CallLog::default();
        let network =
            Arc::new(FakeNetwork { log: log.clone(), ..Default::default() });
        let hostports =
            Arc::new(FakeHostports { log: log.clone(), ..Default::default() });
        let runtime =
            Arc::new(FakeRuntime { log: log.clone(), ..Default::default() });
        let storage =
            Arc::new(FakeStorage { log: log.clone(), ..Default::default() });
        let labels =
            Arc::new(FakeLabels { log: log.clone(), ..Default::default() });
        let mounts = Arc::new(FakeMounts::new(log.clone()));

        let config = RuntimeConfig {
            container_state_dir: std::env::temp_dir().join(format!(
                "sandboxd-state-{}",
                uuid::Uuid::new_v4()
            )),
            ..RuntimeConfig::default()
        };

        let service = RuntimeService::new(
            config.clone(),
            Subsystems {
                network: network.clone(),
                hostports: hostports.clone(),
                runtime: runtime.clone(),
                storage: storage.clone(),
                labels: labels.clone(),
                mounts: mounts.clone(),
            },
        );

        Self {
            log,
            network,
            hostports,
            runtime,
            storage,
            labels,
            mounts,
            config,
            service,
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.config.container_state_dir);
    }
}
