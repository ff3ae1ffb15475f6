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

#![allow(dead_code)]

use sandboxd::cri::{
    CanPull, Container, ContainerRuntime, ContainerStatus, HostportManager,
    ImageRecord, ImageStore, NetworkManager, PodPortMapping, PreparedImage,
    PullOptions, RuntimeStorage, StorageError,
};
use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};

/// Every call made to any of the recorders, in order.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    pub fn push(&self, call: String) {
        self.0.lock().expect("calls").push(call);
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().expect("calls").clone()
    }

    pub fn index_of(&self, call: &str) -> usize {
        self.all()
            .iter()
            .position(|c| c == call)
            .unwrap_or_else(|| panic!("{call} was never made"))
    }

    pub fn made(&self, call: &str) -> bool {
        self.all().iter().any(|c| c == call)
    }
}

/// Network, hostport, runtime and storage in one recorder. The network side
/// fails every teardown, as it does after a node reboot.
#[derive(Debug, Default)]
pub struct Node {
    pub calls: Calls,
    pub broken_network: bool,
}

#[tonic::async_trait]
impl NetworkManager for Node {
    async fn set_up_pod(
        &self,
        _net_ns_path: &str,
        _namespace: &str,
        _name: &str,
        id: &str,
    ) -> anyhow::Result<()> {
        self.calls.push(format!("set_up_pod {id}"));
        Ok(())
    }

    async fn tear_down_pod(
        &self,
        _net_ns_path: &str,
        _namespace: &str,
        _name: &str,
        id: &str,
    ) -> anyhow::Result<()> {
        self.calls.push(format!("tear_down_pod {id}"));
        if self.broken_network {
            anyhow::bail!("netns of {id} is gone");
        }
        Ok(())
    }

    async fn get_container_network_status(
        &self,
        _net_ns_path: &str,
        _namespace: &str,
        id: &str,
        _name: &str,
    ) -> anyhow::Result<String> {
        self.calls.push(format!("get_container_network_status {id}"));
        Ok("10.88.0.2".to_string())
    }
}

#[tonic::async_trait]
impl HostportManager for Node {
    async fn add(
        &self,
        sandbox_id: &str,
        _mapping: &PodPortMapping,
        interface: &str,
    ) -> anyhow::Result<()> {
        self.calls.push(format!("hostport_add {sandbox_id} {interface}"));
        Ok(())
    }

    async fn remove(
        &self,
        sandbox_id: &str,
        _mapping: &PodPortMapping,
    ) -> anyhow::Result<()> {
        self.calls.push(format!("hostport_remove {sandbox_id}"));
        if self.broken_network {
            anyhow::bail!("no chain for {sandbox_id}");
        }
        Ok(())
    }
}

#[tonic::async_trait]
impl ContainerRuntime for Node {
    async fn update_status(
        &self,
        container: &mut Container,
    ) -> anyhow::Result<()> {
        self.calls.push(format!("update_status {}", container.id()));
        if container.state().status != ContainerStatus::Stopped {
            container.state_mut().status = ContainerStatus::Running;
        }
        Ok(())
    }

    async fn stop_container(
        &self,
        container: &mut Container,
        timeout: i64,
    ) -> anyhow::Result<()> {
        self.calls.push(format!("stop {} {timeout}", container.id()));
        container.state_mut().stop(137);
        Ok(())
    }
}

#[tonic::async_trait]
impl RuntimeStorage for Node {
    async fn stop_container(&self, id: &str) -> Result<(), StorageError> {
        self.calls.push(format!("storage_stop {id}"));
        Ok(())
    }
}

/// A registry with one image and a local store that may hold a copy of it.
#[derive(Debug, Default)]
pub struct Registry {
    pub calls: Calls,
    pub remote_digest: String,
    pub local: Mutex<HashMap<String, ImageRecord>>,
}

#[tonic::async_trait]
impl ImageStore for Registry {
    async fn can_pull(&self, image: &str, _options: &PullOptions) -> CanPull {
        self.calls.push(format!("can_pull {image}"));
        CanPull::allowed()
    }

    async fn image_status(&self, image: &str) -> anyhow::Result<ImageRecord> {
        self.calls.push(format!("image_status {image}"));
        self.local
            .lock()
            .expect("local")
            .get(image)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("{image}: image not known"))
    }

    async fn prepare_image(
        &self,
        image: &str,
        _options: &PullOptions,
    ) -> anyhow::Result<PreparedImage> {
        self.calls.push(format!("prepare_image {image}"));
        Ok(PreparedImage { config_digest: self.remote_digest.clone() })
    }

    async fn pull_image(
        &self,
        image: &str,
        _options: &PullOptions,
    ) -> anyhow::Result<ImageRecord> {
        self.calls.push(format!("pull_image {image}"));
        let record = ImageRecord {
            id: self.remote_digest.trim_start_matches("sha256:").to_string(),
            names: vec![image.to_string()],
            config_digest: self.remote_digest.clone(),
        };
        let _ = self
            .local
            .lock()
            .expect("local")
            .insert(image.to_string(), record.clone());
        Ok(record)
    }
}

/// Scratch directory removed on drop.
#[derive(Debug)]
pub struct Scratch(pub PathBuf);

impl Scratch {
    pub fn new(name: &str) -> Self {
        let dir = std::env::temp_dir()
            .join(format!("sandboxd-{name}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        Self(dir)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}
