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
    container::{Container, ContainerRole},
    mount::MountOps,
    netns::NetNs,
    network::{PodPortMapping, PortMapping},
};
use std::{
    collections::HashMap,
    net::Ipv4Addr,
    path::{Path, PathBuf},
};

#[derive(Debug)]
pub struct Sandbox {
    /// Runtime id of the sandbox, also the key in the [super::SandboxCache]
    /// and the id of the sandbox's own storage container.
    id: String,
    name: String,
    namespace: String,
    /// Pod name as known to the orchestrator above us.
    kube_name: String,

    /// `None` for host-network sandboxes.
    net_ns: Option<NetNs>,
    port_mappings: Vec<PortMapping>,

    /// Owned by this sandbox until released on stop.
    process_label: String,
    shm_path: PathBuf,

    /// The pause container holding the sandbox namespaces.
    infra_container: Container,

    /// Workloads running alongside the infra container.
    containers: HashMap<String, Container>,
}

impl Sandbox {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn kube_name(&self) -> &str {
        &self.kube_name
    }

    /// Empty when the sandbox shares the host network namespace.
    pub fn net_ns_path(&self) -> String {
        self.net_ns
            .as_ref()
            .map(|ns| ns.path().display().to_string())
            .unwrap_or_default()
    }

    pub fn net_ns(&self) -> Option<&NetNs> {
        self.net_ns.as_ref()
    }

    pub fn port_mappings(&self) -> &[PortMapping] {
        &self.port_mappings
    }

    pub fn process_label(&self) -> &str {
        &self.process_label
    }

    pub fn shm_path(&self) -> &Path {
        &self.shm_path
    }

    pub fn infra_container(&self) -> &Container {
        &self.infra_container
    }

    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.values()
    }

    pub fn add_container(&mut self, container: Container) {
        let _ = self.containers.insert(container.id().to_string(), container);
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        if id == self.infra_container.id() {
            return Some(&self.infra_container);
        }
        self.containers.get(id)
    }

    pub(crate) fn container_mut(&mut self, id: &str) -> Option<&mut Container> {
        if id == self.infra_container.id() {
            return Some(&mut self.infra_container);
        }
        self.containers.get_mut(id)
    }

    /// Ids of every container to stop, the infra container exactly once and
    /// last.
    pub(crate) fn teardown_order(&self) -> Vec<String> {
        let infra_id = self.infra_container.id();
        self.containers
            .keys()
            .filter(|id| id.as_str() != infra_id)
            .cloned()
            .chain(std::iter::once(infra_id.to_string()))
            .collect()
    }

    pub(crate) fn pod_port_mapping(&self, ip: Option<Ipv4Addr>) -> PodPortMapping {
        PodPortMapping {
            name: self.name.clone(),
            port_mappings: self.port_mappings.clone(),
            ip,
            host_network: false,
        }
    }

    /// Closes and removes the network namespace. No-op for host-network
    /// sandboxes and for namespaces that were already removed.
    pub(crate) fn net_ns_remove(
        &mut self,
        mounts: &dyn MountOps,
    ) -> std::io::Result<()> {
        match self.net_ns.as_mut() {
            Some(net_ns) => net_ns.remove(mounts),
            None => Ok(()),
        }
    }
}

#[derive(Debug)]
pub struct SandboxBuilder {
    id: String,
    name: String,
    namespace: String,
    kube_name: String,
    net_ns_path: String,
    port_mappings: Vec<PortMapping>,
    process_label: String,
    shm_path: PathBuf,
    infra_container_id: String,
    containers: Vec<Container>,
}

impl SandboxBuilder {
    /// Identity is fixed here. Everything else defaults to a host-network
    /// sandbox without port mappings using the host's shared memory.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        infra_container_id: impl Into<String>,
    ) -> SandboxBuilder {
        let name = name.into();
        SandboxBuilder {
            id: id.into(),
            kube_name: name.clone(),
            name,
            namespace: String::new(),
            net_ns_path: String::new(),
            port_mappings: vec![],
            process_label: String::new(),
            shm_path: PathBuf::from(crate::config::DEFAULT_SHM_PATH),
            infra_container_id: infra_container_id.into(),
            containers: vec![],
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn kube_name(mut self, kube_name: impl Into<String>) -> Self {
        self.kube_name = kube_name.into();
        self
    }

    /// An empty path selects host-network mode.
    pub fn net_ns_path(mut self, net_ns_path: impl Into<String>) -> Self {
        self.net_ns_path = net_ns_path.into();
        self
    }

    pub fn port_mappings(mut self, port_mappings: Vec<PortMapping>) -> Self {
        self.port_mappings = port_mappings;
        self
    }

    pub fn process_label(mut self, process_label: impl Into<String>) -> Self {
        self.process_label = process_label.into();
        self
    }

    pub fn shm_path(mut self, shm_path: impl Into<PathBuf>) -> Self {
        self.shm_path = shm_path.into();
        self
    }

    pub fn container(mut self, container: Container) -> Self {
        self.containers.push(container);
        self
    }

    pub fn build(self) -> Sandbox {
        let infra_container = Container::new(
            self.infra_container_id,
            format!("{}-infra", self.name),
            self.id.clone(),
            ContainerRole::Infra,
        );
        let net_ns = (!self.net_ns_path.is_empty())
            .then(|| NetNs::new(self.net_ns_path));

        let mut sandbox = Sandbox {
            id: self.id,
            name: self.name,
            namespace: self.namespace,
            kube_name: self.kube_name,
            net_ns,
            port_mappings: self.port_mappings,
            process_label: self.process_label,
            shm_path: self.shm_path,
            infra_container,
            containers: HashMap::new(),
        };
        for container in self.containers {
            sandbox.add_container(container);
        }
        sandbox
    }
}
