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

//! Contracts of the pod network plugin and the host port manager.

use std::fmt::Debug;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Sctp,
}

/// A host visible port forwarded to a port of the sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub container_port: i32,
    pub host_port: i32,
    pub protocol: Protocol,
}

/// Everything the hostport manager needs to (un)map one sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodPortMapping {
    pub name: String,
    pub port_mappings: Vec<PortMapping>,
    /// Unset on removal, the manager tracks mappings by sandbox id.
    pub ip: Option<Ipv4Addr>,
    pub host_network: bool,
}

/// Attaches and detaches pod network namespaces (CNI or equivalent).
#[tonic::async_trait]
pub trait NetworkManager: Send + Sync + Debug {
    async fn set_up_pod(
        &self,
        net_ns_path: &str,
        namespace: &str,
        name: &str,
        id: &str,
    ) -> anyhow::Result<()>;

    async fn tear_down_pod(
        &self,
        net_ns_path: &str,
        namespace: &str,
        name: &str,
        id: &str,
    ) -> anyhow::Result<()>;

    /// Returns the IP assigned to the sandbox as a string. No format is
    /// guaranteed, callers parse it.
    async fn get_container_network_status(
        &self,
        net_ns_path: &str,
        namespace: &str,
        id: &str,
        name: &str,
    ) -> anyhow::Result<String>;
}

#[tonic::async_trait]
pub trait HostportManager: Send + Sync + Debug {
    async fn add(
        &self,
        sandbox_id: &str,
        mapping: &PodPortMapping,
        interface: &str,
    ) -> anyhow::Result<()>;

    async fn remove(
        &self,
        sandbox_id: &str,
        mapping: &PodPortMapping,
    ) -> anyhow::Result<()>;
}
