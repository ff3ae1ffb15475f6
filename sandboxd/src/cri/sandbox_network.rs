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
    error::{Result, SandboxServiceError},
    runtime_service::RuntimeService,
    sandbox::Sandbox,
    teardown::{Teardown, TeardownStep},
};
use std::net::{IpAddr, Ipv4Addr};
use tracing::debug;

impl RuntimeService {
    /// Attaches the sandbox to the pod network and returns its IP.
    ///
    /// Host-network sandboxes get the configured bind address without any
    /// network work. The IP is only looked up when host ports have to be
    /// mapped; otherwise the returned string is empty.
    pub async fn network_start(
        &self,
        host_network: bool,
        sandbox: &Sandbox,
    ) -> Result<String> {
        if host_network {
            return Ok(self.config.bind_address.to_string());
        }

        let net_ns_path = sandbox.net_ns_path();
        self.subsystems
            .network
            .set_up_pod(
                &net_ns_path,
                sandbox.namespace(),
                sandbox.kube_name(),
                sandbox.id(),
            )
            .await
            .map_err(|source| SandboxServiceError::NetworkSetup {
                name: sandbox.name().to_string(),
                sandbox_id: sandbox.id().to_string(),
                source,
            })?;

        if sandbox.port_mappings().is_empty() {
            return Ok(String::new());
        }

        let ip = self
            .subsystems
            .network
            .get_container_network_status(
                &net_ns_path,
                sandbox.namespace(),
                sandbox.id(),
                sandbox.name(),
            )
            .await
            .map_err(|source| SandboxServiceError::NetworkStatus {
                name: sandbox.name().to_string(),
                sandbox_id: sandbox.id().to_string(),
                source,
            })?;

        let ip4 = parse_ipv4(&ip).ok_or_else(|| {
            SandboxServiceError::InvalidPodIp {
                name: sandbox.name().to_string(),
                sandbox_id: sandbox.id().to_string(),
                ip: ip.clone(),
            }
        })?;

        self.subsystems
            .hostports
            .add(
                sandbox.id(),
                &sandbox.pod_port_mapping(Some(ip4)),
                &self.config.hostport_interface,
            )
            .await
            .map_err(|source| SandboxServiceError::HostportAdd {
                name: sandbox.name().to_string(),
                sandbox_id: sandbox.id().to_string(),
                source,
            })?;

        debug!("sandbox {} has ip {ip4}", sandbox.id());
        Ok(ip4.to_string())
    }

    /// Detaches the sandbox from the pod network.
    ///
    /// Never fails: the namespace or the plugin state may already be gone, so
    /// every failure is only recorded as a warning. Both steps are always
    /// attempted.
    pub async fn network_stop(
        &self,
        host_network: bool,
        sandbox: &Sandbox,
    ) -> Teardown {
        let mut teardown = Teardown::default();
        if host_network {
            return teardown;
        }

        if let Err(e) = self
            .subsystems
            .hostports
            .remove(sandbox.id(), &sandbox.pod_port_mapping(None))
            .await
        {
            teardown.warn(
                TeardownStep::HostportRemove,
                sandbox.id(),
                format!(
                    "failed to remove hostport for container {} in sandbox {}: {e}",
                    sandbox.name(),
                    sandbox.id()
                ),
            );
        }

        if let Err(e) = self
            .subsystems
            .network
            .tear_down_pod(
                &sandbox.net_ns_path(),
                sandbox.namespace(),
                sandbox.kube_name(),
                sandbox.id(),
            )
            .await
        {
            teardown.warn(
                TeardownStep::NetworkTeardown,
                sandbox.id(),
                format!(
                    "failed to destroy network for container {} in sandbox {}: {e}",
                    sandbox.name(),
                    sandbox.id()
                ),
            );
        }

        teardown
    }
}

/// Accepts dotted IPv4 and IPv4-mapped IPv6 (`::ffff:a.b.c.d`). Surrounding
/// whitespace is rejected.
fn parse_ipv4(ip: &str) -> Option<Ipv4Addr> {
    match ip.parse::<IpAddr>().ok()? {
        IpAddr::V4(ip4) => Some(ip4),
        IpAddr::V6(ip6) => ip6.to_ipv4_mapped(),
    }
}
