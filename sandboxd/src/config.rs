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

use clap::Args;
use std::{
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
};

/// The host-wide shared memory mount. Never unmounted on sandbox stop.
pub const DEFAULT_SHM_PATH: &str = "/dev/shm";
/// Where terminal container state is written.
pub const DEFAULT_CONTAINER_STATE_DIR: &str = "/var/run/sandboxd/containers";
/// Interface handed to the hostport manager when mappings are added.
pub const DEFAULT_HOSTPORT_INTERFACE: &str = "lo";

/// Runtime options for the sandbox orchestration core.
///
/// Meant to be flattened into the [clap::Parser] of whatever daemon embeds
/// the core, so every field is also a command line flag.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Address reported as the pod IP for host-network sandboxes.
    #[clap(long, value_parser, default_value = "127.0.0.1")]
    pub bind_address: IpAddr,
    /// Shared memory path that belongs to the host and is never unmounted.
    #[clap(long, value_parser, default_value = DEFAULT_SHM_PATH)]
    pub default_shm_path: PathBuf,
    /// Directory for persisted container state.
    #[clap(long, value_parser, default_value = DEFAULT_CONTAINER_STATE_DIR)]
    pub container_state_dir: PathBuf,
    /// Interface hostport mappings are bound to.
    #[clap(long, value_parser, default_value = DEFAULT_HOSTPORT_INTERFACE)]
    pub hostport_interface: String,
    /// Toggle verbosity. Default false
    #[clap(short, long)]
    pub verbose: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            default_shm_path: PathBuf::from(DEFAULT_SHM_PATH),
            container_state_dir: PathBuf::from(DEFAULT_CONTAINER_STATE_DIR),
            hostport_interface: DEFAULT_HOSTPORT_INTERFACE.to_string(),
            verbose: false,
        }
    }
}
