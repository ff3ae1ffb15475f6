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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    #[default]
    Created,
    Running,
    Paused,
    Stopped,
    Unknown,
}

/// Last known runtime state of a container, as persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContainerState {
    pub status: ContainerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ContainerState {
    pub fn running(pid: i32) -> Self {
        Self {
            status: ContainerStatus::Running,
            pid: Some(pid),
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Marks the state terminal, keeping pid and start time.
    pub fn stop(&mut self, exit_code: i32) {
        self.status = ContainerStatus::Stopped;
        self.exit_code = Some(exit_code);
        self.finished_at = Some(Utc::now());
    }
}

/// Infra containers own the namespaces of their sandbox and are torn down
/// together with the sandbox's storage container, never on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRole {
    Infra,
    Regular,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    id: String,
    name: String,
    sandbox_id: String,
    role: ContainerRole,
    state: ContainerState,
}

impl Container {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        sandbox_id: impl Into<String>,
        role: ContainerRole,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sandbox_id: sandbox_id.into(),
            role,
            state: ContainerState::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sandbox_id(&self) -> &str {
        &self.sandbox_id
    }

    pub fn role(&self) -> ContainerRole {
        self.role
    }

    pub fn state(&self) -> &ContainerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ContainerState {
        &mut self.state
    }

    pub fn with_state(mut self, state: ContainerState) -> Self {
        self.state = state;
        self
    }
}
