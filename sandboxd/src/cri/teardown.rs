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

use std::fmt::Display;
use tracing::warn;

/// The best-effort steps of a sandbox teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    HostportRemove,
    NetworkTeardown,
    ContainerStorageStop,
    SandboxStorageStop,
    ContainerStateToDisk,
}

/// A failure that was logged instead of returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownWarning {
    pub step: TeardownStep,
    /// Sandbox or container the step acted on.
    pub subject: String,
    pub message: String,
}

/// Outcome of a teardown that may only partially succeed.
///
/// Hard failures never end up here; they are returned as errors by the
/// caller. What is collected here already went to the log at `warn`.
#[derive(Debug, Default)]
#[must_use]
pub struct Teardown {
    warnings: Vec<TeardownWarning>,
}

impl Teardown {
    pub(crate) fn warn(
        &mut self,
        step: TeardownStep,
        subject: impl Into<String>,
        error: impl Display,
    ) {
        let subject = subject.into();
        let message = error.to_string();
        warn!("{step:?} for {subject}: {message}");
        self.warnings.push(TeardownWarning { step, subject, message });
    }

    pub(crate) fn merge(&mut self, other: Teardown) {
        self.warnings.extend(other.warnings);
    }

    pub fn warnings(&self) -> &[TeardownWarning] {
        &self.warnings
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Steps that produced a warning, in the order they ran.
    pub fn steps(&self) -> Vec<TeardownStep> {
        self.warnings.iter().map(|w| w.step).collect()
    }
}
