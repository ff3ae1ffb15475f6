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

use std::{
    collections::HashSet,
    fmt::Debug,
    sync::{Mutex, PoisonError},
};
use thiserror::Error;
use tracing::trace;

pub trait LabelReleaser: Send + Sync + Debug {
    fn release_label(&self, label: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("mcs level '{level}' is already in use")]
    InUse { level: String },
}

/// Reservation table of the MCS levels handed out to sandboxes.
///
/// A process label has the form `user:role:type:level`; only the level is
/// unique per sandbox.
#[derive(Debug, Default)]
pub struct McsLabels {
    reserved: Mutex<HashSet<String>>,
}

impl McsLabels {
    pub fn reserve(&self, label: &str) -> Result<(), LabelError> {
        let Some(level) = mcs_level(label) else {
            return Ok(());
        };
        let mut reserved =
            self.reserved.lock().unwrap_or_else(PoisonError::into_inner);
        if !reserved.insert(level.to_string()) {
            return Err(LabelError::InUse { level: level.to_string() });
        }
        Ok(())
    }

    pub fn is_reserved(&self, label: &str) -> bool {
        mcs_level(label).map_or(false, |level| {
            self.reserved
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(level)
        })
    }
}

impl LabelReleaser for McsLabels {
    fn release_label(&self, label: &str) -> anyhow::Result<()> {
        if let Some(level) = mcs_level(label) {
            let released = self
                .reserved
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(level);
            trace!("release mcs level {level}: was reserved={released}");
        }
        Ok(())
    }
}

fn mcs_level(label: &str) -> Option<&str> {
    label.splitn(4, ':').nth(3).filter(|level| !level.is_empty())
}
