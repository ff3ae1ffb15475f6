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

use super::mount::MountOps;
use std::{
    io,
    path::{Path, PathBuf},
};
use tracing::debug;

/// A pinned (bind mounted) network namespace of a sandbox.
#[derive(Debug)]
pub struct NetNs {
    path: PathBuf,
    closed: bool,
}

impl NetNs {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), closed: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Unmounts and deletes the namespace bind file.
    ///
    /// Once this succeeds further calls do nothing, so teardown can be
    /// retried.
    pub fn remove(&mut self, mounts: &dyn MountOps) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }

        // /var/run is commonly a symlink to /run
        let resolved =
            mounts.follow_symlink_in_scope(&self.path, Path::new("/"))?;

        if mounts.is_mounted(&resolved)? {
            mounts.force_unmount(&resolved)?;
        }

        match mounts.remove_bind_file(&resolved) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("netns {} already removed", resolved.display());
            }
            Err(e) => return Err(e),
        }

        self.closed = true;
        Ok(())
    }
}
