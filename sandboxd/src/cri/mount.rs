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

//! Host mount primitives used during teardown.

use nix::mount::{umount2, MntFlags};
use std::{
    collections::VecDeque,
    ffi::OsString,
    fmt::Debug,
    fs, io,
    path::{Component, Path, PathBuf},
};

/// Symlink hops allowed while resolving a single path.
const MAX_SYMLINK_HOPS: usize = 255;

pub trait MountOps: Send + Sync + Debug {
    /// Resolves every symlink in `path` as if `root` were `/`. The result
    /// never leaves `root`.
    fn follow_symlink_in_scope(
        &self,
        path: &Path,
        root: &Path,
    ) -> io::Result<PathBuf>;

    fn is_mounted(&self, path: &Path) -> io::Result<bool>;

    /// Lazy unmount: succeeds while the target is busy and detaches once the
    /// last reference is gone.
    fn force_unmount(&self, path: &Path) -> io::Result<()>;

    /// Deletes the file a namespace was bind mounted onto. `NotFound` is
    /// passed through for the caller to decide on.
    fn remove_bind_file(&self, path: &Path) -> io::Result<()>;
}

/// [MountOps] against the real host.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostMounts;

impl MountOps for HostMounts {
    fn follow_symlink_in_scope(
        &self,
        path: &Path,
        root: &Path,
    ) -> io::Result<PathBuf> {
        follow_symlink_in_scope(path, root)
    }

    fn is_mounted(&self, path: &Path) -> io::Result<bool> {
        let mounts = procfs::process::Process::myself()
            .and_then(|process| process.mountinfo())
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        Ok(mounts.into_iter().any(|mount| mount.mount_point == path))
    }

    fn force_unmount(&self, path: &Path) -> io::Result<()> {
        umount2(path, MntFlags::MNT_DETACH).map_err(io::Error::from)
    }

    fn remove_bind_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

pub fn follow_symlink_in_scope(path: &Path, root: &Path) -> io::Result<PathBuf> {
    let relative = path.strip_prefix(root).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not in {}", path.display(), root.display()),
        )
    })?;

    let mut resolved: Vec<OsString> = vec![];
    let mut pending: VecDeque<OsString> = components(relative).collect();
    let mut hops = 0;

    while let Some(part) = pending.pop_front() {
        if part == ".." {
            // clamps at root
            let _ = resolved.pop();
            continue;
        }

        let candidate = join(root, &resolved).join(&part);
        let is_symlink = match fs::symlink_metadata(&candidate) {
            Ok(meta) => meta.file_type().is_symlink(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e),
        };
        if !is_symlink {
            resolved.push(part);
            continue;
        }

        hops += 1;
        if hops > MAX_SYMLINK_HOPS {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("too many symlinks resolving {}", path.display()),
            ));
        }

        let target = fs::read_link(&candidate)?;
        if target.is_absolute() {
            resolved.clear();
        }
        let mut next: VecDeque<OsString> = components(&target).collect();
        next.extend(pending.drain(..));
        pending = next;
    }

    Ok(join(root, &resolved))
}

fn components(path: &Path) -> impl Iterator<Item = OsString> + '_ {
    path.components().filter_map(|component| match component {
        Component::Normal(part) => Some(part.to_os_string()),
        Component::ParentDir => Some(OsString::from("..")),
        Component::RootDir | Component::CurDir | Component::Prefix(_) => None,
    })
}

fn join(root: &Path, parts: &[OsString]) -> PathBuf {
    parts.iter().fold(root.to_path_buf(), |acc, part| acc.join(part))
}
