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
    sandbox::Sandbox,
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};

type Cache = HashMap<String, Arc<Mutex<Sandbox>>>;

/// Live sandboxes by id.
///
/// The map lock is only held to look up, insert or remove an entry. Work on
/// a sandbox happens under that sandbox's own mutex, so operations on
/// different sandboxes never wait on each other.
#[derive(Debug, Clone, Default)]
pub struct SandboxCache {
    cache: Arc<RwLock<Cache>>,
}

impl SandboxCache {
    pub async fn add(&self, sandbox: Sandbox) -> Result<()> {
        let sandbox_id = sandbox.id().to_string();
        let mut cache = self.cache.write().await;
        if cache.contains_key(&sandbox_id) {
            return Err(SandboxServiceError::SandboxExists { sandbox_id });
        }
        let _ = cache.insert(sandbox_id, Arc::new(Mutex::new(sandbox)));
        Ok(())
    }

    /// Looks a sandbox up by its full id or by a unique prefix of it.
    pub async fn get(&self, sandbox_id: &str) -> Result<Arc<Mutex<Sandbox>>> {
        if sandbox_id.is_empty() {
            return Err(SandboxServiceError::SandboxIdEmpty);
        }

        let cache = self.cache.read().await;
        if let Some(sandbox) = cache.get(sandbox_id) {
            return Ok(sandbox.clone());
        }

        let mut matches =
            cache.iter().filter(|(id, _)| id.starts_with(sandbox_id));
        match (matches.next(), matches.next()) {
            (Some((_, sandbox)), None) => Ok(sandbox.clone()),
            (Some(_), Some(_)) => {
                Err(SandboxServiceError::AmbiguousSandboxId {
                    prefix: sandbox_id.to_string(),
                })
            }
            (None, _) => Err(SandboxServiceError::SandboxNotFound {
                sandbox_id: sandbox_id.to_string(),
            }),
        }
    }

    pub async fn remove(&self, sandbox_id: &str) -> Result<()> {
        if self.cache.write().await.remove(sandbox_id).is_none() {
            return Err(SandboxServiceError::SandboxNotFound {
                sandbox_id: sandbox_id.to_string(),
            });
        }
        Ok(())
    }

    /// Snapshot of the current ids.
    pub async fn ids(&self) -> Vec<String> {
        self.cache.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}
