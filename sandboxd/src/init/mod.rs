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

//! Process level setup for a daemon embedding the orchestration core.

pub use logging::LoggingError;

use crate::RuntimeConfig;
use tracing::info;

mod logging;

#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error("failed to create container state directory '{path}': {source}")]
    StateDir { path: String, source: std::io::Error },
}

/// Installs logging and prepares the directories the core writes to.
///
/// Must run once, before any service is constructed.
pub async fn init(config: &RuntimeConfig) -> Result<(), InitError> {
    logging::init(config.verbose)?;

    info!("Starting sandboxd");
    info!("Config: {config:#?}");

    tokio::fs::create_dir_all(&config.container_state_dir).await.map_err(
        |source| InitError::StateDir {
            path: config.container_state_dir.display().to_string(),
            source,
        },
    )?;

    Ok(())
}
