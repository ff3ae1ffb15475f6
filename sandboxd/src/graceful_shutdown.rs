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

use crate::cri::RuntimeService;
use std::io;
use tokio::{
    signal::unix::{signal, SignalKind},
    sync::watch::{channel, Receiver, Sender},
};
use tracing::info;

/// Stops every sandbox once the daemon is asked to exit.
#[derive(Debug)]
pub struct GracefulShutdown {
    runtime_service: RuntimeService,
    shutdown_broadcaster: Sender<()>,
}

impl GracefulShutdown {
    pub fn new(runtime_service: RuntimeService) -> Self {
        let (tx, _) = channel(());
        Self { runtime_service, shutdown_broadcaster: tx }
    }

    /// Holders of the receiver get notified before sandboxes are stopped and
    /// delay the sweep until they drop it.
    pub fn subscribe(&self) -> Receiver<()> {
        self.shutdown_broadcaster.subscribe()
    }

    /// Runs [GracefulShutdown::shutdown] on the first SIGTERM or SIGINT.
    pub async fn wait(self) -> io::Result<()> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }

        self.shutdown().await;
        Ok(())
    }

    /// Notifies subscribers, waits until every one of them is gone and then
    /// stops all pod sandboxes.
    pub async fn shutdown(self) {
        let _ = self.shutdown_broadcaster.send_replace(());
        self.shutdown_broadcaster.closed().await;

        self.runtime_service.stop_all_pod_sandboxes().await;
    }
}
