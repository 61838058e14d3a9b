//! A started sidecar: the configuration reader plus the running poll loop.

use crate::core::{LatestConfig, PollerExit, PollerHandle, SidecarBuilder};

/// A bootstrapped sidecar whose poll loop is running.
///
/// Created by [`SidecarBuilder::start`]. Hand [`Sidecar::config`] to the HTTP
/// surface and call [`Sidecar::shutdown`] when the process is stopping.
pub struct Sidecar {
    config: LatestConfig,
    poller: PollerHandle,
}

impl Sidecar {
    /// Create a new builder for assembling a sidecar.
    pub fn builder() -> SidecarBuilder {
        SidecarBuilder::new()
    }

    pub(crate) fn new(config: LatestConfig, poller: PollerHandle) -> Self {
        Self { config, poller }
    }

    /// A reader for the latest configuration.
    pub fn config(&self) -> LatestConfig {
        self.config.clone()
    }

    /// Whether the poll loop has ended.
    pub fn is_polling(&self) -> bool {
        !self.poller.is_finished()
    }

    /// Stop the poll loop and report how it ended.
    pub async fn shutdown(self) -> PollerExit {
        self.poller.shutdown().await
    }
}
