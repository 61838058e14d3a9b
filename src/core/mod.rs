//! Core sidecar types: the shared configuration slot and the poll loop.

mod builder;
mod config_handle;
mod poller;
mod sidecar;

pub use builder::SidecarBuilder;
pub use config_handle::{ConfigPublisher, LatestConfig};
pub use poller::{DEFAULT_BACKOFF, Poller, PollerExit, PollerHandle};
pub use sidecar::Sidecar;
