//! # appconfig-sidecar
//!
//! A sidecar that keeps one remote configuration stream fresh and serves it
//! over HTTP.
//!
//! ## Overview
//!
//! At startup the sidecar:
//! - resolves its application, configuration-profile and environment ids from
//!   a parameter store,
//! - opens a configuration session and receives an initial continuation token,
//! - spawns a supervised poll loop that trades the token for the latest
//!   configuration, rotating the token on every successful exchange,
//! - serves `/` (liveness) and `/config` (latest payload).
//!
//! The payload lives in a lock-free slot built on `arc-swap`: the poll loop is
//! its only writer and HTTP handlers read it without blocking.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use appconfig_sidecar::prelude::*;
//! use appconfig_sidecar::sources::{AppConfigDataService, SsmParameterStore};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
//! let cancel = CancellationToken::new();
//!
//! let sidecar = Sidecar::builder()
//!     .with_parameter_store(Arc::new(SsmParameterStore::new(&sdk_config)))
//!     .with_configuration_service(Arc::new(AppConfigDataService::new(&sdk_config)))
//!     .start(cancel.clone())
//!     .await?;
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! appconfig_sidecar::http::serve(listener, sidecar.config(), cancel).await?;
//! sidecar.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `aws` (default): SSM parameter store and AppConfig Data session service
//! - `metrics`: OpenTelemetry metrics for the poll loop

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod http;
pub mod sources;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{LatestConfig, PollerExit, Sidecar, SidecarBuilder};
    pub use crate::error::{Result, SidecarError};
    pub use crate::sources::{
        ConfigurationService, ContinuationToken, ParameterStore, ResolvedParameters, Settings,
    };
}
