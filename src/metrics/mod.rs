//! Built-in metrics for the poll loop.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Poll attempts and their outcome (success, failure, cancelled)
//! - Poll duration
//! - Configuration updates
//! - Configuration age
//!
//! # Examples
//!
//! ```rust,no_run
//! use appconfig_sidecar::prelude::*;
//! use opentelemetry::global;
//!
//! # fn example(builder: SidecarBuilder) -> SidecarBuilder {
//! let meter = global::meter("appconfig-sidecar");
//! builder.with_metrics(meter)
//! # }
//! ```

mod poll_metrics;

pub use poll_metrics::{PollMetrics, PollTimer};
