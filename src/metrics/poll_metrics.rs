//! Poll loop metrics using OpenTelemetry.

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::sync::Arc;
use std::time::Instant;

/// Metrics collector for the poll loop.
///
/// Tracks poll outcomes, poll latency, how often the configuration actually
/// changed and how stale it is. Every attempt ends in exactly one of
/// success, failure or cancelled.
///
/// # Examples
///
/// ```rust,no_run
/// use appconfig_sidecar::metrics::PollMetrics;
/// use opentelemetry::global;
///
/// let metrics = PollMetrics::new(global::meter("appconfig-sidecar"));
///
/// let timer = metrics.start_poll();
/// // ... exchange the token ...
/// timer.success();
/// ```
#[derive(Clone)]
pub struct PollMetrics {
    poll_attempts: Counter<u64>,
    poll_success: Counter<u64>,
    poll_failures: Counter<u64>,
    poll_cancelled: Counter<u64>,
    poll_duration: Histogram<f64>,
    config_updates: Counter<u64>,
    config_age_seconds: Gauge<i64>,
    last_update: Arc<parking_lot::Mutex<Instant>>,
}

impl PollMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let poll_attempts = meter
            .u64_counter("appconfig_sidecar.poll.attempts")
            .with_description("Total number of poll attempts")
            .build();

        let poll_success = meter
            .u64_counter("appconfig_sidecar.poll.success")
            .with_description("Number of successful polls")
            .build();

        let poll_failures = meter
            .u64_counter("appconfig_sidecar.poll.failures")
            .with_description("Number of failed polls")
            .build();

        let poll_cancelled = meter
            .u64_counter("appconfig_sidecar.poll.cancelled")
            .with_description("Number of polls dropped in flight by shutdown")
            .build();

        let poll_duration = meter
            .f64_histogram("appconfig_sidecar.poll.duration")
            .with_description("Duration of poll calls in seconds")
            .with_unit("s")
            .build();

        let config_updates = meter
            .u64_counter("appconfig_sidecar.config.updates")
            .with_description("Number of polls that delivered new configuration")
            .build();

        let config_age_seconds = meter
            .i64_gauge("appconfig_sidecar.config.age")
            .with_description("Time since the configuration last changed in seconds")
            .with_unit("s")
            .build();

        Self {
            poll_attempts,
            poll_success,
            poll_failures,
            poll_cancelled,
            poll_duration,
            config_updates,
            config_age_seconds,
            last_update: Arc::new(parking_lot::Mutex::new(Instant::now())),
        }
    }

    /// Count a poll attempt and start its timer.
    ///
    /// Settle the returned timer with [`PollTimer::success`] or
    /// [`PollTimer::failure`]; dropping it unsettled counts the attempt as
    /// cancelled.
    pub fn start_poll(&self) -> PollTimer {
        self.poll_attempts.add(1, &[]);
        PollTimer {
            metrics: self.clone(),
            start: Instant::now(),
            settled: false,
        }
    }

    /// Record that a poll delivered a new payload.
    pub fn record_update(&self) {
        self.config_updates.add(1, &[]);
        *self.last_update.lock() = Instant::now();
    }

    /// Update the configuration age gauge.
    pub fn update_config_age(&self) {
        let age_secs = self.last_update.lock().elapsed().as_secs() as i64;
        self.config_age_seconds.record(age_secs, &[]);
    }
}

/// An in-flight poll attempt.
#[must_use = "an unsettled timer records the poll as cancelled"]
pub struct PollTimer {
    metrics: PollMetrics,
    start: Instant,
    settled: bool,
}

impl PollTimer {
    /// Record a successful poll.
    pub fn success(mut self) {
        self.settle(true);
    }

    /// Record a failed poll.
    pub fn failure(mut self) {
        self.settle(false);
    }

    fn settle(&mut self, ok: bool) {
        let counter = if ok {
            &self.metrics.poll_success
        } else {
            &self.metrics.poll_failures
        };
        counter.add(1, &[]);
        self.metrics
            .poll_duration
            .record(self.start.elapsed().as_secs_f64(), &[]);
        self.settled = true;
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        if !self.settled {
            self.metrics.poll_cancelled.add(1, &[]);
        }
    }
}
