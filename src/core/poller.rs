//! The background poll loop and its supervisor.

use crate::core::ConfigPublisher;
use crate::error::{Result, SidecarError};
use crate::sources::{ConfigurationService, ContinuationToken};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "metrics")]
use crate::metrics::PollMetrics;

/// Delay before retrying a failed poll.
///
/// Fixed and unrelated to the interval the service hands out.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(10);

/// Exchanges the current continuation token for the latest configuration,
/// forever.
///
/// The poller owns the only [`ContinuationToken`] and the only
/// [`ConfigPublisher`]. Each successful exchange rotates the token and
/// publishes non-empty payloads; each failure leaves both untouched and waits
/// [`DEFAULT_BACKOFF`] (or the configured backoff) before retrying.
///
/// # Examples
///
/// ```rust,no_run
/// use appconfig_sidecar::core::{LatestConfig, Poller};
/// use appconfig_sidecar::sources::{ConfigurationService, ContinuationToken};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(service: Arc<dyn ConfigurationService>, token: ContinuationToken) {
/// let (publisher, config) = LatestConfig::channel();
/// let cancel = CancellationToken::new();
/// let handle = Poller::new(service, token, publisher).spawn(cancel.clone());
///
/// // ... serve `config` ...
///
/// handle.shutdown().await;
/// # }
/// ```
pub struct Poller {
    service: Arc<dyn ConfigurationService>,
    token: ContinuationToken,
    publisher: ConfigPublisher,
    backoff: Duration,
    poll_timeout: Option<Duration>,
    #[cfg(feature = "metrics")]
    metrics: Option<PollMetrics>,
}

impl Poller {
    /// Create a poller seeded with the session's initial token.
    pub fn new(
        service: Arc<dyn ConfigurationService>,
        token: ContinuationToken,
        publisher: ConfigPublisher,
    ) -> Self {
        Self {
            service,
            token,
            publisher,
            backoff: DEFAULT_BACKOFF,
            poll_timeout: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Set the delay applied after a failed poll.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Put a deadline on each poll call.
    ///
    /// Without one, a hung call stalls the loop until the transport gives up.
    /// An elapsed deadline is treated like any other poll failure. A zero
    /// deadline is the same as none.
    pub fn with_poll_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.poll_timeout = timeout.filter(|limit| !limit.is_zero());
        self
    }

    /// Record poll outcomes in `metrics`.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: PollMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The token the next poll will present.
    pub fn token(&self) -> &ContinuationToken {
        &self.token
    }

    /// Perform one exchange.
    ///
    /// On success the token is rotated, a non-empty payload is published and
    /// the server-directed wait is returned. On failure nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`SidecarError::PollError`] or [`SidecarError::PollTimeout`].
    pub async fn poll_once(&mut self) -> Result<Duration> {
        tracing::debug!("Retrieving latest configuration");

        #[cfg(feature = "metrics")]
        let timer = self.metrics.as_ref().map(PollMetrics::start_poll);

        let call = self.service.get_latest_configuration(&self.token);
        let result = match self.poll_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(SidecarError::PollTimeout(limit))),
            None => call.await,
        };

        #[cfg(feature = "metrics")]
        if let Some(timer) = timer {
            match &result {
                Ok(_) => timer.success(),
                Err(_) => timer.failure(),
            }
        }

        let response = result?;
        self.token = response.next_token;

        let len = response.configuration.len();
        if self.publisher.publish(response.configuration) {
            #[cfg(feature = "metrics")]
            if let Some(metrics) = &self.metrics {
                metrics.record_update();
            }
            tracing::info!(bytes = len, "New latest configuration retrieved");
        } else {
            tracing::debug!("Nothing changed, already using the latest configuration");
        }

        Ok(response.next_poll_interval)
    }

    /// Poll until `cancel` fires.
    ///
    /// Cancellation interrupts an in-flight call as well as any wait; an
    /// interrupted call leaves the token unchanged.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(
            service = %self.service.name(),
            backoff_secs = self.backoff.as_secs(),
            "Starting poll loop"
        );

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                outcome = self.poll_once() => outcome,
            };

            let wait = match outcome {
                Ok(interval) => {
                    tracing::debug!(interval_secs = interval.as_secs(), "Sleeping until next poll");
                    interval
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        backoff_secs = self.backoff.as_secs(),
                        "Poll failed, retrying after backoff"
                    );
                    self.backoff
                }
            };

            #[cfg(feature = "metrics")]
            if let Some(metrics) = &self.metrics {
                metrics.update_config_age();
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = sleep(wait) => {}
            }
        }
    }

    /// Run the loop on a supervised background task.
    ///
    /// The supervisor logs how the loop ended; a panic inside the loop is
    /// reported as [`PollerExit::Panicked`] instead of vanishing.
    pub fn spawn(self, cancel: CancellationToken) -> PollerHandle {
        let task = tokio::spawn(self.run(cancel.clone()));
        let supervisor = tokio::spawn(supervise(task));
        PollerHandle { cancel, supervisor }
    }
}

/// How the poll loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerExit {
    /// The cancellation token fired.
    Cancelled,
    /// The loop panicked; carries the panic message.
    Panicked(String),
    /// The task was aborted by the runtime (e.g. during runtime shutdown).
    Aborted,
}

/// Owner's handle to a spawned [`Poller`].
pub struct PollerHandle {
    cancel: CancellationToken,
    supervisor: JoinHandle<PollerExit>,
}

impl PollerHandle {
    /// Ask the loop to stop without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the loop has ended, for whatever reason.
    pub fn is_finished(&self) -> bool {
        self.supervisor.is_finished()
    }

    /// Wait for the loop to end on its own or through the shared token.
    pub async fn wait(self) -> PollerExit {
        self.supervisor.await.unwrap_or_else(exit_from_join_error)
    }

    /// Cancel the loop and wait for it to stop.
    pub async fn shutdown(self) -> PollerExit {
        self.cancel();
        self.wait().await
    }
}

async fn supervise(task: JoinHandle<()>) -> PollerExit {
    match task.await {
        Ok(()) => {
            tracing::info!("Poll loop stopped");
            PollerExit::Cancelled
        }
        Err(e) => {
            let exit = exit_from_join_error(e);
            tracing::error!(exit = ?exit, "Poll loop terminated unexpectedly");
            exit
        }
    }
}

fn exit_from_join_error(err: JoinError) -> PollerExit {
    if err.is_panic() {
        PollerExit::Panicked(panic_message(err.into_panic()))
    } else {
        PollerExit::Aborted
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
