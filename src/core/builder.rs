//! Builder for assembling and starting a [`Sidecar`].

use crate::core::{DEFAULT_BACKOFF, LatestConfig, Poller, Sidecar};
use crate::error::{Result, SidecarError};
use crate::sources::{
    ConfigurationService, DEFAULT_MIN_POLL_INTERVAL, DEFAULT_PARAMETER_PREFIX, ParameterResolver,
    ParameterStore, Settings, start_session,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "metrics")]
use crate::metrics::PollMetrics;

/// Builder for constructing a running [`Sidecar`].
///
/// # Examples
///
/// ```rust,no_run
/// use appconfig_sidecar::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(
/// #     store: Arc<dyn ParameterStore>,
/// #     service: Arc<dyn ConfigurationService>,
/// # ) -> Result<()> {
/// let sidecar = Sidecar::builder()
///     .with_parameter_store(store)
///     .with_configuration_service(service)
///     .with_parameter_prefix("/myapp/appconfig")
///     .with_backoff(Duration::from_secs(10))
///     .start(CancellationToken::new())
///     .await?;
///
/// let config = sidecar.config();
/// # Ok(())
/// # }
/// ```
pub struct SidecarBuilder {
    parameter_store: Option<Arc<dyn ParameterStore>>,
    configuration_service: Option<Arc<dyn ConfigurationService>>,
    parameter_prefix: String,
    min_poll_interval: Duration,
    backoff: Duration,
    poll_timeout: Option<Duration>,
    #[cfg(feature = "metrics")]
    metrics: Option<PollMetrics>,
}

impl SidecarBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            parameter_store: None,
            configuration_service: None,
            parameter_prefix: DEFAULT_PARAMETER_PREFIX.to_string(),
            min_poll_interval: DEFAULT_MIN_POLL_INTERVAL,
            backoff: DEFAULT_BACKOFF,
            poll_timeout: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Take prefix, intervals and timeout from loaded [`Settings`].
    pub fn with_settings(self, settings: &Settings) -> Self {
        self.with_parameter_prefix(settings.parameter_prefix.clone())
            .with_min_poll_interval(settings.min_poll_interval())
            .with_backoff(settings.backoff())
            .with_poll_timeout(settings.poll_timeout())
    }

    /// Set the store the deployment parameters are read from.
    pub fn with_parameter_store(mut self, store: Arc<dyn ParameterStore>) -> Self {
        self.parameter_store = Some(store);
        self
    }

    /// Set the service the configuration session is opened against.
    pub fn with_configuration_service(mut self, service: Arc<dyn ConfigurationService>) -> Self {
        self.configuration_service = Some(service);
        self
    }

    /// Set the namespace prefix for the deployment parameters.
    pub fn with_parameter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.parameter_prefix = prefix.into();
        self
    }

    /// Set the minimum poll interval requested when opening the session.
    ///
    /// Default is 15 seconds. The service may ignore it.
    pub fn with_min_poll_interval(mut self, interval: Duration) -> Self {
        self.min_poll_interval = interval;
        self
    }

    /// Set the delay applied after a failed poll.
    ///
    /// Default is 10 seconds.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set an optional deadline on each poll call.
    ///
    /// Default is no deadline.
    pub fn with_poll_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Record poll metrics with `meter`.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(PollMetrics::new(meter));
        self
    }

    /// Resolve parameters, open the session and spawn the poll loop.
    ///
    /// The loop stops when `cancel` fires or [`Sidecar::shutdown`] is called.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A parameter store or configuration service was not provided
    /// - Parameter lookup fails
    /// - The session cannot be opened
    pub async fn start(self, cancel: CancellationToken) -> Result<Sidecar> {
        let store = self
            .parameter_store
            .ok_or(SidecarError::MissingComponent("parameter store"))?;
        let service = self
            .configuration_service
            .ok_or(SidecarError::MissingComponent("configuration service"))?;

        let params = ParameterResolver::new(store)
            .with_prefix(self.parameter_prefix)
            .resolve()
            .await?;

        let token = start_session(service.as_ref(), params, self.min_poll_interval).await?;

        let (publisher, config) = LatestConfig::channel();
        let poller = Poller::new(service, token, publisher)
            .with_backoff(self.backoff)
            .with_poll_timeout(self.poll_timeout);

        #[cfg(feature = "metrics")]
        let poller = match self.metrics {
            Some(metrics) => poller.with_metrics(metrics),
            None => poller,
        };

        let handle = poller.spawn(cancel);
        Ok(Sidecar::new(config, handle))
    }
}

impl Default for SidecarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = SidecarBuilder::new();
        assert_eq!(builder.parameter_prefix, "/moviesapp/appconfig");
        assert_eq!(builder.min_poll_interval, Duration::from_secs(15));
        assert_eq!(builder.backoff, Duration::from_secs(10));
        assert!(builder.poll_timeout.is_none());
    }

    #[test]
    fn test_builder_with_settings() {
        let settings = Settings {
            port: 8080,
            parameter_prefix: "/shop/appconfig".to_string(),
            min_poll_interval_secs: 60,
            backoff_secs: 2,
            poll_timeout_secs: Some(30),
        };

        let builder = SidecarBuilder::new().with_settings(&settings);

        assert_eq!(builder.parameter_prefix, "/shop/appconfig");
        assert_eq!(builder.min_poll_interval, Duration::from_secs(60));
        assert_eq!(builder.backoff, Duration::from_secs(2));
        assert_eq!(builder.poll_timeout, Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_start_without_store() {
        let result = SidecarBuilder::new().start(CancellationToken::new()).await;
        assert!(matches!(
            result,
            Err(SidecarError::MissingComponent("parameter store"))
        ));
    }
}
