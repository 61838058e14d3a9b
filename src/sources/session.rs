//! Configuration session contract and session start-up.

use crate::error::{Result, SidecarError};
use crate::sources::ResolvedParameters;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::time::Duration;

/// Minimum poll interval requested when opening a session.
///
/// This is a hint to the service; the poll loop always honours whatever
/// interval the service actually returns.
pub const DEFAULT_MIN_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Opaque token identifying the caller's position in the configuration stream.
///
/// Every successful poll consumes the current token and yields the next one.
/// The type is intentionally not `Clone`: the poll loop owns the one current
/// token and replaces it by move.
#[derive(PartialEq, Eq)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    /// Wrap a token issued by the configuration service.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for sending back to the service.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContinuationToken").field(&self.0).finish()
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request sent when opening a configuration session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Application identifier.
    pub application_id: String,
    /// Configuration profile identifier.
    pub configuration_profile_id: String,
    /// Environment identifier.
    pub environment_id: String,
    /// Requested floor for the server-directed poll interval.
    pub min_poll_interval: Duration,
}

/// Outcome of one successful poll exchange.
#[derive(Debug)]
pub struct PollResponse {
    /// Token to present on the next poll.
    pub next_token: ContinuationToken,
    /// New configuration, or empty if nothing changed since the last poll.
    pub configuration: Bytes,
    /// How long to wait before polling again.
    pub next_poll_interval: Duration,
}

/// Trait for remote configuration-session services.
#[async_trait]
pub trait ConfigurationService: Send + Sync {
    /// Open a session and return the initial continuation token.
    ///
    /// # Errors
    ///
    /// Returns [`SidecarError::SessionError`] on transport failure or when the
    /// service rejects the identifiers.
    async fn start_session(&self, request: &SessionRequest) -> Result<ContinuationToken>;

    /// Exchange `token` for the latest configuration and the next token.
    ///
    /// # Errors
    ///
    /// Returns [`SidecarError::PollError`] on transport or service failure.
    async fn get_latest_configuration(&self, token: &ContinuationToken) -> Result<PollResponse>;

    /// Get a human-readable name for this service (for logging/debugging).
    fn name(&self) -> String;
}

/// Open the configuration session for `params`.
///
/// The parameters are consumed; only the returned token outlives this call.
/// Call this once per process: there is no close contract with the service,
/// so a second call silently abandons the first session.
///
/// # Errors
///
/// Returns [`SidecarError::SessionError`] if the service rejects the request.
pub async fn start_session(
    service: &dyn ConfigurationService,
    params: ResolvedParameters,
    min_poll_interval: Duration,
) -> Result<ContinuationToken> {
    let request = SessionRequest {
        application_id: params.application_id,
        configuration_profile_id: params.configuration_profile_id,
        environment_id: params.environment_id,
        min_poll_interval,
    };

    let token = service.start_session(&request).await.map_err(|e| match e {
        SidecarError::SessionError(_) => e,
        other => SidecarError::SessionError(other.to_string()),
    })?;

    tracing::info!(
        service = %service.name(),
        min_poll_interval_secs = min_poll_interval.as_secs(),
        "Started configuration session"
    );
    tracing::debug!(token = %token, "Initial configuration token");

    Ok(token)
}
