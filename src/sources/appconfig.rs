//! AWS AppConfig Data configuration-session service.

use super::{ConfigurationService, ContinuationToken, PollResponse, SessionRequest};
use crate::error::{Result, SidecarError};
use async_trait::async_trait;
use aws_sdk_appconfigdata::Client;
use aws_sdk_appconfigdata::error::DisplayErrorContext;
use aws_sdk_appconfigdata::operation::get_latest_configuration::GetLatestConfigurationOutput;
use aws_sdk_appconfigdata::operation::start_configuration_session::StartConfigurationSessionOutput;
use bytes::Bytes;
use std::time::Duration;

/// Configuration service backed by AWS AppConfig Data.
///
/// # Examples
///
/// ```rust,no_run
/// use appconfig_sidecar::sources::AppConfigDataService;
///
/// # async fn example() {
/// let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
/// let service = AppConfigDataService::new(&sdk_config);
/// # }
/// ```
pub struct AppConfigDataService {
    client: Client,
}

impl AppConfigDataService {
    /// Create a service from a loaded SDK configuration.
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::from_client(Client::new(sdk_config))
    }

    /// Create a service around an existing AppConfig Data client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfigurationService for AppConfigDataService {
    async fn start_session(&self, request: &SessionRequest) -> Result<ContinuationToken> {
        let min_interval = i32::try_from(request.min_poll_interval.as_secs()).unwrap_or(i32::MAX);

        let output = self
            .client
            .start_configuration_session()
            .application_identifier(&request.application_id)
            .configuration_profile_identifier(&request.configuration_profile_id)
            .environment_identifier(&request.environment_id)
            .required_minimum_poll_interval_in_seconds(min_interval)
            .send()
            .await
            .map_err(|e| SidecarError::SessionError(DisplayErrorContext(&e).to_string()))?;

        initial_token(&output)
    }

    async fn get_latest_configuration(&self, token: &ContinuationToken) -> Result<PollResponse> {
        let output = self
            .client
            .get_latest_configuration()
            .configuration_token(token.as_str())
            .send()
            .await
            .map_err(|e| SidecarError::PollError(DisplayErrorContext(&e).to_string()))?;

        poll_response(&output)
    }

    fn name(&self) -> String {
        "appconfigdata".to_string()
    }
}

fn initial_token(output: &StartConfigurationSessionOutput) -> Result<ContinuationToken> {
    output
        .initial_configuration_token()
        .map(ContinuationToken::new)
        .ok_or_else(|| SidecarError::SessionError("response carried no initial token".to_string()))
}

/// Map a poll response. A missing blob is "no change"; a negative interval
/// means poll again immediately.
fn poll_response(output: &GetLatestConfigurationOutput) -> Result<PollResponse> {
    let next_token = output
        .next_poll_configuration_token()
        .map(ContinuationToken::new)
        .ok_or_else(|| SidecarError::PollError("response carried no next token".to_string()))?;

    let configuration = output
        .configuration()
        .map(|blob| Bytes::copy_from_slice(blob.as_ref()))
        .unwrap_or_default();

    let interval_secs = u64::try_from(output.next_poll_interval_in_seconds()).unwrap_or(0);

    Ok(PollResponse {
        next_token,
        configuration,
        next_poll_interval: Duration::from_secs(interval_secs),
    })
}
