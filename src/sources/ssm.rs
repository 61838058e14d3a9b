//! AWS Systems Manager Parameter Store source.

use super::ParameterStore;
use crate::error::{Result, SidecarError};
use async_trait::async_trait;
use aws_sdk_ssm::Client;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::operation::get_parameters::GetParametersOutput;
use std::collections::HashMap;

/// Parameter store backed by AWS SSM `GetParameters`.
///
/// # Examples
///
/// ```rust,no_run
/// use appconfig_sidecar::sources::SsmParameterStore;
///
/// # async fn example() {
/// let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
/// let store = SsmParameterStore::new(&sdk_config);
/// # }
/// ```
pub struct SsmParameterStore {
    client: Client,
}

impl SsmParameterStore {
    /// Create a store from a loaded SDK configuration.
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::from_client(Client::new(sdk_config))
    }

    /// Create a store around an existing SSM client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get_parameters(&self, names: &[String]) -> Result<HashMap<String, String>> {
        let output = self
            .client
            .get_parameters()
            .set_names(Some(names.to_vec()))
            .send()
            .await
            .map_err(|e| SidecarError::LookupError(DisplayErrorContext(&e).to_string()))?;

        Ok(parameter_values(&output))
    }

    fn name(&self) -> String {
        "ssm".to_string()
    }
}

/// Key returned values by name; `GetParameters` does not preserve request
/// order. Unknown names are logged and left out.
fn parameter_values(output: &GetParametersOutput) -> HashMap<String, String> {
    if !output.invalid_parameters().is_empty() {
        tracing::warn!(
            invalid = ?output.invalid_parameters(),
            "Parameter store reported unknown names"
        );
    }

    output
        .parameters()
        .iter()
        .filter_map(|p| Some((p.name()?.to_string(), p.value()?.to_string())))
        .collect()
}
