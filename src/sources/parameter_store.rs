//! Deployment parameter lookup.

use crate::error::{Result, SidecarError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Namespace the three deployment parameters live under by default.
pub const DEFAULT_PARAMETER_PREFIX: &str = "/moviesapp/appconfig";

const APPLICATION_ID_KEY: &str = "application-id";
const CONFIGURATION_PROFILE_ID_KEY: &str = "configuration-profile-id";
const ENVIRONMENT_ID_KEY: &str = "environment-id";

/// Trait for key/value parameter stores.
///
/// Implementations perform a single batched read. Names the store does not
/// know are simply left out of the returned map; the resolver decides what a
/// missing name means.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Look up all `names` in one request.
    ///
    /// # Errors
    ///
    /// Returns [`SidecarError::LookupError`] if the store cannot be reached or
    /// rejects the request.
    async fn get_parameters(&self, names: &[String]) -> Result<HashMap<String, String>>;

    /// Get a human-readable name for this store (for logging/debugging).
    fn name(&self) -> String;
}

/// Identifiers needed to open a configuration session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParameters {
    /// Application identifier.
    pub application_id: String,
    /// Configuration profile identifier.
    pub configuration_profile_id: String,
    /// Environment identifier.
    pub environment_id: String,
}

/// Resolves [`ResolvedParameters`] from a [`ParameterStore`].
///
/// # Examples
///
/// ```rust,no_run
/// use appconfig_sidecar::sources::{ParameterResolver, ParameterStore};
/// use std::sync::Arc;
///
/// # async fn example(store: Arc<dyn ParameterStore>) -> appconfig_sidecar::error::Result<()> {
/// let params = ParameterResolver::new(store)
///     .with_prefix("/myapp/appconfig")
///     .resolve()
///     .await?;
/// println!("application: {}", params.application_id);
/// # Ok(())
/// # }
/// ```
pub struct ParameterResolver {
    store: Arc<dyn ParameterStore>,
    prefix: String,
}

impl ParameterResolver {
    /// Create a resolver reading under [`DEFAULT_PARAMETER_PREFIX`].
    pub fn new(store: Arc<dyn ParameterStore>) -> Self {
        Self {
            store,
            prefix: DEFAULT_PARAMETER_PREFIX.to_string(),
        }
    }

    /// Set the namespace prefix. A trailing `/` is ignored.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    /// The three fully qualified parameter names, in
    /// application / profile / environment order.
    pub fn keys(&self) -> [String; 3] {
        [
            format!("{}/{}", self.prefix, APPLICATION_ID_KEY),
            format!("{}/{}", self.prefix, CONFIGURATION_PROFILE_ID_KEY),
            format!("{}/{}", self.prefix, ENVIRONMENT_ID_KEY),
        ]
    }

    /// Read the three identifiers in a single batched lookup.
    ///
    /// Values are matched to names, not to their position in the response.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The store is unreachable ([`SidecarError::LookupError`])
    /// - Any of the three names is absent ([`SidecarError::MissingParameter`])
    pub async fn resolve(&self) -> Result<ResolvedParameters> {
        let keys = self.keys();
        let mut values = self.store.get_parameters(&keys).await?;

        let mut take = |key: &String| {
            values
                .remove(key)
                .ok_or_else(|| SidecarError::MissingParameter(key.clone()))
        };

        let [application_key, profile_key, environment_key] = &keys;
        let params = ResolvedParameters {
            application_id: take(application_key)?,
            configuration_profile_id: take(profile_key)?,
            environment_id: take(environment_key)?,
        };

        tracing::info!(
            store = %self.store.name(),
            application_id = %params.application_id,
            configuration_profile_id = %params.configuration_profile_id,
            environment_id = %params.environment_id,
            "Resolved deployment parameters"
        );

        Ok(params)
    }
}
