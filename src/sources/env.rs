//! Process settings sourced from the environment.

use crate::error::{Result, SidecarError};
use crate::sources::DEFAULT_PARAMETER_PREFIX;
use config::Environment;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Prefix shared by every settings variable, e.g. `SIDECAR_PORT`.
pub const ENV_PREFIX: &str = "SIDECAR";

/// Process settings.
///
/// Read from `SIDECAR_*` environment variables; anything unset falls back to
/// its default. Command-line flags are applied on top by the binary.
///
/// # Examples
///
/// ```rust,no_run
/// use appconfig_sidecar::sources::Settings;
///
/// # fn example() -> appconfig_sidecar::error::Result<()> {
/// Settings::load_env_file(".env")?;
/// let settings = Settings::from_env()?;
/// println!("port: {}", settings.port);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Port the HTTP surface listens on.
    pub port: u16,
    /// Namespace holding the deployment parameters.
    pub parameter_prefix: String,
    /// Minimum poll interval hint sent when opening the session.
    pub min_poll_interval_secs: u64,
    /// Fixed delay before retrying a failed poll.
    pub backoff_secs: u64,
    /// Optional deadline on each poll call. Unset or zero means no deadline.
    pub poll_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 80,
            parameter_prefix: DEFAULT_PARAMETER_PREFIX.to_string(),
            min_poll_interval_secs: 15,
            backoff_secs: 10,
            poll_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Load `KEY=value` pairs from an env file into the process environment.
    ///
    /// Variables already set in the environment take precedence.
    ///
    /// # Errors
    ///
    /// Returns [`SidecarError::EnvFileError`] if the file is missing or malformed.
    pub fn load_env_file(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        dotenvy::from_path(path)
            .map_err(|e| SidecarError::EnvFileError(format!("{}: {}", path.display(), e)))
    }

    /// Read settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`SidecarError::SettingsError`] if a variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_source(None)
    }

    /// Read settings from an explicit variable map instead of the process
    /// environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::from_source(Some(vars))
    }

    fn from_source(vars: Option<HashMap<String, String>>) -> Result<Self> {
        // `SIDECAR_X=` means unset, not an empty value.
        let env_source = Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .ignore_empty(true)
            .source(vars);

        let settings = config::Config::builder()
            .add_source(env_source)
            .build()
            .map_err(|e| {
                SidecarError::SettingsError(format!("Failed to read environment: {}", e))
            })?
            .try_deserialize::<Settings>()
            .map_err(|e| SidecarError::SettingsError(e.to_string()))?;

        tracing::debug!(?settings, "Loaded settings");
        Ok(settings)
    }

    /// Minimum poll interval hint as a duration.
    pub fn min_poll_interval(&self) -> Duration {
        Duration::from_secs(self.min_poll_interval_secs)
    }

    /// Poll failure backoff as a duration.
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    /// Per-call poll deadline, if configured.
    ///
    /// Zero is read as "no deadline".
    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }
}
