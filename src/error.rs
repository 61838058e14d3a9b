//! Error types for appconfig-sidecar.

use std::time::Duration;

/// Result type alias for appconfig-sidecar operations.
pub type Result<T> = std::result::Result<T, SidecarError>;

/// Errors that can occur while bootstrapping or polling.
#[derive(Debug, thiserror::Error)]
pub enum SidecarError {
    /// The parameter store could not be reached or rejected the lookup.
    #[error("Failed to look up parameters: {0}")]
    LookupError(String),

    /// A parameter expected under the configured prefix does not exist.
    #[error("Parameter not found: {0}")]
    MissingParameter(String),

    /// Opening the configuration session failed.
    #[error("Failed to start configuration session: {0}")]
    SessionError(String),

    /// A single poll exchange failed. Always transient.
    #[error("Error retrieving latest configuration: {0}")]
    PollError(String),

    /// A poll exchange exceeded the configured poll timeout.
    #[error("Poll timed out after {0:?}")]
    PollTimeout(Duration),

    /// Process settings could not be read from the environment.
    #[error("Invalid settings: {0}")]
    SettingsError(String),

    /// The environment file could not be loaded.
    #[error("Error loading env file: {0}")]
    EnvFileError(String),

    /// The sidecar builder was started without a required collaborator.
    #[error("Missing component: {0}")]
    MissingComponent(&'static str),
}
