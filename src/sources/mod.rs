//! Remote collaborators and process settings.

mod env;
mod parameter_store;
mod session;

#[cfg(feature = "aws")]
mod appconfig;
#[cfg(feature = "aws")]
mod ssm;

pub use env::{ENV_PREFIX, Settings};
pub use parameter_store::{
    DEFAULT_PARAMETER_PREFIX, ParameterResolver, ParameterStore, ResolvedParameters,
};
pub use session::{
    ConfigurationService, ContinuationToken, DEFAULT_MIN_POLL_INTERVAL, PollResponse,
    SessionRequest, start_session,
};

#[cfg(feature = "aws")]
pub use appconfig::AppConfigDataService;
#[cfg(feature = "aws")]
pub use ssm::SsmParameterStore;
