//! Shared test doubles for the parameter store and configuration service.

#![allow(dead_code)]

use appconfig_sidecar::error::{Result, SidecarError};
use appconfig_sidecar::sources::{
    ConfigurationService, ContinuationToken, ParameterStore, PollResponse, SessionRequest,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

pub const PREFIX: &str = "/moviesapp/appconfig";

/// Parameter store answering from a fixed map.
pub struct StaticParameterStore {
    values: HashMap<String, String>,
    pub lookups: Mutex<usize>,
}

impl StaticParameterStore {
    pub fn new(pairs: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            lookups: Mutex::new(0),
        })
    }

    /// A store holding all three parameters under [`PREFIX`].
    pub fn complete() -> Arc<Self> {
        Self::new(&[
            ("/moviesapp/appconfig/application-id", "movies"),
            ("/moviesapp/appconfig/configuration-profile-id", "feature-flags"),
            ("/moviesapp/appconfig/environment-id", "prod"),
        ])
    }
}

#[async_trait]
impl ParameterStore for StaticParameterStore {
    async fn get_parameters(&self, names: &[String]) -> Result<HashMap<String, String>> {
        *self.lookups.lock().unwrap() += 1;
        Ok(names
            .iter()
            .filter_map(|n| self.values.get(n).map(|v| (n.clone(), v.clone())))
            .collect())
    }

    fn name(&self) -> String {
        "static".to_string()
    }
}

/// One recorded poll call.
#[derive(Debug, Clone)]
pub struct PollCall {
    pub token: String,
    pub at: Instant,
}

/// Configuration service replaying a script of poll outcomes.
///
/// Once the script runs dry every poll fails and `exhausted` is notified.
pub struct ScriptedService {
    initial_token: Option<&'static str>,
    script: Mutex<VecDeque<Result<PollResponse>>>,
    pub sessions: Mutex<Vec<SessionRequest>>,
    pub calls: Mutex<Vec<PollCall>>,
    pub exhausted: Notify,
}

impl ScriptedService {
    pub fn new(initial_token: &'static str, script: Vec<Result<PollResponse>>) -> Arc<Self> {
        Arc::new(Self {
            initial_token: Some(initial_token),
            script: Mutex::new(script.into()),
            sessions: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            exhausted: Notify::new(),
        })
    }

    /// A service that rejects every session request.
    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            initial_token: None,
            script: Mutex::new(VecDeque::new()),
            sessions: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            exhausted: Notify::new(),
        })
    }

    pub fn tokens(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.token.clone())
            .collect()
    }

    /// Time elapsed between consecutive poll calls.
    pub fn gaps(&self) -> Vec<Duration> {
        self.calls
            .lock()
            .unwrap()
            .windows(2)
            .map(|w| w[1].at - w[0].at)
            .collect()
    }
}

#[async_trait]
impl ConfigurationService for ScriptedService {
    async fn start_session(&self, request: &SessionRequest) -> Result<ContinuationToken> {
        self.sessions.lock().unwrap().push(request.clone());
        self.initial_token
            .map(ContinuationToken::new)
            .ok_or_else(|| SidecarError::SessionError("BadRequestException".to_string()))
    }

    async fn get_latest_configuration(&self, token: &ContinuationToken) -> Result<PollResponse> {
        self.calls.lock().unwrap().push(PollCall {
            token: token.as_str().to_string(),
            at: Instant::now(),
        });

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(outcome) => outcome,
            None => {
                self.exhausted.notify_one();
                Err(SidecarError::PollError("script exhausted".to_string()))
            }
        }
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}

pub fn ok(token: &str, payload: &str, interval_secs: u64) -> Result<PollResponse> {
    Ok(PollResponse {
        next_token: ContinuationToken::new(token),
        configuration: Bytes::copy_from_slice(payload.as_bytes()),
        next_poll_interval: Duration::from_secs(interval_secs),
    })
}

pub fn transport_error() -> Result<PollResponse> {
    Err(SidecarError::PollError("dispatch failure: connection reset".to_string()))
}
