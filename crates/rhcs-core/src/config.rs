//! Provider configuration.
//!
//! Values come from the environment by default and can be overridden with
//! the builder methods (the CLI maps its flags onto them).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::poll::PollSettings;

pub const DEFAULT_URL: &str = "https://api.openshift.com";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_READY_TIMEOUT_SECS: u64 = 60 * 60;

/// Connection and polling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the clusters-management API
    pub url: String,
    /// Bearer access token (optional for unauthenticated test servers)
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Seconds between readiness queries
    pub poll_interval_secs: u64,
    /// Seconds to wait for a cluster to become ready
    pub ready_timeout_secs: u64,
}

fn env_secs(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            url: std::env::var("RHCS_URL").unwrap_or_else(|_| DEFAULT_URL.to_string()),
            token: std::env::var("RHCS_TOKEN").ok().filter(|t| !t.is_empty()),
            poll_interval_secs: env_secs("RHCS_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS),
            ready_timeout_secs: env_secs("RHCS_READY_TIMEOUT_SECS", DEFAULT_READY_TIMEOUT_SECS),
        }
    }
}

impl ProviderConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific API URL, ignoring the environment
    pub fn new(url: &str) -> Self {
        ProviderConfig {
            url: url.to_string(),
            token: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            ready_timeout_secs: DEFAULT_READY_TIMEOUT_SECS,
        }
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_poll_interval(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    pub fn with_ready_timeout(mut self, secs: u64) -> Self {
        self.ready_timeout_secs = secs;
        self
    }

    /// Readiness poll settings derived from this config.
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings::new(
            Duration::from_secs(self.poll_interval_secs),
            Duration::from_secs(self.ready_timeout_secs),
        )
    }
}
