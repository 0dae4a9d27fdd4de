use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{
    AppError, ErrorKind, ACTIVATION_VIBRATE_MS, COUNTDOWN_SECS, COUNTDOWN_TICK_MS,
    DASHBOARD_POLL_MS, DASHBOARD_RECENT_LIMIT, DEFAULT_API_BASE_URL, PRESS_WINDOW_MS,
    REQUIRED_PRESSES,
};

pub const MAX_URL_LENGTH: usize = 2048;
pub const MIN_POLL_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("dashboard poll interval must be at least {min}ms, got {got}ms")]
    PollTooFast { got: u64, min: u64 },

    #[error("emergency activation needs at least one press")]
    NoPressesRequired,
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

/// Timing of the emergency activation ritual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    pub required_presses: u8,
    pub press_window_ms: u64,
    pub countdown_secs: u8,
    pub tick_ms: u64,
    pub vibrate_ms: u64,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            required_presses: REQUIRED_PRESSES,
            press_window_ms: PRESS_WINDOW_MS,
            countdown_secs: COUNTDOWN_SECS,
            tick_ms: COUNTDOWN_TICK_MS,
            vibrate_ms: ACTIVATION_VIBRATE_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub dashboard_poll_ms: u64,
    pub dashboard_recent_limit: usize,
    pub activation: ActivationConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            dashboard_poll_ms: DASHBOARD_POLL_MS,
            dashboard_recent_limit: DASHBOARD_RECENT_LIMIT,
            activation: ActivationConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ApiBaseUrl::new(&self.api_base_url)?;

        if self.dashboard_poll_ms < MIN_POLL_MS {
            return Err(ConfigError::PollTooFast {
                got: self.dashboard_poll_ms,
                min: MIN_POLL_MS,
            });
        }

        if self.activation.required_presses == 0 {
            return Err(ConfigError::NoPressesRequired);
        }

        Ok(())
    }

    /// Absolute URL for an API path such as `/api/incidents`.
    ///
    /// Falls back to the default base when the configured one is unusable;
    /// `validate` rejects such configs before they are stored.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        ApiBaseUrl::new(&self.api_base_url)
            .or_else(|_| ApiBaseUrl::new(DEFAULT_API_BASE_URL))
            .map_or_else(|_| path.to_string(), |base| base.join(path))
    }
}

/// An http(s) origin with no credentials, stored without trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApiBaseUrl(String);

impl ApiBaseUrl {
    pub fn new(url: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
            url: Self::truncate_url(url),
            reason: reason.to_string(),
        };

        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(invalid("URL cannot be empty"));
        }
        if trimmed.len() > MAX_URL_LENGTH {
            return Err(invalid("URL is too long"));
        }

        let parsed = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;

        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(invalid(&format!(
                "invalid scheme '{scheme}', only 'http' and 'https' are allowed"
            )));
        }
        if parsed.host_str().is_none() {
            return Err(invalid("URL must have a host"));
        }
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(invalid("credentials in URL are not allowed"));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid("base URL cannot carry a query or fragment"));
        }

        Ok(Self(parsed.as_str().trim_end_matches('/').to_string()))
    }

    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.0, path.trim_start_matches('/'))
    }

    fn truncate_url(url: &str) -> String {
        if url.len() <= 100 {
            url.to_string()
        } else {
            let cut = (0..=100).rev().find(|i| url.is_char_boundary(*i)).unwrap_or(0);
            format!("{}...", &url[..cut])
        }
    }
}
