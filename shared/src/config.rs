use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::capabilities::{HttpError, ValidatedUrl, MAX_TIMEOUT_MS};
use crate::draft::EmergencyType;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_DISPATCH_PATH: &str = "/api/ambulance";
pub const DEFAULT_PROFILE_PATH: &str = "/api/profile";
pub const DEFAULT_TOKEN_STORAGE_KEY: &str = "authToken";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_QUICK_CONDITION: &str =
    "Quick ambulance request - patient condition to be assessed on arrival";
pub const DEFAULT_LOCATION_PLACEHOLDER: &str = "Current Location";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid api_base_url: {0}")]
    InvalidBaseUrl(String),
    #[error("{field} must start with '/'")]
    InvalidPath { field: &'static str },
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    #[error("request_timeout_ms must be between 1 and {max}")]
    InvalidTimeout { max: u64 },
}

/// Everything the core needs to know about its environment. Sent by the shell
/// through `Event::Configure`; the defaults suit a local backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub api_base_url: String,
    pub dispatch_path: String,
    pub profile_path: String,
    pub token_storage_key: String,
    pub request_timeout_ms: u64,
    pub quick_emergency_type: EmergencyType,
    pub quick_condition: String,
    pub location_placeholder: String,
    pub high_accuracy_location: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            dispatch_path: DEFAULT_DISPATCH_PATH.into(),
            profile_path: DEFAULT_PROFILE_PATH.into(),
            token_storage_key: DEFAULT_TOKEN_STORAGE_KEY.into(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            quick_emergency_type: EmergencyType::OtherMedicalEmergency,
            quick_condition: DEFAULT_QUICK_CONDITION.into(),
            location_placeholder: DEFAULT_LOCATION_PLACEHOLDER.into(),
            high_accuracy_location: true,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        for (field, path) in [
            ("dispatch_path", &self.dispatch_path),
            ("profile_path", &self.profile_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidPath { field });
            }
        }
        if self.token_storage_key.trim().is_empty() {
            return Err(ConfigError::Empty("token_storage_key"));
        }
        if self.location_placeholder.trim().is_empty() {
            return Err(ConfigError::Empty("location_placeholder"));
        }
        if self.quick_condition.trim().is_empty() {
            return Err(ConfigError::Empty("quick_condition"));
        }
        let max = MAX_TIMEOUT_MS;
        if self.request_timeout_ms == 0 || self.request_timeout_ms > max {
            return Err(ConfigError::InvalidTimeout { max });
        }
        Ok(())
    }

    pub fn dispatch_url(&self) -> Result<ValidatedUrl, HttpError> {
        self.endpoint(&self.dispatch_path)
    }

    pub fn profile_url(&self) -> Result<ValidatedUrl, HttpError> {
        self.endpoint(&self.profile_path)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }

    fn base_url(&self) -> Result<Url, ConfigError> {
        let base = Url::parse(&self.api_base_url)
            .map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;
        ValidatedUrl::from_parsed(&base).map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;
        Ok(base)
    }

    fn endpoint(&self, path: &str) -> Result<ValidatedUrl, HttpError> {
        let invalid = |reason: String| HttpError::InvalidUrl {
            url: format!("{}{}", self.api_base_url, path),
            reason,
        };
        let base = self.base_url().map_err(|e| invalid(e.to_string()))?;
        let joined = base.join(path).map_err(|e| invalid(e.to_string()))?;
        ValidatedUrl::from_parsed(&joined)
    }
}
