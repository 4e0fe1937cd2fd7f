use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::FcmError;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_API_BASE_URL: &str = "https://fcm.googleapis.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Which payload blocks every outbound message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PushType {
    /// Only the `notification` block
    Notification,
    /// Only the `data` block
    Data,
    /// Both blocks
    #[default]
    Both,
}

impl PushType {
    pub fn includes_notification(self) -> bool {
        matches!(self, PushType::Notification | PushType::Both)
    }

    pub fn includes_data(self) -> bool {
        matches!(self, PushType::Data | PushType::Both)
    }
}

impl fmt::Display for PushType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PushType::Notification => "NOTIFICATION",
            PushType::Data => "DATA",
            PushType::Both => "BOTH",
        };
        f.write_str(name)
    }
}

impl FromStr for PushType {
    type Err = FcmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NOTIFICATION" => Ok(PushType::Notification),
            "DATA" => Ok(PushType::Data),
            "BOTH" => Ok(PushType::Both),
            other => Err(FcmError::Config(format!("unknown push type: {other}"))),
        }
    }
}

/// FCM Configuration
///
/// The private key path points at a Google service-account JSON file. It is
/// used as given; relative paths resolve against the process working directory.
#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub private_key_path: PathBuf,
    pub project_id: String,
    pub push_type: PushType,
    pub token_uri: String,
    pub api_base_url: String,
    pub request_timeout: Duration,
    accept_invalid_certs: bool,
}

impl FcmConfig {
    /// Create new FCM configuration with default endpoints
    pub fn new(private_key_path: impl Into<PathBuf>, project_id: impl Into<String>) -> Self {
        Self {
            private_key_path: private_key_path.into(),
            project_id: project_id.into(),
            push_type: PushType::default(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            accept_invalid_certs: false,
        }
    }

    /// Loads FCM config from environment variables
    ///
    /// Required: `FCM_PRIVATE_KEY_PATH`, `FCM_PROJECT_ID`.
    /// Optional: `FCM_PUSH_TYPE`, `FCM_TOKEN_URI`, `FCM_API_BASE_URL`,
    /// `FCM_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, FcmError> {
        let private_key_path = required_env("FCM_PRIVATE_KEY_PATH")?;
        let project_id = required_env("FCM_PROJECT_ID")?;

        let mut config = Self::new(private_key_path, project_id);

        if let Some(push_type) = optional_env("FCM_PUSH_TYPE") {
            config.push_type = push_type.parse()?;
        }
        if let Some(token_uri) = optional_env("FCM_TOKEN_URI") {
            config.token_uri = token_uri;
        }
        if let Some(base_url) = optional_env("FCM_API_BASE_URL") {
            config.api_base_url = base_url;
        }
        if let Some(secs) = optional_env("FCM_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|e| {
                FcmError::Config(format!("FCM_REQUEST_TIMEOUT_SECS is not a number: {e}"))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_push_type(mut self, push_type: PushType) -> Self {
        self.push_type = push_type;
        self
    }

    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Disable TLS certificate verification.
    ///
    /// TEST ONLY. Never enable this against the real FCM endpoints.
    pub fn danger_accept_invalid_certs(mut self) -> Self {
        self.accept_invalid_certs = true;
        self
    }

    pub fn accepts_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    /// `{api_base_url}/v1/projects/{project_id}/messages:send`
    pub fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.api_base_url.trim_end_matches('/'),
            self.project_id
        )
    }

    pub fn validate(&self) -> Result<(), FcmError> {
        if self.private_key_path.as_os_str().is_empty() {
            return Err(FcmError::Config("private key path is empty".to_string()));
        }
        self.validate_endpoints()
    }

    /// Everything except the key path, for clients built from an inline key
    pub(crate) fn validate_endpoints(&self) -> Result<(), FcmError> {
        if self.project_id.trim().is_empty() {
            return Err(FcmError::Config("project id is empty".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(FcmError::Config("request timeout must be non-zero".to_string()));
        }
        for (name, url) in [("token uri", &self.token_uri), ("api base url", &self.api_base_url)] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(FcmError::Config(format!("{name} must be an http(s) URL: {url}")));
            }
        }
        Ok(())
    }
}

fn required_env(key: &str) -> Result<String, FcmError> {
    optional_env(key).ok_or_else(|| FcmError::Config(format!("{key} not set")))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
