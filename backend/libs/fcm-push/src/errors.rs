use thiserror::Error;

/// FCM Push Error Types
#[derive(Error, Debug)]
pub enum FcmError {
    #[error("Failed to load service account credentials: {0}")]
    CredentialLoad(String),

    #[error("Failed to sign token assertion: {0}")]
    Signing(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// No access token could be obtained, so the send was not attempted.
    #[error("Access token unavailable, send not attempted")]
    Unauthorized,

    #[error("FCM send request failed: {0}")]
    Transport(String),

    #[error("FCM API error: {status} - {body}")]
    ProviderApi { status: u16, body: String },

    #[error("Invalid FCM configuration: {0}")]
    Config(String),
}

impl FcmError {
    /// True for failures that happened before any request reached FCM.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            FcmError::CredentialLoad(_)
                | FcmError::Signing(_)
                | FcmError::TokenExchange(_)
                | FcmError::Unauthorized
        )
    }
}

pub(crate) fn map_reqwest_error(e: reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_api_display() {
        let err = FcmError::ProviderApi {
            status: 404,
            body: "{\"error\":\"NOT_FOUND\"}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "FCM API error: 404 - {\"error\":\"NOT_FOUND\"}"
        );
    }

    #[test]
    fn test_auth_failure_classification() {
        assert!(FcmError::Unauthorized.is_auth_failure());
        assert!(FcmError::Signing("bad key".to_string()).is_auth_failure());
        assert!(!FcmError::Transport("refused".to_string()).is_auth_failure());
        assert!(!FcmError::Config("missing".to_string()).is_auth_failure());
    }
}
