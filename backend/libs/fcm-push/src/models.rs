use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::FcmError;

/// Reserved topic every device subscribes to; "send to all" targets it.
pub const GLOBAL_TOPIC: &str = "global";

/// Firebase Service Account Key
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    pub fn new(client_email: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            client_email: client_email.into(),
            private_key: private_key.into(),
            project_id: None,
            private_key_id: None,
            client_id: None,
            token_uri: None,
        }
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Google OAuth2 Token Response
#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// JWT-bearer grant sent to the token endpoint
#[derive(Debug, Serialize)]
pub struct TokenExchangeRequest<'a> {
    pub grant_type: &'a str,
    pub assertion: &'a str,
}

/// Recipient of a message; decides the target field of the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NotificationTarget {
    #[serde(rename = "token")]
    SingleToken(String),
    #[serde(rename = "topic")]
    Topic(String),
    #[serde(rename = "tokens")]
    MultiToken(Vec<String>),
}

impl NotificationTarget {
    pub fn global() -> Self {
        NotificationTarget::Topic(GLOBAL_TOPIC.to_string())
    }
}

/// Caller-supplied message content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePayload {
    pub title: String,
    pub body: String,
    /// Image URL, empty when unset
    pub image: String,
    /// Arbitrary key/value data, rendered as `null` when unset
    pub data: Option<Map<String, Value>>,
}

impl MessagePayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }
}

/// FCM Message Request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub message: FcmMessage,
}

/// FCM Message Content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FcmMessage {
    #[serde(flatten)]
    pub target: NotificationTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<FcmNotification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<FcmData>,
}

/// FCM Notification Payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FcmNotification {
    pub title: String,
    pub body: String,
}

/// FCM Data Payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FcmData {
    pub title: String,
    pub description: String,
    pub image: String,
    pub payload: Option<Map<String, Value>>,
}

/// Raw outcome of a completed HTTP exchange with the send endpoint.
///
/// Non-2xx responses are kept as-is; use [`ResponseBody::error_for_status`]
/// to classify them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseBody {
    pub status: u16,
    pub body: String,
}

impl ResponseBody {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `name` field FCM returns for an accepted message
    pub fn message_name(&self) -> Option<String> {
        #[derive(Deserialize)]
        struct FcmApiResponse {
            name: Option<String>,
        }

        if !self.is_success() {
            return None;
        }
        serde_json::from_str::<FcmApiResponse>(&self.body)
            .ok()
            .and_then(|r| r.name)
    }

    pub fn error_for_status(self) -> Result<Self, FcmError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FcmError::ProviderApi {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Chunk-level tally of a batch send
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MulticastSummary {
    pub success_count: usize,
    pub failure_count: usize,
}

impl MulticastSummary {
    pub fn from_results(results: &[Result<ResponseBody, FcmError>]) -> Self {
        results
            .iter()
            .fold(Self::default(), |mut summary, result| {
                match result {
                    Ok(response) if response.is_success() => summary.success_count += 1,
                    _ => summary.failure_count += 1,
                }
                summary
            })
    }
}
