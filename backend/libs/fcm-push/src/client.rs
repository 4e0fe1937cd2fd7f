use tracing::{debug, info, warn};

use crate::config::{FcmConfig, PushType};
use crate::errors::{map_reqwest_error, FcmError};
use crate::message::MessageBuilder;
use crate::models::{
    Envelope, MessagePayload, MulticastSummary, NotificationTarget, ResponseBody,
    ServiceAccountKey,
};
use crate::token_provider::{CredentialSource, TokenProvider};

/// FCM fan-out limit for a single request
pub const MAX_TOKENS_PER_REQUEST: usize = 500;

/// Firebase Cloud Messaging Client
///
/// Builds message envelopes for the configured push type, authenticates with a
/// cached OAuth2 access token and posts them to the FCM HTTP v1 send endpoint.
#[derive(Debug)]
pub struct FcmClient {
    project_id: String,
    send_url: String,
    builder: MessageBuilder,
    token_provider: TokenProvider,
    http_client: reqwest::Client,
}

impl FcmClient {
    /// Create a client that reads the service account key from
    /// `config.private_key_path` on the first send.
    pub fn from_config(config: &FcmConfig) -> Result<Self, FcmError> {
        Self::new(config, CredentialSource::File(config.private_key_path.clone()))
    }

    /// Create a client from an already loaded service account key
    pub fn with_credentials(
        config: &FcmConfig,
        credentials: ServiceAccountKey,
    ) -> Result<Self, FcmError> {
        Self::new(config, CredentialSource::Inline(credentials))
    }

    pub fn new(config: &FcmConfig, source: CredentialSource) -> Result<Self, FcmError> {
        match &source {
            CredentialSource::File(_) => config.validate()?,
            CredentialSource::Inline(_) => config.validate_endpoints()?,
        }

        if config.accepts_invalid_certs() {
            warn!("TLS certificate verification is DISABLED for the FCM client");
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accepts_invalid_certs())
            .build()
            .map_err(|e| FcmError::Config(format!("failed to create HTTP client: {}", e)))?;

        let token_provider =
            TokenProvider::new(source, config.token_uri.clone(), http_client.clone());

        info!(
            "Initialized FCM client for project_id={}, push_type={}",
            config.project_id, config.push_type
        );

        Ok(Self {
            project_id: config.project_id.clone(),
            send_url: config.send_url(),
            builder: MessageBuilder::new(config.push_type),
            token_provider,
            http_client,
        })
    }

    /// Swap the token provider, e.g. one with an injected clock
    pub fn with_token_provider(mut self, token_provider: TokenProvider) -> Self {
        self.token_provider = token_provider;
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn push_type(&self) -> PushType {
        self.builder.push_type()
    }

    pub fn token_provider(&self) -> &TokenProvider {
        &self.token_provider
    }

    /// Send notification via FCM to a single device
    pub async fn send_to_one(
        &self,
        device_token: &str,
        payload: &MessagePayload,
    ) -> Result<ResponseBody, FcmError> {
        debug!("Sending FCM message to token {}", token_prefix(device_token));
        let envelope = self
            .builder
            .build(NotificationTarget::SingleToken(device_token.to_string()), payload);
        self.send(&envelope).await
    }

    /// Send notification to topic
    pub async fn send_to_topic(
        &self,
        topic: &str,
        payload: &MessagePayload,
    ) -> Result<ResponseBody, FcmError> {
        debug!("Sending FCM message to topic {}", topic);
        let envelope = self
            .builder
            .build(NotificationTarget::Topic(topic.to_string()), payload);
        self.send(&envelope).await
    }

    /// Send notification to every device subscribed to the `global` topic
    pub async fn send_to_all(&self, payload: &MessagePayload) -> Result<ResponseBody, FcmError> {
        let envelope = self.builder.build(NotificationTarget::global(), payload);
        self.send(&envelope).await
    }

    /// Send notification to many devices, at most [`MAX_TOKENS_PER_REQUEST`] per request.
    ///
    /// Returns one result per chunk, in input order. A failed chunk does not
    /// stop the remaining ones.
    pub async fn send_multiple(
        &self,
        device_tokens: &[String],
        payload: &MessagePayload,
    ) -> Vec<Result<ResponseBody, FcmError>> {
        let mut results = Vec::with_capacity(device_tokens.len().div_ceil(MAX_TOKENS_PER_REQUEST));

        for (index, chunk) in device_tokens.chunks(MAX_TOKENS_PER_REQUEST).enumerate() {
            let envelope = self
                .builder
                .build(NotificationTarget::MultiToken(chunk.to_vec()), payload);
            let result = self.send(&envelope).await;

            if let Err(e) = &result {
                warn!(
                    chunk = index,
                    chunk_size = chunk.len(),
                    "FCM multicast chunk failed: {}",
                    e
                );
            }
            results.push(result);
        }

        let summary = MulticastSummary::from_results(&results);
        info!(
            recipients = device_tokens.len(),
            chunks = results.len(),
            succeeded = summary.success_count,
            failed = summary.failure_count,
            "FCM multicast finished"
        );

        results
    }

    /// Post one envelope to the send endpoint.
    ///
    /// Any completed HTTP exchange is returned as-is, including FCM error
    /// responses. Only a missing access token or a transport failure is an `Err`.
    pub async fn send(&self, envelope: &Envelope) -> Result<ResponseBody, FcmError> {
        let access_token = self.token_provider.access_token().await;
        if access_token.is_empty() {
            warn!("Skipping FCM send: no access token available");
            return Err(FcmError::Unauthorized);
        }

        let response = self
            .http_client
            .post(&self.send_url)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .json(envelope)
            .send()
            .await
            .map_err(|e| FcmError::Transport(map_reqwest_error(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FcmError::Transport(map_reqwest_error(e)))?;

        if status.is_success() {
            debug!("FCM accepted message ({})", status);
        } else {
            warn!("FCM API returned {}: {}", status, body);
        }

        Ok(ResponseBody {
            status: status.as_u16(),
            body,
        })
    }
}

/// First 8 chars of a device token, for logs
fn token_prefix(device_token: &str) -> String {
    device_token.chars().take(8).collect()
}
