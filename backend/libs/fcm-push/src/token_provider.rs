use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info};

use crate::errors::{map_reqwest_error, FcmError};
use crate::models::{GoogleTokenResponse, ServiceAccountKey, TokenExchangeRequest};
use crate::signer::TokenSigner;
use crate::token_cache::TokenCache;

pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Source of "now" for signing and cache expiry
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Where the service account key comes from
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// JSON key file, read on the first token request
    File(PathBuf),
    Inline(ServiceAccountKey),
}

/// Yields OAuth2 access tokens for FCM, exchanging a fresh signed assertion
/// whenever the cached token has expired.
pub struct TokenProvider {
    source: CredentialSource,
    credential: OnceCell<Arc<ServiceAccountKey>>,
    signer: TokenSigner,
    token_uri: String,
    cache: Mutex<TokenCache>,
    http_client: reqwest::Client,
    clock: Clock,
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("source", &self.source)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl TokenProvider {
    pub fn new(
        source: CredentialSource,
        token_uri: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        let token_uri = token_uri.into();
        Self {
            source,
            credential: OnceCell::new(),
            signer: TokenSigner::new(token_uri.clone()),
            token_uri,
            cache: Mutex::new(TokenCache::new()),
            http_client,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, mostly for expiry tests
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Access token, or an empty string when none could be obtained.
    ///
    /// Failures are logged. Callers must not attempt a send with an empty token.
    pub async fn access_token(&self) -> String {
        match self.try_access_token().await {
            Ok(token) => token,
            Err(e) => {
                error!("Failed to obtain FCM access token: {}", e);
                String::new()
            }
        }
    }

    /// Access token from cache, refreshing it if expired
    pub async fn try_access_token(&self) -> Result<String, FcmError> {
        // Held across the refresh so concurrent callers wait for one exchange
        let mut cache = self.cache.lock().await;

        if let Some(token) = cache.get((self.clock)()) {
            debug!("Using cached FCM access token");
            return Ok(token);
        }

        debug!("Cached FCM access token missing or expired, exchanging assertion");
        let token = self.exchange((self.clock)()).await?;
        let stored = cache.store(token, (self.clock)());

        info!(
            expires_at = %stored.expires_at(),
            "Fetched and cached FCM access token"
        );
        Ok(stored.value.clone())
    }

    /// Drop the cached token so the next call exchanges a new one
    pub async fn invalidate(&self) {
        self.cache.lock().await.clear();
    }

    async fn credential(&self) -> Result<Arc<ServiceAccountKey>, FcmError> {
        self.credential
            .get_or_try_init(|| load_credential(&self.source))
            .await
            .map(Arc::clone)
    }

    async fn exchange(&self, now: DateTime<Utc>) -> Result<String, FcmError> {
        let credential = self.credential().await?;
        let assertion = self.signer.sign(&credential, now)?.as_assertion();

        let response = self
            .http_client
            .post(&self.token_uri)
            .header("Content-Type", "application/json")
            .json(&TokenExchangeRequest {
                grant_type: JWT_BEARER_GRANT_TYPE,
                assertion: &assertion,
            })
            .send()
            .await
            .map_err(|e| FcmError::TokenExchange(map_reqwest_error(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FcmError::TokenExchange(map_reqwest_error(e)))?;

        if !status.is_success() {
            return Err(FcmError::TokenExchange(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token_response: GoogleTokenResponse = serde_json::from_str(&body).map_err(|e| {
            FcmError::TokenExchange(format!("failed to parse token response: {}", e))
        })?;

        if token_response.access_token.is_empty() {
            return Err(FcmError::TokenExchange(
                "token response carried an empty access_token".to_string(),
            ));
        }

        Ok(token_response.access_token)
    }
}

async fn load_credential(source: &CredentialSource) -> Result<Arc<ServiceAccountKey>, FcmError> {
    match source {
        CredentialSource::Inline(key) => Ok(Arc::new(key.clone())),
        CredentialSource::File(path) => {
            let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
                FcmError::CredentialLoad(format!("failed to read {}: {}", path.display(), e))
            })?;
            let key: ServiceAccountKey = serde_json::from_str(&raw).map_err(|e| {
                FcmError::CredentialLoad(format!("invalid key file {}: {}", path.display(), e))
            })?;
            info!(client_email = %key.client_email, "Loaded FCM service account key");
            Ok(Arc::new(key))
        }
    }
}
