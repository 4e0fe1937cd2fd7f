//! Self-signed JWT-bearer assertions for the Google OAuth2 token endpoint.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use jsonwebtoken::{crypto, Algorithm, EncodingKey};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_TOKEN_URI;
use crate::errors::FcmError;
use crate::models::ServiceAccountKey;

pub const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// `iat` is backdated by this much to absorb clock skew
pub const CLOCK_SKEW_SECS: i64 = 60;
/// Lifetime of a signed assertion measured from its (backdated) `iat`
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// base64url without padding (`+` -> `-`, `/` -> `_`, no `=`)
pub fn base64url_encode(input: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

#[derive(Debug, Serialize)]
struct AssertionHeader {
    typ: &'static str,
    alg: &'static str,
}

/// Claims of the bearer assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

/// A signed assertion, each part already base64url-encoded
#[derive(Debug, Clone)]
pub struct SignedAssertion {
    pub header: String,
    pub payload: String,
    pub signature: String,
}

impl SignedAssertion {
    /// `<header>.<payload>.<signature>`
    pub fn as_assertion(&self) -> String {
        self.to_string()
    }

    /// The bytes covered by the signature
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }
}

impl fmt::Display for SignedAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.header, self.payload, self.signature)
    }
}

/// Builds and RS256-signs bearer assertions
#[derive(Debug, Clone)]
pub struct TokenSigner {
    audience: String,
    scope: String,
}

impl Default for TokenSigner {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_URI)
    }
}

impl TokenSigner {
    /// `audience` must be the token endpoint the assertion is exchanged at
    pub fn new(audience: impl Into<String>) -> Self {
        Self {
            audience: audience.into(),
            scope: FCM_SCOPE.to_string(),
        }
    }

    pub fn claims(&self, credential: &ServiceAccountKey, now: DateTime<Utc>) -> AssertionClaims {
        let iat = now.timestamp() - CLOCK_SKEW_SECS;
        AssertionClaims {
            iss: credential.client_email.clone(),
            scope: self.scope.clone(),
            aud: self.audience.clone(),
            exp: iat + ASSERTION_LIFETIME_SECS,
            iat,
        }
    }

    pub fn sign(
        &self,
        credential: &ServiceAccountKey,
        now: DateTime<Utc>,
    ) -> Result<SignedAssertion, FcmError> {
        let encoding_key = EncodingKey::from_rsa_pem(credential.private_key.as_bytes())
            .map_err(|e| FcmError::Signing(format!("failed to parse private key: {}", e)))?;

        let header = serde_json::to_vec(&AssertionHeader {
            typ: "JWT",
            alg: "RS256",
        })
        .map_err(|e| FcmError::Signing(e.to_string()))?;
        let payload = serde_json::to_vec(&self.claims(credential, now))
            .map_err(|e| FcmError::Signing(e.to_string()))?;

        let header = base64url_encode(header);
        let payload = base64url_encode(payload);

        // crypto::sign already returns the base64url form of the signature
        let signature = crypto::sign(
            format!("{}.{}", header, payload).as_bytes(),
            &encoding_key,
            Algorithm::RS256,
        )
        .map_err(|e| FcmError::Signing(format!("failed to sign assertion: {}", e)))?;

        Ok(SignedAssertion {
            header,
            payload,
            signature,
        })
    }
}
