//! FCM Push Library
//!
//! Sends push notifications through the Firebase Cloud Messaging HTTP v1 API,
//! authenticating with short-lived OAuth2 access tokens obtained from a
//! self-signed service account assertion.
//!
//! It handles:
//! - RS256 signing of JWT-bearer assertions from a service account key
//! - Access token caching with expiry-driven refresh
//! - Message envelopes for notification, data or combined pushes
//! - Single-device, topic, broadcast and chunked multicast delivery

pub mod client;
pub mod config;
pub mod errors;
pub mod message;
pub mod models;
pub mod signer;
pub mod token_cache;
pub mod token_provider;

pub use client::{FcmClient, MAX_TOKENS_PER_REQUEST};
pub use config::{FcmConfig, PushType};
pub use errors::FcmError;
pub use message::{build_envelope, MessageBuilder};
pub use models::{
    Envelope, MessagePayload, MulticastSummary, NotificationTarget, ResponseBody,
    ServiceAccountKey, GLOBAL_TOPIC,
};
pub use signer::{base64url_encode, SignedAssertion, TokenSigner};
pub use token_cache::{AccessToken, TokenCache, TOKEN_CACHE_TTL_SECS};
pub use token_provider::{Clock, CredentialSource, TokenProvider};
