use chrono::{DateTime, Duration, Utc};

use crate::signer::{ASSERTION_LIFETIME_SECS, CLOCK_SKEW_SECS};

/// How long an exchanged access token is served from cache
pub const TOKEN_CACHE_TTL_SECS: i64 = 3500;

// Cached tokens must expire before the assertion that produced them does.
const _: () = assert!(TOKEN_CACHE_TTL_SECS < ASSERTION_LIFETIME_SECS - CLOCK_SKEW_SECS);

/// OAuth2 access token as held by the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub issued_at: DateTime<Utc>,
    pub ttl_seconds: i64,
}

impl AccessToken {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(self.ttl_seconds)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// Single-slot access token cache
#[derive(Debug)]
pub struct TokenCache {
    slot: Option<AccessToken>,
    ttl_seconds: i64,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCache {
    pub fn new() -> Self {
        Self {
            slot: None,
            ttl_seconds: TOKEN_CACHE_TTL_SECS,
        }
    }

    /// Cached token value if it is still valid at `now`.
    /// An expired token is evicted.
    pub fn get(&mut self, now: DateTime<Utc>) -> Option<String> {
        if self.slot.as_ref().is_some_and(|token| token.is_expired(now)) {
            self.slot = None;
        }
        self.slot.as_ref().map(|token| token.value.clone())
    }

    pub fn store(&mut self, value: String, now: DateTime<Utc>) -> &AccessToken {
        self.slot.insert(AccessToken {
            value,
            issued_at: now,
            ttl_seconds: self.ttl_seconds,
        })
    }

    pub fn current(&self) -> Option<&AccessToken> {
        self.slot.as_ref()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}
