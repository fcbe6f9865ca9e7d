//! Session seam — "who is signed in, and what bearer token do we send".
//!
//! The `ApiClient` holds an `Arc<dyn Session>`; absence of a token (or a
//! failed token fetch) means the request goes out unauthenticated and the
//! server enforces auth on its side. `CachedSession` caches the token with
//! its expiry and refreshes only when stale, instead of re-deriving a token
//! on every request.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::quota::models::Tier;

/// Refresh this far ahead of expiry so a token never dies mid-request.
const EXPIRY_SKEW_SECS: i64 = 30;

#[async_trait]
pub trait Session: Send + Sync {
    /// Current bearer token, `None` when unauthenticated.
    async fn bearer_token(&self) -> Result<Option<String>>;

    /// Tier of the signed-in user, when the session knows it.
    fn tier(&self) -> Option<Tier> {
        None
    }
}

/// Fixed-credential session, used by the CLI dashboard and tests.
pub struct StaticSession {
    token: Option<String>,
    tier: Option<Tier>,
}

impl StaticSession {
    pub fn new(token: Option<String>, tier: Option<Tier>) -> Self {
        Self { token, tier }
    }

    pub fn anonymous() -> Self {
        Self::new(None, None)
    }
}

#[async_trait]
impl Session for StaticSession {
    async fn bearer_token(&self) -> Result<Option<String>> {
        Ok(self.token.clone())
    }

    fn tier(&self) -> Option<Tier> {
        self.tier
    }
}

/// A freshly issued bearer token and when it stops being valid.
#[derive(Debug, Clone)]
pub struct BearerToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Something that can mint a token — an identity provider client, a keychain,
/// a refresh-token exchange.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<Option<BearerToken>>;

    fn tier(&self) -> Option<Tier> {
        None
    }
}

/// Session that caches the source's token until it is about to expire.
pub struct CachedSession<S> {
    source: S,
    cached: Mutex<Option<BearerToken>>,
}

impl<S: TokenSource> CachedSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<S: TokenSource> Session for CachedSession<S> {
    async fn bearer_token(&self) -> Result<Option<String>> {
        let mut cached = self.cached.lock().await;

        if let Some(t) = cached.as_ref() {
            if t.expires_at - Duration::seconds(EXPIRY_SKEW_SECS) > Utc::now() {
                return Ok(Some(t.token.clone()));
            }
            debug!("cached bearer token stale, refreshing");
        }

        *cached = self.source.fetch_token().await?;
        Ok(cached.as_ref().map(|t| t.token.clone()))
    }

    fn tier(&self) -> Option<Tier> {
        self.source.tier()
    }
}
