//! API Client — the single choke point for all authenticated backend calls.
//!
//! ARCHITECTURAL RULE: no other module may talk to the backend directly.
//! Every request goes through `ApiClient` so that token attachment and
//! failure classification are uniform.
//!
//! Classification precedence on a non-success response:
//!   1. 401            -> session invalid; notice + deferred login redirect
//!   2. 429            -> quota exhausted; upgrade event + notice
//!   3. 403 gated code -> feature unavailable; upgrade event + notice
//!   4. anything else  -> generic failure notice
//!
//! Side-effect contract: exactly one transient notice per failed call, and
//! exactly one published upgrade event per gated failure. No retries, no
//! backoff — callers receive the rejection and decide for themselves.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::auth::Session;
use crate::errors::ApiError;
use crate::events::{UpgradeEvent, UpgradeNotifier};
use crate::nav::{Navigator, LOGIN_ROUTE};
use crate::notices::{NoticeLevel, NoticeSink};
use crate::quota::models::{QuotaSnapshot, Tier};
use crate::subscription::Subscription;

pub const QUOTA_PATH: &str = "/api/v1/quota";
pub const SUBSCRIPTION_PATH: &str = "/api/v1/subscription";
pub const SUBSCRIPTION_CANCEL_PATH: &str = "/api/v1/subscription/cancel";

/// Grace period before the login redirect fires on a 401 — long enough for
/// the session-expired notice to be seen, not a retry window.
pub const LOGIN_REDIRECT_DELAY: Duration = Duration::from_secs(2);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error-body code the backend uses for plan-gated 403s. Other 403s take
/// the generic branch.
const FEATURE_GATED_CODE: &str = "Feature not available";

const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";
const DEFAULT_LIMIT_MESSAGE: &str = "You have reached your usage limit for this feature.";
const DEFAULT_GATED_MESSAGE: &str = "This feature is not available on your current plan.";
const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Error body shape of the backend's gated-error contract. Every field is
/// optional — a malformed or empty body classifies on status alone.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
    feature: Option<String>,
    upgrade_required: Option<Tier>,
    used: Option<u64>,
    limit: Option<u64>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<dyn Session>,
    notifier: UpgradeNotifier,
    notices: Arc<dyn NoticeSink>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        base_url: String,
        session: Arc<dyn Session>,
        notifier: UpgradeNotifier,
        notices: Arc<dyn NoticeSink>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            session,
            notifier,
            notices,
            navigator,
        }
    }

    /// GET the per-user quota snapshot for the current month.
    pub async fn fetch_quota(&self) -> Result<QuotaSnapshot, ApiError> {
        self.get_json(QUOTA_PATH).await
    }

    /// GET the current subscription record.
    pub async fn fetch_subscription(&self) -> Result<Subscription, ApiError> {
        self.get_json(SUBSCRIPTION_PATH).await
    }

    /// POST the subscription cancel action. Callers refetch afterwards;
    /// nothing is mutated locally.
    pub async fn cancel_subscription(&self) -> Result<(), ApiError> {
        self.send(Method::POST, SUBSCRIPTION_CANCEL_PATH).await?;
        Ok(())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(Method::GET, path).await?;
        Ok(response.json().await?)
    }

    /// Whether the session currently holds a bearer token.
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.session.bearer_token().await, Ok(Some(_)))
    }

    pub fn session_tier(&self) -> Option<Tier> {
        self.session.tier()
    }

    /// Attach the bearer token (when the session has one), send, and
    /// classify any failure. Token-fetch failure downgrades the request to
    /// unauthenticated rather than failing it.
    async fn send(&self, method: Method, path: &str) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);

        match self.session.bearer_token().await {
            Ok(Some(token)) => request = request.bearer_auth(token),
            Ok(None) => {}
            Err(e) => debug!("token fetch failed, sending unauthenticated: {e:#}"),
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                // no response at all: falls through to the generic branch
                self.notices.notify(NoticeLevel::Error, GENERIC_FAILURE_MESSAGE);
                return Err(ApiError::Http(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        Err(self.classify(status, body))
    }

    fn classify(&self, status: StatusCode, body: ErrorBody) -> ApiError {
        match status {
            StatusCode::UNAUTHORIZED => {
                self.notices.notify(NoticeLevel::Warning, SESSION_EXPIRED_MESSAGE);
                self.schedule_login_redirect();
                ApiError::AuthExpired
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let message = body
                    .message
                    .unwrap_or_else(|| DEFAULT_LIMIT_MESSAGE.to_string());
                self.notifier.publish(UpgradeEvent {
                    feature: body.feature.clone(),
                    upgrade_required: body.upgrade_required,
                    used: body.used,
                    limit: body.limit,
                    current_tier: self.current_tier(),
                });
                self.notices.notify(NoticeLevel::Warning, &message);
                ApiError::QuotaExceeded {
                    message,
                    feature: body.feature,
                    upgrade_required: body.upgrade_required,
                    used: body.used,
                    limit: body.limit,
                }
            }
            StatusCode::FORBIDDEN if body.error.as_deref() == Some(FEATURE_GATED_CODE) => {
                let message = body
                    .message
                    .unwrap_or_else(|| DEFAULT_GATED_MESSAGE.to_string());
                self.notifier.publish(UpgradeEvent {
                    feature: body.feature.clone(),
                    upgrade_required: body.upgrade_required,
                    used: None,
                    limit: None,
                    current_tier: self.current_tier(),
                });
                self.notices.notify(NoticeLevel::Warning, &message);
                ApiError::FeatureGated {
                    message,
                    feature: body.feature,
                    upgrade_required: body.upgrade_required,
                }
            }
            _ => {
                let message = body
                    .message
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
                self.notices.notify(NoticeLevel::Error, &message);
                ApiError::Server {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }

    /// Tier carried on upgrade events: the session's known tier, falling
    /// back to free only when the session cannot say.
    fn current_tier(&self) -> Tier {
        self.session.tier().unwrap_or(Tier::Free)
    }

    fn schedule_login_redirect(&self) {
        let navigator = Arc::clone(&self.navigator);
        tokio::spawn(async move {
            tokio::time::sleep(LOGIN_REDIRECT_DELAY).await;
            navigator.navigate(LOGIN_ROUTE);
        });
    }
}
