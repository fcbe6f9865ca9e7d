use thiserror::Error;

use crate::quota::models::Tier;

/// Error taxonomy for every call routed through the `ApiClient`.
///
/// The client fully handles user notification (and, for gated failures, the
/// global upgrade event) before returning one of these, then re-rejects so
/// callers can also react locally. Errors are never swallowed; none of these
/// are retried by the client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401 — session invalid. A deferred redirect to the login route has
    /// already been scheduled; the original call is not retried.
    #[error("session expired")]
    AuthExpired,

    /// 429 — monthly quota exhausted. Resolved only by a tier upgrade.
    #[error("{message}")]
    QuotaExceeded {
        message: String,
        feature: Option<String>,
        upgrade_required: Option<Tier>,
        used: Option<u64>,
        limit: Option<u64>,
    },

    /// 403 carrying the feature-gating error code — the feature exists but
    /// is not part of the caller's plan.
    #[error("{message}")]
    FeatureGated {
        message: String,
        feature: Option<String>,
        upgrade_required: Option<Tier>,
    },

    /// Any other non-success status.
    #[error("server error (status {status}): {message}")]
    Server { status: u16, message: String },

    /// Transport-level failure: connect, timeout, or body decode.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
