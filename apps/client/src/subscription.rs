//! Subscription record and the panel that displays it.
//!
//! The record is owned by the backend and fetched read-only. The only
//! mutation is the explicit cancel action, which posts to the backend and
//! then refetches — never an optimistic local edit.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::api::ApiClient;
use crate::errors::ApiError;
use crate::quota::models::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    Expired,
    #[serde(rename = "past_due")]
    PastDue,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub plan: Tier,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub subscription_id: String,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    pub fn summary(&self) -> String {
        format!(
            "{} plan ({:?}), valid until {}",
            self.plan.display_name(),
            self.status,
            self.valid_until.format("%Y-%m-%d")
        )
    }
}

pub struct SubscriptionPanel {
    api: ApiClient,
}

impl SubscriptionPanel {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn load(&self) -> Result<Subscription, ApiError> {
        self.api.fetch_subscription().await
    }

    /// Cancel on the backend, then refetch the record so the caller renders
    /// the server's view of the new state.
    pub async fn cancel(&self) -> Result<Subscription, ApiError> {
        self.api.cancel_subscription().await?;
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use axum::extract::State;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    use crate::api::{SUBSCRIPTION_CANCEL_PATH, SUBSCRIPTION_PATH};
    use crate::auth::StaticSession;
    use crate::events::UpgradeNotifier;
    use crate::nav::RecordingNavigator;
    use crate::notices::RecordingNotices;

    async fn subscription_backend() -> String {
        let canceled = Arc::new(AtomicBool::new(false));

        async fn get_subscription(State(canceled): State<Arc<AtomicBool>>) -> Json<serde_json::Value> {
            let status = if canceled.load(Ordering::SeqCst) {
                "canceled"
            } else {
                "active"
            };
            Json(json!({
                "plan": "premium",
                "status": status,
                "startDate": "2026-01-15T00:00:00Z",
                "validUntil": "2027-01-15T00:00:00Z",
                "subscriptionId": "sub_9f2c1"
            }))
        }

        async fn cancel(State(canceled): State<Arc<AtomicBool>>) -> Json<serde_json::Value> {
            canceled.store(true, Ordering::SeqCst);
            Json(json!({ "success": true }))
        }

        let router = Router::new()
            .route(SUBSCRIPTION_PATH, get(get_subscription))
            .route(SUBSCRIPTION_CANCEL_PATH, post(cancel))
            .with_state(canceled);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: String) -> ApiClient {
        ApiClient::new(
            base_url,
            Arc::new(StaticSession::new(Some("tok".into()), Some(Tier::Premium))),
            UpgradeNotifier::new(),
            RecordingNotices::new(),
            RecordingNavigator::new(),
        )
    }

    #[test]
    fn test_status_decodes_wire_names() {
        assert_eq!(
            serde_json::from_str::<SubscriptionStatus>("\"active\"").unwrap(),
            SubscriptionStatus::Active
        );
        assert_eq!(
            serde_json::from_str::<SubscriptionStatus>("\"past_due\"").unwrap(),
            SubscriptionStatus::PastDue
        );
    }

    #[tokio::test]
    async fn test_load_returns_current_record() {
        let panel = SubscriptionPanel::new(client(subscription_backend().await));
        let sub = panel.load().await.unwrap();
        assert_eq!(sub.plan, Tier::Premium);
        assert!(sub.is_active());
        assert_eq!(sub.subscription_id, "sub_9f2c1");
    }

    #[tokio::test]
    async fn test_cancel_refetches_instead_of_mutating() {
        let panel = SubscriptionPanel::new(client(subscription_backend().await));

        let before = panel.load().await.unwrap();
        assert!(before.is_active());

        // the canceled state comes back from the backend, not a local edit
        let after = panel.cancel().await.unwrap();
        assert_eq!(after.status, SubscriptionStatus::Canceled);
        assert_eq!(after.subscription_id, before.subscription_id);
    }
}
