//! Quota display component.
//!
//! Fetches once per mount (callers gate on authentication), renders the
//! per-feature usage table, and fails soft: any fetch failure clears the
//! view and renders nothing rather than a broken partial state. Deliberately
//! not subscribed to the upgrade notifier — the panel and the modal are
//! independent consumers of the same backend truth.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use tracing::debug;

use crate::api::ApiClient;
use crate::quota::models::{days_until_reset, FeatureLimit, QuotaSnapshot, Tier, UsageLevel};

/// One rendered line of the usage table.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureUsageRow {
    pub feature: String,
    pub used: u64,
    pub limit: FeatureLimit,
    pub percent_used: f64,
    pub level: UsageLevel,
}

impl FeatureUsageRow {
    pub fn describe(&self) -> String {
        match self.limit {
            FeatureLimit::Unlimited => format!("{}: Unlimited", self.feature),
            FeatureLimit::Limited(limit) => format!(
                "{}: {}/{} ({:.0}%) [{}]",
                self.feature,
                self.used,
                limit,
                self.percent_used,
                self.level.label()
            ),
        }
    }
}

/// Everything the panel renders, derived from one snapshot at build time.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaView {
    pub tier: Tier,
    pub month: String,
    pub days_until_reset: i64,
    pub rows: Vec<FeatureUsageRow>,
}

impl QuotaView {
    /// `None` when the snapshot envelope reports failure (fail-soft).
    pub fn build(snapshot: QuotaSnapshot, now: chrono::DateTime<Utc>) -> Option<Self> {
        if !snapshot.success {
            return None;
        }
        let rows = snapshot
            .quotas
            .iter()
            .map(|(feature, quota)| FeatureUsageRow {
                feature: feature.clone(),
                used: quota.used,
                limit: quota.limit,
                percent_used: quota.percent_used(),
                level: quota.usage_level(),
            })
            .collect();
        Some(Self {
            tier: snapshot.tier,
            month: snapshot.month,
            days_until_reset: days_until_reset(snapshot.reset_date, now),
            rows,
        })
    }
}

/// The mounted panel. A generation counter guards against a stale in-flight
/// fetch writing its result after `unmount` or after a newer refresh began.
pub struct QuotaPanel {
    api: ApiClient,
    generation: AtomicU64,
    view: Mutex<Option<QuotaView>>,
}

impl QuotaPanel {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            generation: AtomicU64::new(0),
            view: Mutex::new(None),
        }
    }

    /// Refetch the snapshot and rebuild the view. On failure the view is
    /// cleared with no error surface; the panel is a secondary widget.
    pub async fn refresh(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.api.fetch_quota().await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("stale quota fetch discarded");
            return;
        }

        let view = match result {
            Ok(snapshot) => QuotaView::build(snapshot, Utc::now()),
            Err(e) => {
                debug!("quota fetch failed, rendering nothing: {e}");
                None
            }
        };
        *self.view.lock().expect("poisoned quota view lock") = view;
    }

    /// Discard the view and invalidate any in-flight refresh.
    pub fn unmount(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.view.lock().expect("poisoned quota view lock") = None;
    }

    pub fn current(&self) -> Option<QuotaView> {
        self.view.lock().expect("poisoned quota view lock").clone()
    }
}
