//! Quota data model — tiers, per-feature allowances, and the monthly snapshot
//! returned by the backend quota endpoint.
//!
//! A `QuotaSnapshot` is an immutable read-only copy per fetch: it is never
//! mutated client-side, only refetched wholesale. Derived values (remaining,
//! percent used, usage level) are recomputed locally from `limit`/`used` so a
//! backend rounding artifact cannot flip a row across a display boundary.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Features at or above this percentage of their limit render as near-limit.
pub const NEAR_LIMIT_PERCENT: f64 = 80.0;

/// Subscription tier. Ordered: `Free < Premium < Pro`, so "does this tier
/// satisfy the required tier" is a plain comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Premium,
    Pro,
}

impl Tier {
    /// Parse a tier string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "free" => Some(Self::Free),
            "premium" => Some(Self::Premium),
            "pro" => Some(Self::Pro),
            _ => None,
        }
    }

    /// Display name for user-facing output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Premium => "Premium",
            Self::Pro => "Pro",
        }
    }
}

/// A feature allowance: either a numeric monthly cap or unlimited.
///
/// Wire form is a JSON number or the string sentinel `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureLimit {
    Limited(u64),
    Unlimited,
}

impl<'de> Deserialize<'de> for FeatureLimit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Count(u64),
            Sentinel(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Count(n) => Ok(FeatureLimit::Limited(n)),
            Repr::Sentinel(s) if s.eq_ignore_ascii_case("unlimited") => Ok(FeatureLimit::Unlimited),
            Repr::Sentinel(s) => Err(de::Error::custom(format!("unknown limit sentinel: {s:?}"))),
        }
    }
}

impl Serialize for FeatureLimit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FeatureLimit::Limited(n) => serializer.serialize_u64(*n),
            FeatureLimit::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl fmt::Display for FeatureLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureLimit::Limited(n) => write!(f, "{n}"),
            FeatureLimit::Unlimited => write!(f, "Unlimited"),
        }
    }
}

/// Display classification of a feature's usage state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLevel {
    Normal,
    NearLimit,
    AtLimit,
    Unlimited,
}

impl UsageLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "ok",
            Self::NearLimit => "near limit",
            Self::AtLimit => "at limit",
            Self::Unlimited => "unlimited",
        }
    }
}

/// Monthly usage counter for a single feature.
///
/// The backend also reports `remaining` and `percentUsed`; those are dropped
/// at decode and recomputed here from the invariant
/// `remaining = max(0, limit - used)`, `percentUsed = clamp(100*used/limit)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FeatureQuota {
    pub limit: FeatureLimit,
    pub used: u64,
}

impl FeatureQuota {
    pub fn new(limit: FeatureLimit, used: u64) -> Self {
        Self { limit, used }
    }

    /// Allowance left this month. Always `Unlimited` for unlimited features.
    pub fn remaining(&self) -> FeatureLimit {
        match self.limit {
            FeatureLimit::Limited(limit) => FeatureLimit::Limited(limit.saturating_sub(self.used)),
            FeatureLimit::Unlimited => FeatureLimit::Unlimited,
        }
    }

    /// Share of the limit consumed, clamped to `[0, 100]`.
    /// A zero limit counts as fully used; unlimited features report 0.
    pub fn percent_used(&self) -> f64 {
        match self.limit {
            FeatureLimit::Limited(0) => 100.0,
            FeatureLimit::Limited(limit) => {
                (100.0 * self.used as f64 / limit as f64).clamp(0.0, 100.0)
            }
            FeatureLimit::Unlimited => 0.0,
        }
    }

    /// Classification: unlimited features are always available; otherwise
    /// at-limit when the allowance is exhausted, near-limit at 80%+.
    pub fn usage_level(&self) -> UsageLevel {
        match self.limit {
            FeatureLimit::Unlimited => UsageLevel::Unlimited,
            FeatureLimit::Limited(limit) => {
                if self.used >= limit {
                    UsageLevel::AtLimit
                } else if self.percent_used() >= NEAR_LIMIT_PERCENT {
                    UsageLevel::NearLimit
                } else {
                    UsageLevel::Normal
                }
            }
        }
    }
}

/// The full per-user quota state for the current month, as returned by
/// `GET /api/v1/quota`. Refetched wholesale on demand; never mutated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaSnapshot {
    #[serde(default = "default_true")]
    pub success: bool,
    pub tier: Tier,
    pub month: String,
    pub reset_date: DateTime<Utc>,
    pub quotas: BTreeMap<String, FeatureQuota>,
}

fn default_true() -> bool {
    true
}

/// Whole days until the quota resets, rounded up. Never negative: a reset
/// date already in the past (stale snapshot) clamps to 0.
pub fn days_until_reset(reset_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (reset_date - now).num_seconds();
    if secs <= 0 {
        0
    } else {
        (secs + 86_399) / 86_400
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_tier_parse() {
        assert_eq!(Tier::parse("free"), Some(Tier::Free));
        assert_eq!(Tier::parse("Premium"), Some(Tier::Premium));
        assert_eq!(Tier::parse("PRO"), Some(Tier::Pro));
        assert_eq!(Tier::parse("enterprise"), None);
        assert_eq!(Tier::parse(""), None);
    }

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Free < Tier::Premium);
        assert!(Tier::Premium < Tier::Pro);
    }

    #[test]
    fn test_limit_deserializes_number_and_sentinel() {
        let limited: FeatureLimit = serde_json::from_str("5").unwrap();
        assert_eq!(limited, FeatureLimit::Limited(5));

        let unlimited: FeatureLimit = serde_json::from_str("\"unlimited\"").unwrap();
        assert_eq!(unlimited, FeatureLimit::Unlimited);

        let shouty: FeatureLimit = serde_json::from_str("\"UNLIMITED\"").unwrap();
        assert_eq!(shouty, FeatureLimit::Unlimited);

        assert!(serde_json::from_str::<FeatureLimit>("\"infinite\"").is_err());
    }

    #[test]
    fn test_remaining_invariant() {
        let q = FeatureQuota::new(FeatureLimit::Limited(5), 3);
        assert_eq!(q.remaining(), FeatureLimit::Limited(2));

        // used beyond limit clamps to zero remaining, never underflows
        let over = FeatureQuota::new(FeatureLimit::Limited(5), 9);
        assert_eq!(over.remaining(), FeatureLimit::Limited(0));
    }

    #[test]
    fn test_percent_used_clamped() {
        let q = FeatureQuota::new(FeatureLimit::Limited(5), 4);
        assert!((q.percent_used() - 80.0).abs() < f64::EPSILON);

        let over = FeatureQuota::new(FeatureLimit::Limited(5), 9);
        assert!((over.percent_used() - 100.0).abs() < f64::EPSILON);

        let zero_limit = FeatureQuota::new(FeatureLimit::Limited(0), 0);
        assert!((zero_limit.percent_used() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_classification_boundaries() {
        let normal = FeatureQuota::new(FeatureLimit::Limited(5), 3);
        assert_eq!(normal.usage_level(), UsageLevel::Normal);

        // exactly 80% is near-limit
        let near = FeatureQuota::new(FeatureLimit::Limited(5), 4);
        assert_eq!(near.usage_level(), UsageLevel::NearLimit);

        let at = FeatureQuota::new(FeatureLimit::Limited(5), 5);
        assert_eq!(at.usage_level(), UsageLevel::AtLimit);
    }

    #[test]
    fn test_unlimited_is_always_unlimited() {
        let q = FeatureQuota::new(FeatureLimit::Unlimited, 1_000_000);
        assert_eq!(q.usage_level(), UsageLevel::Unlimited);
        assert_eq!(q.remaining(), FeatureLimit::Unlimited);
        assert_eq!(q.percent_used(), 0.0);
    }

    #[test]
    fn test_days_until_reset_rounds_up() {
        let now = Utc::now();
        // 3.4 days ahead displays as 4
        let reset = now + Duration::seconds((3.4 * 86_400.0) as i64);
        assert_eq!(days_until_reset(reset, now), 4);

        let exact = now + Duration::days(3);
        assert_eq!(days_until_reset(exact, now), 3);
    }

    #[test]
    fn test_days_until_reset_never_negative() {
        let now = Utc::now();
        let past = now - Duration::days(2);
        assert_eq!(days_until_reset(past, now), 0);
        assert_eq!(days_until_reset(now, now), 0);
    }

    #[test]
    fn test_snapshot_decode_is_idempotent() {
        let body = serde_json::json!({
            "success": true,
            "tier": "free",
            "month": "2026-08",
            "resetDate": "2026-09-01T00:00:00Z",
            "quotas": {
                "resumeAnalysis": { "limit": 5, "used": 3, "remaining": 2, "percentUsed": 60.0 },
                "careerChat": { "limit": "unlimited", "used": 42 }
            }
        })
        .to_string();

        let first: QuotaSnapshot = serde_json::from_str(&body).unwrap();
        let second: QuotaSnapshot = serde_json::from_str(&body).unwrap();
        assert_eq!(first, second);

        assert_eq!(first.tier, Tier::Free);
        let resume = &first.quotas["resumeAnalysis"];
        assert_eq!(resume.remaining(), FeatureLimit::Limited(2));
        assert_eq!(resume.usage_level(), UsageLevel::Normal);
        assert_eq!(first.quotas["careerChat"].usage_level(), UsageLevel::Unlimited);
    }
}
