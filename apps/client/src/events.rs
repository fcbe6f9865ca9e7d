//! Upgrade Notifier — the process-wide channel the API client publishes to
//! when a gated response is observed.
//!
//! This is an explicit typed publish/subscribe service (tokio broadcast)
//! rather than a platform-global event: subscription and unsubscription are
//! the lifetime of the receiver, so mounting is explicit and testable.
//! Events published while nobody is subscribed are dropped — the upgrade
//! modal is expected to be mounted at the application root before any gated
//! action can occur.

use tokio::sync::broadcast;
use tracing::debug;

use crate::quota::models::Tier;

const CHANNEL_CAPACITY: usize = 16;

/// Payload raised when a request is rejected by a quota or feature gate.
/// Consumed by whichever listener is mounted; not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeEvent {
    pub feature: Option<String>,
    pub upgrade_required: Option<Tier>,
    pub used: Option<u64>,
    pub limit: Option<u64>,
    pub current_tier: Tier,
}

#[derive(Clone)]
pub struct UpgradeNotifier {
    tx: broadcast::Sender<UpgradeEvent>,
}

impl UpgradeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Deliver `event` to every current subscriber, in emission order.
    pub fn publish(&self, event: UpgradeEvent) {
        if self.tx.send(event).is_err() {
            debug!("no upgrade listener mounted; event dropped");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UpgradeEvent> {
        self.tx.subscribe()
    }
}

impl Default for UpgradeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(feature: &str) -> UpgradeEvent {
        UpgradeEvent {
            feature: Some(feature.to_string()),
            upgrade_required: Some(Tier::Premium),
            used: None,
            limit: None,
            current_tier: Tier::Free,
        }
    }

    #[tokio::test]
    async fn test_events_delivered_in_emission_order() {
        let notifier = UpgradeNotifier::new();
        let mut rx = notifier.subscribe();

        notifier.publish(event("resumeAnalysis"));
        notifier.publish(event("videoInterview"));

        assert_eq!(rx.recv().await.unwrap().feature.as_deref(), Some("resumeAnalysis"));
        assert_eq!(rx.recv().await.unwrap().feature.as_deref(), Some("videoInterview"));
    }

    #[tokio::test]
    async fn test_publish_without_listener_is_dropped() {
        let notifier = UpgradeNotifier::new();
        // no subscriber mounted; must not panic or block
        notifier.publish(event("resumeAnalysis"));

        // a receiver subscribed afterwards sees nothing
        let mut rx = notifier.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
