//! Upgrade modal — the upsell surface driven by the upgrade notifier.
//!
//! Pure renderer of the last received payload; it never fetches data.
//! State machine: Closed -> Open(prompt) on event -> Closed on dismiss or
//! upgrade-click. A second event while open simply overwrites the displayed
//! prompt (last-write-wins, no queue).

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::events::{UpgradeEvent, UpgradeNotifier};
use crate::nav::{Navigator, PLANS_ROUTE};
use crate::quota::models::Tier;

/// Display fallback when a gated response named no feature.
pub const FALLBACK_FEATURE: &str = "this feature";

/// What the modal shows: the event payload with display defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradePrompt {
    pub feature: String,
    pub upgrade_required: Tier,
    pub used: Option<u64>,
    pub limit: Option<u64>,
    pub current_tier: Tier,
}

impl From<UpgradeEvent> for UpgradePrompt {
    fn from(event: UpgradeEvent) -> Self {
        Self {
            feature: event.feature.unwrap_or_else(|| FALLBACK_FEATURE.to_string()),
            upgrade_required: event.upgrade_required.unwrap_or(Tier::Premium),
            used: event.used,
            limit: event.limit,
            current_tier: event.current_tier,
        }
    }
}

impl UpgradePrompt {
    pub fn headline(&self) -> String {
        format!(
            "Upgrade to {} to keep using {}",
            self.upgrade_required.display_name(),
            self.feature
        )
    }
}

#[derive(Debug, Default)]
pub enum ModalState {
    #[default]
    Closed,
    Open(UpgradePrompt),
}

#[derive(Debug, Default)]
pub struct UpgradeModal {
    state: ModalState,
}

impl UpgradeModal {
    /// Open with this event's payload, overwriting any prompt already shown.
    pub fn on_event(&mut self, event: UpgradeEvent) {
        self.state = ModalState::Open(event.into());
    }

    pub fn dismiss(&mut self) {
        self.state = ModalState::Closed;
    }

    /// Pure navigation — quota truth is refetched by the destination page,
    /// nothing is mutated here.
    pub fn upgrade_now(&mut self, navigator: &dyn Navigator) {
        navigator.navigate(PLANS_ROUTE);
        self.state = ModalState::Closed;
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ModalState::Open(_))
    }

    pub fn prompt(&self) -> Option<&UpgradePrompt> {
        match &self.state {
            ModalState::Open(prompt) => Some(prompt),
            ModalState::Closed => None,
        }
    }
}

/// The mounted modal: a listener task feeding a shared state machine.
pub struct ModalHandle {
    inner: Arc<Mutex<UpgradeModal>>,
    task: JoinHandle<()>,
}

/// Subscribe to the notifier and drive the modal from its events. Mount this
/// once at the application root, before any gated action can occur.
pub fn mount(notifier: &UpgradeNotifier) -> ModalHandle {
    let inner = Arc::new(Mutex::new(UpgradeModal::default()));
    let modal = Arc::clone(&inner);
    let mut rx = notifier.subscribe();

    let task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    info!(feature = ?event.feature, "upgrade prompt raised");
                    modal.lock().expect("poisoned modal lock").on_event(event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    // last-write-wins: skipped prompts would have been
                    // overwritten anyway
                    warn!("modal listener lagged, skipped {skipped} events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    ModalHandle { inner, task }
}

impl ModalHandle {
    pub fn with<R>(&self, f: impl FnOnce(&mut UpgradeModal) -> R) -> R {
        f(&mut self.inner.lock().expect("poisoned modal lock"))
    }

    pub fn unmount(self) {
        self.task.abort();
    }
}
