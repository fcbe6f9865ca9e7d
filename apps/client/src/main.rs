mod api;
mod auth;
mod config;
mod errors;
mod events;
mod modal;
mod nav;
mod notices;
mod quota;
mod subscription;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::ApiClient;
use crate::auth::StaticSession;
use crate::config::Config;
use crate::events::UpgradeNotifier;
use crate::nav::{Navigator, TracingNavigator};
use crate::notices::{NoticeSink, TracingNotices};
use crate::quota::panel::QuotaPanel;
use crate::subscription::SubscriptionPanel;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("careercraft_client={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CareerCraft dashboard v{}", env!("CARGO_PKG_VERSION"));

    let session = Arc::new(StaticSession::new(config.auth_token.clone(), config.tier));
    let notifier = UpgradeNotifier::new();
    let notices: Arc<dyn NoticeSink> = Arc::new(TracingNotices);
    let navigator: Arc<dyn Navigator> = Arc::new(TracingNavigator);

    let api = ApiClient::new(
        config.api_base_url.clone(),
        session,
        notifier.clone(),
        notices,
        navigator,
    );
    info!("API client initialized ({})", config.api_base_url);

    // Mount the upgrade modal at the root before any request can raise an
    // upgrade event — unmounted listeners miss events by design.
    let modal = modal::mount(&notifier);

    let panel = QuotaPanel::new(api.clone());
    if api.is_authenticated().await {
        panel.refresh().await;
    } else {
        info!("no auth token configured; skipping quota fetch");
    }

    match panel.current() {
        Some(view) => {
            println!(
                "{} plan — {} — resets in {} day(s)",
                view.tier.display_name(),
                view.month,
                view.days_until_reset
            );
            for row in &view.rows {
                println!("  {}", row.describe());
            }
        }
        None => println!("Quota unavailable."),
    }

    let subscription = SubscriptionPanel::new(api.clone());
    match subscription.load().await {
        Ok(sub) => println!("Subscription: {}", sub.summary()),
        Err(e) => info!("subscription fetch failed: {e}"),
    }

    // If any of the calls above hit a gate, the modal is holding the prompt.
    if let Some(prompt) = modal.with(|m| m.prompt().cloned()) {
        println!("{}", prompt.headline());
    }

    modal.unmount();
    Ok(())
}
