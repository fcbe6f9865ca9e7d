use anyhow::Result;

use crate::quota::models::Tier;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    /// Bearer token for the backend; absent means unauthenticated.
    pub auth_token: Option<String>,
    /// Tier of the signed-in user, when known at startup. Carried onto
    /// upgrade events instead of assuming free.
    pub tier: Option<Tier>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            api_base_url: std::env::var("CAREERCRAFT_API_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            auth_token: std::env::var("CAREERCRAFT_AUTH_TOKEN").ok(),
            tier: std::env::var("CAREERCRAFT_TIER")
                .ok()
                .and_then(|t| Tier::parse(&t)),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
