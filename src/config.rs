use serde::Deserialize;

/// Immutable application configuration, loaded once at startup and passed
/// into components at construction. No ambient global state.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    /// Shared secret for webhook signature verification
    pub webhook_signing_secret: String,
    /// Payment processor API base URL
    pub processor_base_url: String,
    /// Payment processor API key
    pub processor_api_key: String,
    /// Per-charge call timeout in seconds; a timeout counts as a failed
    /// charge for that member, never a hang
    pub charge_timeout_secs: u64,
    /// Ceiling for authorization-request approvals, in currency minor units
    pub approval_ceiling_minor_units: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/splitpay".to_string()),
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            webhook_signing_secret: std::env::var("WEBHOOK_SIGNING_SECRET").map_err(|_| {
                config::ConfigError::NotFound("WEBHOOK_SIGNING_SECRET".to_string())
            })?,
            processor_base_url: std::env::var("PROCESSOR_BASE_URL")
                .unwrap_or_else(|_| "https://api.processor.example.com".to_string()),
            processor_api_key: std::env::var("PROCESSOR_API_KEY")
                .map_err(|_| config::ConfigError::NotFound("PROCESSOR_API_KEY".to_string()))?,
            charge_timeout_secs: std::env::var("CHARGE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            approval_ceiling_minor_units: std::env::var("APPROVAL_CEILING_MINOR_UNITS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50_000),
        })
    }
}
