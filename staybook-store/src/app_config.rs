use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: Backend,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
}

/// Which persistence and lock-store implementation the process runs on.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_lock_ttl")]
    pub room_lock_ttl_seconds: u64,
    #[serde(default = "default_service_fee_rate")]
    pub service_fee_rate: f64,
    /// Major currency units.
    #[serde(default = "default_min_service_fee")]
    pub min_service_fee: i64,
    #[serde(default = "default_sweep_seconds")]
    pub no_show_sweep_seconds: u64,
}

fn default_lock_ttl() -> u64 { 900 }
fn default_service_fee_rate() -> f64 { 0.01 }
fn default_min_service_fee() -> i64 { 500 }
fn default_sweep_seconds() -> u64 { 3600 }

impl BusinessRules {
    pub fn min_service_fee_minor(&self) -> i64 {
        self.min_service_fee * 100
    }
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            room_lock_ttl_seconds: default_lock_ttl(),
            service_fee_rate: default_service_fee_rate(),
            min_service_fee: default_min_service_fee(),
            no_show_sweep_seconds: default_sweep_seconds(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct PaymentsConfig {
    pub base_url: String,
    pub secret_key: String,
    pub webhook_secret: String,
    pub callback_base_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String { "NGN".into() }

impl std::fmt::Debug for PaymentsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentsConfig")
            .field("base_url", &self.base_url)
            .field("secret_key", &"********")
            .field("webhook_secret", &"********")
            .field("callback_base_url", &self.callback_base_url)
            .field("currency", &self.currency)
            .finish()
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in.
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `STAYBOOK_BACKEND=memory`, `STAYBOOK_DATABASE__URL=...`
            .add_source(
                config::Environment::with_prefix("STAYBOOK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
