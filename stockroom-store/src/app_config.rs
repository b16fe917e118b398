use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub orders: OrdersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 3 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,
}

fn default_token_ttl() -> u64 { 900 }

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OrdersConfig {
    /// Placements still uncommitted after this long are cancelled
    pub placement_timeout_ms: Option<u64>,
}

impl OrdersConfig {
    pub fn placement_timeout(&self) -> Option<Duration> {
        self.placement_timeout_ms.map(Duration::from_millis)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(Path::new("config"))
    }

    /// Layered load from `dir`: `default`, then `$RUN_MODE`, then `local`, then `STOCKROOM__*` env vars
    pub fn load_from(dir: &Path) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let layer = |name: &str| dir.join(name).to_string_lossy().into_owned();

        let s = config::Config::builder()
            .add_source(config::File::with_name(&layer("default")))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&layer(&run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name(&layer("local")).required(false))
            // e.g. `STOCKROOM__DATABASE__BACKEND=memory`
            .add_source(config::Environment::with_prefix("STOCKROOM").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
