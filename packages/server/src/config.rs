use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::MqAppConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    /// Connection pool bounds. Defaults suit a single API instance against a
    /// local Postgres; shrink max_connections when running many replicas.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    100
}

fn default_min_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// URLs embedded in generated artifacts (QR payloads, email links).
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Base URL for package tracking links baked into QR codes.
    pub tracking_base_url: String,
    /// Base URL of the frontend, used for login/reset links in emails.
    pub frontend_url: String,
}

/// Pagination caps for list endpoints. These are operational knobs, not an
/// API contract.
#[derive(Debug, Deserialize, Clone)]
pub struct PaginationConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub client: ClientConfig,
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub mq: MqAppConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("client.tracking_base_url", "https://traceability-app.com")?
            .set_default("client.frontend_url", "http://localhost:5173")?
            .set_default("pagination.default_limit", 10)?
            .set_default("pagination.max_limit", 10000)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., AGRITRACE__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("AGRITRACE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_pool_bounds_default_when_absent() {
        let cfg: DatabaseConfig =
            serde_json::from_value(serde_json::json!({"url": "postgres://localhost/agritrace"}))
                .unwrap();
        assert_eq!(cfg.max_connections, 100);
        assert_eq!(cfg.min_connections, 5);
    }

    #[test]
    fn database_pool_bounds_are_overridable() {
        let cfg: DatabaseConfig = serde_json::from_value(serde_json::json!({
            "url": "postgres://localhost/agritrace",
            "max_connections": 20,
            "min_connections": 2
        }))
        .unwrap();
        assert_eq!(cfg.max_connections, 20);
        assert_eq!(cfg.min_connections, 2);
    }
}
