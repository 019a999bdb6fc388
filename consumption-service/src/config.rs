use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_access_ttl_hours")]
    pub access_token_ttl_hours: i64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_token_ttl_days: i64,
}

fn default_access_ttl_hours() -> i64 {
    24
}

fn default_refresh_ttl_days() -> i64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub auth: AuthConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path =
            env::var("CONSUMPTION_CONFIG").unwrap_or_else(|_| "consumption-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        let cfg: AppConfig = toml::from_str(&contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config_with_ttl_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [database]
            uri = "postgresql://localhost/consumption"
            max_connections = 5

            [http]
            bind_addr = "127.0.0.1:8080"

            [auth]
            jwt_secret = "not-a-real-secret"

            [metrics]
            bind_addr = "127.0.0.1:9100"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.auth.access_token_ttl_hours, 24);
        assert_eq!(cfg.auth.refresh_token_ttl_days, 30);
        assert!(cfg.metrics.is_some());
    }

    #[test]
    fn metrics_section_is_optional() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [database]
            uri = "postgresql://localhost/consumption"
            max_connections = 5

            [http]
            bind_addr = "127.0.0.1:8080"

            [auth]
            jwt_secret = "not-a-real-secret"
            access_token_ttl_hours = 1
            "#,
        )
        .unwrap();

        assert!(cfg.metrics.is_none());
        assert_eq!(cfg.auth.access_token_ttl_hours, 1);
    }
}
