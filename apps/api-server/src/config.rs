//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use blog_infra::JwtConfig;
use blog_infra::database::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the server on in-memory storage.
    pub database: Option<DatabaseConfig>,
    /// Apply pending schema migrations at startup.
    pub run_migrations: bool,
    pub jwt: JwtConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parse_or(env::var("DB_MAX_CONNECTIONS").ok(), 100),
            min_connections: parse_or(env::var("DB_MIN_CONNECTIONS").ok(), 10),
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or(env::var("PORT").ok(), 8080),
            database,
            run_migrations: env::var("RUN_MIGRATIONS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            jwt: JwtConfig::from_env(),
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
