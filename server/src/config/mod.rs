use std::env;
use std::net::SocketAddr;

use thiserror::Error;

use crate::auth::password::{DEFAULT_COST, MAX_COST, MIN_COST};
use crate::auth::token::{DEFAULT_ACCESS_TOKEN_VALIDITY_SECS, DEFAULT_REFRESH_TOKEN_VALIDITY_SECS};

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/events";
const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
const MAX_TOKEN_VALIDITY_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    Postgres { database_url: String },
    Memory,
}

/// Seeded accounts and the OAuth client allowed to request tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppProperties {
    pub admin_username: String,
    pub admin_password: String,
    pub user_username: String,
    pub user_password: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub storage: Storage,
    pub production: bool,
    pub cors_allowed_origins: Vec<String>,
    pub access_token_validity_secs: i64,
    pub refresh_token_validity_secs: i64,
    /// bcrypt work factor for stored passwords and the client secret.
    pub password_cost: u32,
    pub app: AppProperties,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source; `from_env` passes the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let server_addr_raw = var("SERVER_ADDR", DEFAULT_SERVER_ADDR);
        let server_addr = server_addr_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "SERVER_ADDR",
            value: server_addr_raw.clone(),
        })?;

        let storage = match var("STORAGE", "postgres").to_lowercase().as_str() {
            "postgres" => Storage::Postgres {
                database_url: var("DATABASE_URL", DEFAULT_DATABASE_URL),
            },
            "memory" => Storage::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE",
                    value: other.to_string(),
                })
            }
        };

        let production = lookup("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS", DEFAULT_ALLOWED_ORIGINS)
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let seconds = |name: &'static str, default: i64| -> Result<i64, ConfigError> {
            match lookup(name) {
                None => Ok(default),
                Some(raw) => raw
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|secs| (1..=MAX_TOKEN_VALIDITY_SECS).contains(secs))
                    .ok_or(ConfigError::Invalid { name, value: raw }),
            }
        };

        let password_cost = match lookup("BCRYPT_COST") {
            None => DEFAULT_COST,
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|cost| (MIN_COST..=MAX_COST).contains(cost))
                .ok_or(ConfigError::Invalid {
                    name: "BCRYPT_COST",
                    value: raw,
                })?,
        };

        let required = |name: &'static str, default: &str| -> Result<String, ConfigError> {
            let value = var(name, default);
            if value.trim().is_empty() {
                Err(ConfigError::Empty(name))
            } else {
                Ok(value)
            }
        };

        Ok(Self {
            server_addr,
            storage,
            production,
            cors_allowed_origins,
            access_token_validity_secs: seconds(
                "ACCESS_TOKEN_VALIDITY_SECS",
                DEFAULT_ACCESS_TOKEN_VALIDITY_SECS,
            )?,
            refresh_token_validity_secs: seconds(
                "REFRESH_TOKEN_VALIDITY_SECS",
                DEFAULT_REFRESH_TOKEN_VALIDITY_SECS,
            )?,
            password_cost,
            app: AppProperties {
                admin_username: required("APP_ADMIN_USERNAME", "admin@email.com")?,
                admin_password: required("APP_ADMIN_PASSWORD", "admin")?,
                user_username: required("APP_USER_USERNAME", "user@email.com")?,
                user_password: required("APP_USER_PASSWORD", "user")?,
                client_id: required("APP_CLIENT_ID", "myApp")?,
                client_secret: required("APP_CLIENT_SECRET", "pass")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.server_addr.port(), 3001);
        assert_eq!(
            config.storage,
            Storage::Postgres {
                database_url: DEFAULT_DATABASE_URL.to_string()
            }
        );
        assert!(!config.production);
        assert_eq!(config.cors_allowed_origins.len(), 2);
        assert_eq!(config.access_token_validity_secs, 600);
        assert_eq!(config.app.client_id, "myApp");
        assert_eq!(config.password_cost, DEFAULT_COST);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("STORAGE", "memory"),
            ("RUST_ENV", "Production"),
            ("CORS_ALLOWED_ORIGINS", " https://a.example , ,https://b.example"),
            ("ACCESS_TOKEN_VALIDITY_SECS", "60"),
        ])
        .unwrap();

        assert_eq!(config.storage, Storage::Memory);
        assert!(config.production);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.access_token_validity_secs, 60);
    }

    #[test]
    fn test_token_validity_accepts_one_year() {
        let config = config(&[("REFRESH_TOKEN_VALIDITY_SECS", "31536000")]).unwrap();
        assert_eq!(config.refresh_token_validity_secs, MAX_TOKEN_VALIDITY_SECS);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("APP_CLIENT_SECRET", " ")]),
            Err(ConfigError::Empty("APP_CLIENT_SECRET"))
        ));
        assert!(matches!(
            config(&[("ACCESS_TOKEN_VALIDITY_SECS", "-5")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            config(&[("REFRESH_TOKEN_VALIDITY_SECS", "9223372036854775807")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            config(&[("ACCESS_TOKEN_VALIDITY_SECS", "31536001")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            config(&[("BCRYPT_COST", "3")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            config(&[("STORAGE", "redis")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            config(&[("SERVER_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
