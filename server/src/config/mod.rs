use std::env;
use std::net::SocketAddr;
use std::time::Duration;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::with_security_headers;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub reconcile_interval: Duration,
    /// Enables HSTS.
    pub production: bool,
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr: SocketAddr = parse_or("BIND_ADDR", &lookup, || {
            DEFAULT_BIND_ADDR.parse().map_err(|_| ConfigError::Invalid {
                name: "BIND_ADDR",
                value: DEFAULT_BIND_ADDR.to_string(),
            })
        })?;
        let max_connections: u32 =
            parse_or("DATABASE_MAX_CONNECTIONS", &lookup, || Ok(DEFAULT_MAX_CONNECTIONS))?;
        let interval_secs: u64 = parse_or("RECONCILE_INTERVAL_SECS", &lookup, || {
            Ok(DEFAULT_RECONCILE_INTERVAL_SECS)
        })?;
        if interval_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "RECONCILE_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        let production = lookup("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);
        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string());

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            reconcile_interval: Duration::from_secs(interval_secs),
            production,
            cors_allowed_origins,
        })
    }
}

fn parse_or<T, F, D>(name: &'static str, lookup: &F, default: D) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
    D: FnOnce() -> Result<T, ConfigError>,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://db/backoffice")]))
            .unwrap();
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.reconcile_interval, Duration::from_secs(60));
        assert!(!config.production);
        assert_eq!(config.cors_allowed_origins, DEFAULT_ALLOWED_ORIGINS);
    }

    #[test]
    fn test_database_url_is_required() {
        let result = Config::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/backoffice"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("RECONCILE_INTERVAL_SECS", "15"),
            ("RUST_ENV", "Production"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.reconcile_interval, Duration::from_secs(15));
        assert!(config.production);

        let zero = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/backoffice"),
            ("RECONCILE_INTERVAL_SECS", "0"),
        ]));
        assert!(matches!(zero, Err(ConfigError::Invalid { .. })));

        let garbage = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/backoffice"),
            ("DATABASE_MAX_CONNECTIONS", "many"),
        ]));
        assert!(matches!(garbage, Err(ConfigError::Invalid { .. })));
    }
}
