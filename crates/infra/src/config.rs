//! Configuration loading and representation.

use std::time::Duration;

use thiserror::Error;

pub const STORE_VAR: &str = "ORDERDESK_STORE";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const MAX_CONNECTIONS_VAR: &str = "ORDERDESK_DB_MAX_CONNECTIONS";
pub const ACQUIRE_TIMEOUT_VAR: &str = "ORDERDESK_DB_ACQUIRE_TIMEOUT_SECS";

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Which store backend to run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    Postgres(PostgresConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// `ORDERDESK_STORE` defaults to `memory`; the Postgres variables are only
    /// read when it is `postgres`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = lookup(STORE_VAR).unwrap_or_else(|| "memory".to_string());
        match backend.trim() {
            "memory" => Ok(StoreConfig::Memory),
            "postgres" => {
                let database_url = lookup(DATABASE_URL_VAR)
                    .filter(|v| !v.trim().is_empty())
                    .ok_or(ConfigError::Missing(DATABASE_URL_VAR))?;
                let max_connections =
                    parse_or(&lookup, MAX_CONNECTIONS_VAR, DEFAULT_MAX_CONNECTIONS)?;
                if max_connections == 0 {
                    return Err(ConfigError::Invalid {
                        var: MAX_CONNECTIONS_VAR,
                        value: "0".to_string(),
                    });
                }
                let timeout_secs =
                    parse_or(&lookup, ACQUIRE_TIMEOUT_VAR, DEFAULT_ACQUIRE_TIMEOUT_SECS)?;
                Ok(StoreConfig::Postgres(PostgresConfig {
                    database_url,
                    max_connections,
                    acquire_timeout: Duration::from_secs(timeout_secs),
                }))
            }
            other => Err(ConfigError::Invalid {
                var: STORE_VAR,
                value: other.to_string(),
            }),
        }
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_memory() {
        assert_eq!(StoreConfig::from_lookup(lookup(&[])), Ok(StoreConfig::Memory));
    }

    #[test]
    fn postgres_reads_url_and_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[
            (STORE_VAR, "postgres"),
            (DATABASE_URL_VAR, "postgres://localhost/orderdesk"),
        ]))
        .unwrap();
        assert_eq!(
            config,
            StoreConfig::Postgres(PostgresConfig {
                database_url: "postgres://localhost/orderdesk".to_string(),
                max_connections: 5,
                acquire_timeout: Duration::from_secs(3),
            })
        );
    }

    #[test]
    fn postgres_requires_url() {
        assert_eq!(
            StoreConfig::from_lookup(lookup(&[(STORE_VAR, "postgres")])),
            Err(ConfigError::Missing(DATABASE_URL_VAR))
        );
    }

    #[test]
    fn rejects_bad_numbers_and_backends() {
        let err = StoreConfig::from_lookup(lookup(&[
            (STORE_VAR, "postgres"),
            (DATABASE_URL_VAR, "postgres://x"),
            (MAX_CONNECTIONS_VAR, "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: MAX_CONNECTIONS_VAR, .. }));

        let err = StoreConfig::from_lookup(lookup(&[(STORE_VAR, "sqlite")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: STORE_VAR, .. }));
    }
}
