//! Process configuration, read from environment variables.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `ARENA_BIND_ADDR` | `0.0.0.0:8080` | HTTP listen address |
//! | `USE_PERSISTENT_STORES` | `false` | Use Postgres instead of the in-memory store |
//! | `DATABASE_URL` | (none) | Required when persistent |
//! | `DATABASE_MAX_CONNECTIONS` | `10` | Pool size when persistent |
//! | `SEED_DEMO_DATA` | `true` in-memory, `false` persistent | Insert demo heroes/enemies at startup |

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is required when USE_PERSISTENT_STORES=true")]
    Missing { name: &'static str },

    #[error("{name}='{value}' is invalid: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Where heroes and enemies live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    InMemory,
    Postgres { url: String, max_connections: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
    pub seed_demo_data: bool,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup` (used by tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup("ARENA_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            name: "ARENA_BIND_ADDR",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let persistent = parse_bool("USE_PERSISTENT_STORES", lookup("USE_PERSISTENT_STORES"))?
            .unwrap_or(false);

        let storage = if persistent {
            let url = lookup("DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing {
                    name: "DATABASE_URL",
                })?;
            let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
                None => DEFAULT_MAX_CONNECTIONS,
                Some(raw) => match raw.trim().parse::<u32>() {
                    Ok(n) if n > 0 => n,
                    Ok(_) => {
                        return Err(ConfigError::Invalid {
                            name: "DATABASE_MAX_CONNECTIONS",
                            value: raw,
                            reason: "must be at least 1".to_string(),
                        });
                    }
                    Err(e) => {
                        return Err(ConfigError::Invalid {
                            name: "DATABASE_MAX_CONNECTIONS",
                            value: raw,
                            reason: e.to_string(),
                        });
                    }
                },
            };
            StorageConfig::Postgres {
                url,
                max_connections,
            }
        } else {
            StorageConfig::InMemory
        };

        let seed_demo_data =
            parse_bool("SEED_DEMO_DATA", lookup("SEED_DEMO_DATA"))?.unwrap_or(!persistent);

        Ok(Self {
            bind_addr,
            storage,
            seed_demo_data,
        })
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.storage, StorageConfig::Postgres { .. })
    }
}

fn parse_bool(name: &'static str, raw: Option<String>) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" | "" => Ok(Some(false)),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw,
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_are_in_memory_with_seeding() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(cfg.storage, StorageConfig::InMemory);
        assert!(cfg.seed_demo_data);
        assert!(!cfg.is_persistent());
    }

    #[test]
    fn persistent_requires_database_url() {
        let err = config(&[("USE_PERSISTENT_STORES", "true")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing { name: "DATABASE_URL" });
    }

    #[test]
    fn persistent_reads_pool_settings_and_disables_seeding() {
        let cfg = config(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://arena@localhost/arena"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ])
        .unwrap();
        assert_eq!(
            cfg.storage,
            StorageConfig::Postgres {
                url: "postgres://arena@localhost/arena".to_string(),
                max_connections: 4,
            }
        );
        assert!(!cfg.seed_demo_data);
    }

    #[test]
    fn explicit_seed_flag_overrides_default() {
        let cfg = config(&[("SEED_DEMO_DATA", "false")]).unwrap();
        assert!(!cfg.seed_demo_data);
    }

    #[test]
    fn garbage_values_are_rejected() {
        assert!(matches!(
            config(&[("ARENA_BIND_ADDR", "not-an-addr")]),
            Err(ConfigError::Invalid { name: "ARENA_BIND_ADDR", .. })
        ));
        assert!(matches!(
            config(&[("USE_PERSISTENT_STORES", "maybe")]),
            Err(ConfigError::Invalid { name: "USE_PERSISTENT_STORES", .. })
        ));
        assert!(matches!(
            config(&[
                ("USE_PERSISTENT_STORES", "true"),
                ("DATABASE_URL", "postgres://x"),
                ("DATABASE_MAX_CONNECTIONS", "0"),
            ]),
            Err(ConfigError::Invalid { name: "DATABASE_MAX_CONNECTIONS", .. })
        ));
    }
}
