//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use card_lobby::{AiOption, LobbyConfig, LobbyError};
use std::{collections::BTreeSet, net::SocketAddr, time::Duration};

/// Default bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Shortest accepted host token
pub const MIN_HOST_TOKEN_LEN: usize = 16;

/// Seconds a new socket has to say hello when `HELLO_TIMEOUT_SECS` is unset
pub const DEFAULT_HELLO_TIMEOUT_SECS: u64 = 10;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Seats and names of the hosted lobby
    pub lobby: LobbyConfig,
    /// Avatar of the host's own seat
    pub host_avatar: u32,
    /// Bearer token guarding the host-only endpoints (required)
    pub host_token: String,
    /// How long a new socket may take to send its hello
    pub hello_timeout: Duration,
    /// Prometheus listener, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Values given on the command line, which win over the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<SocketAddr>,
    pub slot_count: Option<usize>,
    pub ai_seats: Option<usize>,
    pub host_name: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    ///
    /// # Arguments
    ///
    /// * `overrides` - Values from CLI args
    /// * `lookup` - Returns the raw value of a variable, if set
    pub fn from_lookup<F>(overrides: CliOverrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_required_or("SERVER_BIND", &lookup, DEFAULT_BIND)?,
        };

        let metrics_bind = lookup("METRICS_BIND")
            .map(|value| {
                value.parse().map_err(|_| ConfigError::Invalid {
                    var: "METRICS_BIND".to_string(),
                    reason: format!("'{}' is not an IP:PORT address", value),
                })
            })
            .transpose()?;

        // Host token (REQUIRED)
        let host_token = lookup("HOST_TOKEN").ok_or_else(|| ConfigError::MissingRequired {
            var: "HOST_TOKEN".to_string(),
            hint: "Generate with: openssl rand -hex 16".to_string(),
        })?;

        let defaults = LobbyConfig::default();
        let ai_options = if parse_env_or("LOBBY_AI_SIMULATION", &lookup, false)? {
            BTreeSet::from([AiOption::UseSimulation])
        } else {
            BTreeSet::new()
        };

        let lobby = LobbyConfig {
            name: lookup("LOBBY_NAME").unwrap_or(defaults.name),
            host_name: overrides
                .host_name
                .or_else(|| lookup("LOBBY_HOST_NAME"))
                .unwrap_or(defaults.host_name),
            slot_count: match overrides.slot_count {
                Some(slot_count) => slot_count,
                None => parse_env_or("LOBBY_SLOTS", &lookup, defaults.slot_count)?,
            },
            ai_seats: match overrides.ai_seats {
                Some(ai_seats) => ai_seats,
                None => parse_env_or("LOBBY_AI_SEATS", &lookup, defaults.ai_seats)?,
            },
            ai_options,
        };

        Ok(ServerConfig {
            bind,
            lobby,
            host_avatar: parse_env_or("LOBBY_HOST_AVATAR", &lookup, 0)?,
            host_token,
            hello_timeout: Duration::from_secs(parse_env_or(
                "HELLO_TIMEOUT_SECS",
                &lookup,
                DEFAULT_HELLO_TIMEOUT_SECS,
            )?),
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host_token.len() < MIN_HOST_TOKEN_LEN {
            return Err(ConfigError::Invalid {
                var: "HOST_TOKEN".to_string(),
                reason: format!("Must be at least {} characters", MIN_HOST_TOKEN_LEN),
            });
        }

        if self.hello_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "HELLO_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from SERVER_BIND ({})", self.bind),
            });
        }

        self.lobby.validate()?;
        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error("Invalid lobby configuration: {0}")]
    Lobby(#[from] LobbyError),
}

/// Parse a variable, falling back to `default` only when it is unset
fn parse_env_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("Could not parse '{}'", raw),
        }),
        None => Ok(default),
    }
}

/// Like `parse_env_or`, with the default given as text
fn parse_required_or<T, F>(key: &str, lookup: &F, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("Could not parse '{}'", raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)], overrides: CliOverrides) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(overrides, |key| vars.get(key).cloned())
    }

    const TOKEN: (&str, &str) = ("HOST_TOKEN", "0123456789abcdef");

    #[test]
    fn test_defaults() {
        let config = load(&[TOKEN], CliOverrides::default()).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND.parse().unwrap());
        assert_eq!(config.lobby, LobbyConfig::default());
        assert_eq!(config.hello_timeout, Duration::from_secs(10));
        assert_eq!(config.metrics_bind, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_host_token() {
        let err = load(&[], CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref var, .. } if var == "HOST_TOKEN"));
    }

    #[test]
    fn test_short_host_token() {
        let config = load(&[("HOST_TOKEN", "short")], CliOverrides::default()).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_lobby_from_env() {
        let config = load(
            &[
                TOKEN,
                ("LOBBY_NAME", "Friday"),
                ("LOBBY_HOST_NAME", "Alice"),
                ("LOBBY_SLOTS", "4"),
                ("LOBBY_AI_SEATS", "1"),
                ("LOBBY_AI_SIMULATION", "true"),
            ],
            CliOverrides::default(),
        )
        .unwrap();

        assert_eq!(config.lobby.name, "Friday");
        assert_eq!(config.lobby.host_name, "Alice");
        assert_eq!(config.lobby.slot_count, 4);
        assert_eq!(config.lobby.ai_seats, 1);
        assert!(config.lobby.ai_options.contains(&AiOption::UseSimulation));
    }

    #[test]
    fn test_cli_overrides_win() {
        let overrides = CliOverrides {
            bind: Some("0.0.0.0:7000".parse().unwrap()),
            slot_count: Some(6),
            ai_seats: None,
            host_name: Some("Bob".to_string()),
        };
        let config = load(
            &[
                TOKEN,
                ("SERVER_BIND", "127.0.0.1:1"),
                ("LOBBY_SLOTS", "3"),
                ("LOBBY_HOST_NAME", "Alice"),
            ],
            overrides,
        )
        .unwrap();

        assert_eq!(config.bind.port(), 7000);
        assert_eq!(config.lobby.slot_count, 6);
        assert_eq!(config.lobby.host_name, "Bob");
    }

    #[test]
    fn test_invalid_bind_is_an_error() {
        let err = load(&[TOKEN, ("SERVER_BIND", "nowhere")], CliOverrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "SERVER_BIND"));
    }

    #[test]
    fn test_malformed_numbers_are_errors() {
        for var in [
            "LOBBY_SLOTS",
            "LOBBY_AI_SEATS",
            "LOBBY_HOST_AVATAR",
            "HELLO_TIMEOUT_SECS",
            "LOBBY_AI_SIMULATION",
        ] {
            let err = load(&[TOKEN, (var, "four")], CliOverrides::default()).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { var: ref bad, .. } if bad == var),
                "{} should be rejected",
                var
            );
        }
    }

    #[test]
    fn test_cli_override_skips_malformed_env() {
        let overrides = CliOverrides {
            slot_count: Some(3),
            ..CliOverrides::default()
        };
        let config = load(&[TOKEN, ("LOBBY_SLOTS", "four")], overrides).unwrap();
        assert_eq!(config.lobby.slot_count, 3);
    }

    #[test]
    fn test_lobby_validation_surfaces() {
        let config = load(&[TOKEN, ("LOBBY_SLOTS", "12")], CliOverrides::default()).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Lobby(_))));
    }

    #[test]
    fn test_metrics_bind_must_differ() {
        let config = load(
            &[
                TOKEN,
                ("SERVER_BIND", "127.0.0.1:9000"),
                ("METRICS_BIND", "127.0.0.1:9000"),
            ],
            CliOverrides::default(),
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "HOST_TOKEN".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("HOST_TOKEN"));
        assert!(msg.contains("Use openssl"));
    }
}
