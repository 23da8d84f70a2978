use std::fmt::Display;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

use crate::crypto::PBKDF2_ITERATIONS;

/// Application-level constants
pub const APP_NAME: &str = "VitalSync";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SESSION_TTL_HOURS: i64 = 168;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Cannot determine a data directory; set VITALSYNC_DATABASE")]
    NoDataDir,
}

/// Runtime configuration, read from the environment once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_path: PathBuf,
    /// Enforce bearer sessions on data routes.
    pub require_auth: bool,
    pub session_ttl_hours: i64,
    /// Cost factor for newly hashed passwords.
    pub pbkdf2_iterations: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = match lookup("VITALSYNC_DATABASE") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_database_path()?,
        };

        let config = Self {
            host: parse_or(&lookup, "VITALSYNC_HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            database_path,
            require_auth: parse_bool_or(&lookup, "VITALSYNC_REQUIRE_AUTH", false)?,
            session_ttl_hours: parse_or(
                &lookup,
                "VITALSYNC_SESSION_TTL_HOURS",
                DEFAULT_SESSION_TTL_HOURS,
            )?,
            pbkdf2_iterations: parse_or(&lookup, "VITALSYNC_PBKDF2_ITERATIONS", PBKDF2_ITERATIONS)?,
        };

        if config.session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "VITALSYNC_SESSION_TTL_HOURS",
                value: config.session_ttl_hours.to_string(),
                reason: "must be positive".into(),
            });
        }
        if config.pbkdf2_iterations == 0 {
            return Err(ConfigError::Invalid {
                key: "VITALSYNC_PBKDF2_ITERATIONS",
                value: "0".into(),
                reason: "must be positive".into(),
            });
        }
        if config.pbkdf2_iterations < PBKDF2_ITERATIONS {
            warn!(
                iterations = config.pbkdf2_iterations,
                "PBKDF2 iteration count below the recommended {PBKDF2_ITERATIONS}"
            );
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn parse_bool_or<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("1" | "true" | "TRUE" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "FALSE" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            key,
            value: other.to_string(),
            reason: "expected true/false".into(),
        }),
    }
}

/// Get the application data directory
/// ~/VitalSync/ on all platforms
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

fn default_database_path() -> Result<PathBuf, ConfigError> {
    app_data_dir()
        .map(|dir| dir.join("vitalsync.db"))
        .ok_or(ConfigError::NoDataDir)
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "vitalsync_lib=info,vitalsync=info,tower_http=info"
}

#[cfg(test)]
pub(crate) fn test_config(database_path: PathBuf) -> Config {
    Config {
        host: IpAddr::from([127, 0, 0, 1]),
        port: 0,
        database_path,
        require_auth: false,
        session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        pbkdf2_iterations: 1_000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup_from(&[("VITALSYNC_DATABASE", "/tmp/v.db")])).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.host, IpAddr::from([0, 0, 0, 0]));
        assert!(!config.require_auth);
        assert_eq!(config.session_ttl_hours, 168);
        assert_eq!(config.pbkdf2_iterations, PBKDF2_ITERATIONS);
        assert_eq!(config.database_path, PathBuf::from("/tmp/v.db"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("VITALSYNC_DATABASE", "/tmp/v.db"),
            ("PORT", "8080"),
            ("VITALSYNC_HOST", "127.0.0.1"),
            ("VITALSYNC_REQUIRE_AUTH", "true"),
            ("VITALSYNC_SESSION_TTL_HOURS", "12"),
            ("VITALSYNC_PBKDF2_ITERATIONS", "700000"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address().to_string(), "127.0.0.1:8080");
        assert!(config.require_auth);
        assert_eq!(config.session_ttl_hours, 12);
        assert_eq!(config.pbkdf2_iterations, 700_000);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let result = Config::from_lookup(lookup_from(&[
            ("VITALSYNC_DATABASE", "/tmp/v.db"),
            ("PORT", "eighty"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { key: "PORT", .. })));
    }

    #[test]
    fn invalid_bool_is_an_error() {
        let result = Config::from_lookup(lookup_from(&[
            ("VITALSYNC_DATABASE", "/tmp/v.db"),
            ("VITALSYNC_REQUIRE_AUTH", "maybe"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("VITALSYNC_DATABASE", "/tmp/v.db"),
            ("VITALSYNC_SESSION_TTL_HOURS", "0"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn app_data_dir_under_home() {
        if let (Some(dir), Some(home)) = (app_data_dir(), dirs::home_dir()) {
            assert!(dir.starts_with(home));
            assert!(dir.ends_with("VitalSync"));
        }
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
