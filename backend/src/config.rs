//! Runtime configuration from the environment.
//!
//! | Variable              | Default                     |
//! |-----------------------|-----------------------------|
//! | `INGEST_API_URL`      | `http://localhost:8080/api` |
//! | `INGEST_API_TOKEN`    | unset                       |
//! | `INGEST_PORT`         | `3000`                      |
//! | `INGEST_TIMEOUT_SECS` | `30`                        |
//! | `INGEST_STRICT`       | `false`                     |

use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the curriculum REST API, without trailing slash.
    pub api_url: String,
    /// Bearer token sent with bulk imports.
    pub api_token: Option<String>,
    pub port: u16,
    pub timeout: Duration,
    /// Default for [`IngestOptions::strict`](crate::transform::IngestOptions::strict).
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            strict: false,
        }
    }
}

impl Config {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let api_url = get("INGEST_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        let port = match get("INGEST_PORT") {
            Some(raw) => parse_value("INGEST_PORT", &raw)?,
            None => defaults.port,
        };

        let timeout = match get("INGEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_value("INGEST_TIMEOUT_SECS", &raw)?),
            None => defaults.timeout,
        };

        let strict = match get("INGEST_STRICT") {
            Some(raw) => parse_flag("INGEST_STRICT", &raw)?,
            None => defaults.strict,
        };

        Ok(Self {
            api_url,
            api_token: get("INGEST_API_TOKEN"),
            port,
            timeout,
            strict,
        })
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> ConfigResult<T> {
    raw.parse().map_err(|_| invalid(key, raw))
}

fn parse_flag(key: &str, raw: &str) -> ConfigResult<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw)),
    }
}

fn invalid(key: &str, raw: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
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
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_url, "http://localhost:8080/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("INGEST_API_URL", "https://curriculum.example.edu/api/"),
            ("INGEST_API_TOKEN", "secret"),
            ("INGEST_PORT", "8088"),
            ("INGEST_TIMEOUT_SECS", "5"),
            ("INGEST_STRICT", "Yes"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://curriculum.example.edu/api");
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.port, 8088);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.strict);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = Config::from_lookup(lookup(&[("INGEST_API_TOKEN", "  "), ("INGEST_PORT", "")])).unwrap();
        assert_eq!(config.api_token, None);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup(&[("INGEST_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("INGEST_PORT"));
    }

    #[test]
    fn test_invalid_flag() {
        assert!(Config::from_lookup(lookup(&[("INGEST_STRICT", "maybe")])).is_err());
    }
}
