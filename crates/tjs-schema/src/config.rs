//! # Resolver Configuration
//!
//! Knobs for remote schema retrieval. Every field has a default that
//! reproduces the plain behavior: remote references allowed, no timeout
//! beyond the HTTP client's own default.
//!
//! ## Environment
//!
//! | Variable                | Field          |
//! |-------------------------|----------------|
//! | `TJS_ALLOW_REMOTE`      | `allow_remote` |
//! | `TJS_HTTP_TIMEOUT_SECS` | `timeout_secs` |
//! | `TJS_USER_AGENT`        | `user_agent`   |

use serde::{Deserialize, Serialize};
use thiserror::Error;

const ENV_ALLOW_REMOTE: &str = "TJS_ALLOW_REMOTE";
const ENV_TIMEOUT_SECS: &str = "TJS_HTTP_TIMEOUT_SECS";
const ENV_USER_AGENT: &str = "TJS_USER_AGENT";

/// Configuration error.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be parsed.
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Configuration for schema retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Allow `http://` and `https://` references (default: true).
    pub allow_remote: bool,
    /// Per-request timeout in seconds. `None` keeps the client default.
    pub timeout_secs: Option<u64>,
    /// `User-Agent` header sent with remote fetches.
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            allow_remote: true,
            timeout_secs: None,
            user_agent: concat!("tera-jsonschema/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ResolverConfig {
    /// Defaults overridden by `TJS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_ALLOW_REMOTE) {
            config.allow_remote = parse_flag(ENV_ALLOW_REMOTE, &value)?;
        }

        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            let secs = value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    var: ENV_TIMEOUT_SECS,
                    value: value.clone(),
                    reason: "expected a whole number of seconds",
                })?;
            config.timeout_secs = Some(secs);
        }

        if let Some(value) = lookup(ENV_USER_AGENT) {
            if !value.trim().is_empty() {
                config.user_agent = value;
            }
        }

        Ok(config)
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "expected a boolean",
        }),
    }
}
