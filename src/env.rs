//! Environment variable names used by this crate for convenient
//! configuration of the console stream from microservices.
//!
//! These are purely helpers; [`StreamConfig`](crate::stream::StreamConfig)
//! itself never reads the environment.

use crate::error::ConfigError;
use crate::level::Level;

/// Literal path stripped from stack traces, e.g. `/srv/app`.
pub const YAML_LOG_BASE_PATH_ENV: &str = "YAML_LOG_BASE_PATH";

/// `true`/`1`/`yes` to prefix records with their timestamp.
pub const YAML_LOG_SHOW_DATE_ENV: &str = "YAML_LOG_SHOW_DATE";

/// Minimum level name, e.g. `debug`.
pub const YAML_LOG_LEVEL_ENV: &str = "YAML_LOG_LEVEL";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a boolean flag the way shells usually spell it.
pub fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => Err(ConfigError::InvalidEnv {
            key,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

pub fn parse_level(key: &'static str, value: &str) -> Result<Level, ConfigError> {
    value.parse::<Level>().map_err(|e| ConfigError::InvalidEnv {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag(YAML_LOG_SHOW_DATE_ENV, "Yes").unwrap());
        assert!(!parse_flag(YAML_LOG_SHOW_DATE_ENV, "").unwrap());
        assert!(parse_flag(YAML_LOG_SHOW_DATE_ENV, "maybe").is_err());
    }

    #[test]
    fn level_errors_name_the_variable() {
        let err = parse_level(YAML_LOG_LEVEL_ENV, "loud").unwrap_err();
        assert!(err.to_string().contains(YAML_LOG_LEVEL_ENV));
    }
}
