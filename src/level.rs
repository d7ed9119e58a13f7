use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a [`LogRecord`](crate::record::LogRecord).
///
/// Records carry their level as a plain integer so that hosts can pass
/// through whatever they received; this enum covers the six severities the
/// renderer knows how to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i64)]
pub enum Level {
    Trace = 10,
    Debug = 20,
    Info = 30,
    Warn = 40,
    Error = 50,
    Fatal = 60,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Numeric severity written into records.
    pub fn severity(self) -> i64 {
        self as i64
    }

    /// Map a numeric severity back to a level. Unknown severities yield `None`.
    pub fn from_severity(severity: i64) -> Option<Level> {
        Self::ALL.into_iter().find(|level| level.severity() == severity)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    /// Label used in the rendered `[LEVEL]` tag.
    pub fn as_upper_str(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl From<Level> for i64 {
    fn from(level: Level) -> i64 {
        level.severity()
    }
}

/// Error returned when a level name is not one of the six known names.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid level: {0:?}")]
pub struct ParseLevelError(pub String);

/// Resolve the uppercase label for a numeric severity.
///
/// Unknown severities resolve to `None`; callers render them as an empty
/// label rather than failing.
pub fn name_from_level(severity: i64) -> Option<&'static str> {
    Level::from_severity(severity).map(Level::as_upper_str)
}

/// Numeric severity for a level name such as `"warn"`.
pub fn level_from_name(name: &str) -> Result<i64, ParseLevelError> {
    name.parse::<Level>().map(Level::severity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_severities_resolve_in_order() {
        let names: Vec<_> = [10, 20, 30, 40, 50, 60]
            .into_iter()
            .map(|s| name_from_level(s).unwrap())
            .collect();
        assert_eq!(names, ["TRACE", "DEBUG", "INFO", "WARN", "ERROR", "FATAL"]);
    }

    #[test]
    fn unknown_severity_has_no_name() {
        assert_eq!(name_from_level(35), None);
        assert_eq!(name_from_level(0), None);
        assert_eq!(name_from_level(-10), None);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!(level_from_name(" fatal ").unwrap(), 60);
    }

    #[test]
    fn parse_rejects_unknown_names() {
        let err = "verbose".parse::<Level>().unwrap_err();
        assert_eq!(err.to_string(), "invalid level: \"verbose\"");
    }

    #[test]
    fn levels_order_by_severity() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Error < Level::Fatal);
    }
}
