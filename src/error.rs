use std::io;

/// Failure raised while turning a value into text.
///
/// These never escape [`YamlStream::write`](crate::stream::YamlStream::write);
/// the stream replaces the record with a degraded one describing the
/// failure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("cannot convert {type_name}: {reason}")]
    Conversion { type_name: String, reason: String },

    #[error("value nesting exceeds {0} levels")]
    TooDeep(usize),

    #[error("cannot flatten value: {0}")]
    Flatten(String),

    #[error("panic while rendering: {0}")]
    Panicked(String),
}

impl RenderError {
    pub fn conversion(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        RenderError::Conversion {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::Flatten(err.to_string())
    }
}

/// Error returned by [`LogSink`](crate::sink::LogSink) implementations.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("sink write failed: {0}")]
    Io(#[from] io::Error),

    #[error("sink lock poisoned")]
    Poisoned,
}

/// Error returned when building a stream or layer from configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid base path pattern: {0}")]
    BasePath(#[from] regex::Error),

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidEnv {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Error returned when installing the global subscriber.
#[cfg(feature = "layer")]
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("global subscriber already set: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}
