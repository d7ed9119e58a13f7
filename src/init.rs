use crate::env::{env_or, parse_flag, parse_level, YAML_LOG_BASE_PATH_ENV, YAML_LOG_LEVEL_ENV, YAML_LOG_SHOW_DATE_ENV};
use crate::error::{ConfigError, InitError};
use crate::layer::YamlLayer;
use crate::level::Level;
use crate::sink::LogSink;
use crate::stream::{StreamConfig, YamlStream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the logging layer.
///
/// **Fields**
/// - `stream`: [`StreamConfig`] bound to the stream the layer writes to.
/// - `min_level`: events below this level are skipped before rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerConfig {
    pub stream: StreamConfig,
    pub min_level: Level,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            min_level: Level::Info,
        }
    }
}

impl LayerConfig {
    /// Build a configuration from `YAML_LOG_*` environment variables,
    /// falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let show_date = env_or(YAML_LOG_SHOW_DATE_ENV, "false");
        let min_level = env_or(YAML_LOG_LEVEL_ENV, defaults.min_level.as_str());

        Ok(Self {
            stream: StreamConfig {
                base_path: env_or(YAML_LOG_BASE_PATH_ENV, ""),
                show_date: parse_flag(YAML_LOG_SHOW_DATE_ENV, &show_date)?,
            },
            min_level: parse_level(YAML_LOG_LEVEL_ENV, &min_level)?,
        })
    }
}

/// Install a global `tracing` subscriber that renders events through a
/// [`YamlStream`] writing to `sink`.
///
/// **Effects**
///
/// Installs a [`Registry`] combined with [`YamlLayer`] as the global
/// default subscriber, so every `tracing` event in the process at or above
/// `config.min_level` is rendered and written.
///
/// **Returns**
/// - `Err(InitError::Config)` if the stream cannot be built.
/// - `Err(InitError::SetGlobal)` if a global subscriber is already set.
pub fn init_tracing_with_config(sink: Arc<dyn LogSink>, config: LayerConfig) -> Result<(), InitError> {
    let stream = YamlStream::new(config.stream, sink)?;
    let layer = YamlLayer::new(stream, config.min_level);
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Initialize tracing with configuration read from the environment.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::from_env`], so a service can tune the output through
/// `YAML_LOG_*` variables without code changes.
pub fn init_tracing(sink: Arc<dyn LogSink>) -> Result<(), InitError> {
    init_tracing_with_config(sink, LayerConfig::from_env()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_config_deserializes_nested_stream() {
        let config: LayerConfig =
            serde_json::from_str(r#"{"stream": {"basePath": "/srv", "showDate": true}, "minLevel": "debug"}"#)
                .unwrap();
        assert_eq!(config.min_level, Level::Debug);
        assert_eq!(config.stream, StreamConfig::new("/srv").with_show_date(true));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: LayerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LayerConfig::default());
    }
}
