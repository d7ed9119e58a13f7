use crate::error::{ConfigError, RenderError};
use crate::level::{name_from_level, Level};
use crate::record::{classify, LogRecord};
use crate::render::{hanging_indent, indent, Renderer};
use crate::sink::{LogSink, StdoutSink};
use crate::value::Value;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Write as _;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Message substituted when a record cannot be rendered.
pub const SERIALIZATION_ERROR_MESSAGE: &str = "serialization error";

/// Error name used for the failure that replaced a record.
pub const RENDER_FAILURE_NAME: &str = "RenderError";

/// Configuration bound to a [`YamlStream`] at construction.
///
/// **Fields**
/// - `base_path`: literal path removed from every stack trace line, usually
///   the application's install root. Empty disables stripping.
/// - `show_date`: prefix each record with its timestamp.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StreamConfig {
    pub base_path: String,
    pub show_date: bool,
}

impl StreamConfig {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            show_date: false,
        }
    }

    pub fn with_show_date(mut self, show_date: bool) -> Self {
        self.show_date = show_date;
        self
    }
}

/// Renders [`LogRecord`]s as YAML-like text blocks and writes each one to a
/// [`LogSink`] in a single call.
///
/// The stream holds no state between calls apart from its configuration,
/// so one instance can be shared across threads.
pub struct YamlStream {
    renderer: Renderer,
    show_date: bool,
    sink: Arc<dyn LogSink>,
}

impl YamlStream {
    /// Create a stream writing to `sink`.
    ///
    /// **Returns**
    /// - `Err(ConfigError::BasePath)` if the escaped base path cannot be
    ///   compiled into a pattern.
    pub fn new(config: StreamConfig, sink: Arc<dyn LogSink>) -> Result<Self, ConfigError> {
        Ok(Self {
            renderer: Renderer::new(&config.base_path)?,
            show_date: config.show_date,
            sink,
        })
    }

    /// Create a stream writing to standard output.
    pub fn stdout(config: StreamConfig) -> Result<Self, ConfigError> {
        Self::new(config, Arc::new(StdoutSink))
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Render `record` and write it to the sink.
    ///
    /// Never fails: rendering failures degrade the record, and sink
    /// failures are reported on stderr and the record is dropped.
    pub fn write(&self, record: &LogRecord) {
        let text = self.render(record);
        if let Err(e) = self.sink.write(&text) {
            eprintln!("error writing log record: {}", e);
        }
    }

    /// Render `record` to text without writing it.
    ///
    /// Any failure while rendering, including a panic raised by a domain
    /// value, yields the degraded record instead.
    pub fn render(&self, record: &LogRecord) -> String {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.compose(record)))
            .unwrap_or_else(|payload| Err(RenderError::Panicked(panic_message(payload.as_ref()))));

        match outcome {
            Ok(text) => text,
            Err(failure) => panic::catch_unwind(AssertUnwindSafe(|| self.degrade(record, &failure)))
                .unwrap_or_else(|_| self.last_resort(record, &failure)),
        }
    }

    fn compose(&self, record: &LogRecord) -> Result<String, RenderError> {
        let classified = classify(record);
        let metadata = self.renderer.render_object(&classified.metadata, 0)?;
        let context = self.renderer.render_object(&classified.context, 0)?;
        let error = self.renderer.format_error(classified.error)?;

        Ok(self.assemble(
            record.timestamp.as_ref(),
            record.level,
            &record.name,
            record.message.as_deref(),
            &[metadata, context],
            &error,
        ))
    }

    /// Substitute for a record that failed to render: forced to ERROR with a
    /// fixed message, fields stringified best-effort, and the failure as the
    /// error block.
    fn degrade(&self, record: &LogRecord, failure: &RenderError) -> String {
        let classified = classify(record);
        let metadata = stringify_fields(&classified.metadata);
        let context = stringify_fields(&classified.context);

        self.assemble(
            record.timestamp.as_ref(),
            Level::Error.severity(),
            &record.name,
            Some(SERIALIZATION_ERROR_MESSAGE),
            &[metadata, context],
            &format!("{RENDER_FAILURE_NAME}: {failure}"),
        )
    }

    fn last_resort(&self, record: &LogRecord, failure: &RenderError) -> String {
        format!(
            "[{}] {}: {}\n  Error: {}: {}\n",
            Level::Error.as_upper_str(),
            record.name,
            SERIALIZATION_ERROR_MESSAGE,
            RENDER_FAILURE_NAME,
            failure
        )
    }

    fn assemble(
        &self,
        timestamp: Option<&DateTime<Utc>>,
        level: i64,
        name: &str,
        message: Option<&str>,
        blocks: &[String],
        error: &str,
    ) -> String {
        let mut out = String::new();
        if self.show_date {
            if let Some(timestamp) = timestamp {
                let _ = write!(out, "{} - ", timestamp.to_rfc3339_opts(SecondsFormat::Millis, true));
            }
        }
        let label = name_from_level(level).unwrap_or_default();
        let _ = writeln!(out, "[{label}] {name}: {}", message.unwrap_or_default());

        let mut info = String::new();
        for block in blocks.iter().filter(|block| !block.is_empty()) {
            info.push_str(block);
            if !block.ends_with('\n') {
                info.push('\n');
            }
        }
        if !error.is_empty() {
            info.push_str("Error: ");
            info.push_str(&hanging_indent(error));
            info.push('\n');
        }
        out.push_str(&indent(&info));

        strip_blank_lines(&out)
    }
}

/// Drop every line that holds nothing but whitespace.
fn strip_blank_lines(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// One `key: value` line per field, flattened to JSON where possible and
/// to `Debug` output otherwise.
fn stringify_fields(fields: &[(&str, &Value)]) -> String {
    let mut out = String::new();
    for (key, value) in fields {
        let text = match value.to_plain() {
            Ok(serde_json::Value::String(s)) => s,
            Ok(plain) => plain.to_string(),
            Err(_) => match value {
                Value::Domain(domain) => format!("{domain:?}"),
                other => format!("{other:?}"),
            },
        };
        let _ = writeln!(out, "{key}: {text}");
    }
    out
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
