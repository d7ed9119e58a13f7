use crate::value::{Fields, Value};
use chrono::{DateTime, Utc};
use std::error::Error;

/// Request-correlation keys, rendered in this order ahead of free context.
pub const METADATA_KEYS: [&str; 4] = ["module", "requestId", "operation", "identity"];

/// Keys that describe the record itself and never show up as context.
pub const EXCLUDED_KEYS: [&str; 8] = [
    "message",
    "level",
    "name",
    "timestamp",
    "processId",
    "hostname",
    "schemaVersion",
    "error",
];

/// A single log record handed to the stream by the host logging framework.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub name: String,
    pub level: i64,
    pub message: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub process_id: Option<u32>,
    pub hostname: Option<String>,
    pub schema_version: Option<u32>,
    pub error: Option<ErrorInfo>,
    /// Every other field, in insertion order.
    pub fields: Fields,
}

impl LogRecord {
    pub fn new(name: impl Into<String>, level: impl Into<i64>) -> Self {
        LogRecord {
            name: name.into(),
            level: level.into(),
            message: None,
            timestamp: None,
            process_id: None,
            hostname: None,
            schema_version: None,
            error: None,
            fields: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_process_id(mut self, pid: u32) -> Self {
        self.process_id = Some(pid);
        self
    }

    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(key, value);
        self
    }

    /// Insert or replace a field. A replaced field keeps its original position.
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Error attached to a record, or carried by a domain exception value.
#[derive(Debug, Clone, Default)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    /// Raw multi-line trace; the first line is the error's own summary.
    pub stack: Option<String>,
    pub cause_name: Option<String>,
    pub cause_detail: Option<String>,
    /// Extra fields rendered under `errorData`.
    pub fields: Fields,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorInfo {
            name: name.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_cause(mut self, cause_name: impl Into<String>, cause_detail: Option<String>) -> Self {
        self.cause_name = Some(cause_name.into());
        self.cause_detail = cause_detail;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Serialize a standard error. Its `source()` chain becomes the trace
    /// lines, one `caused by:` line per source.
    pub fn from_std_error(err: &(dyn Error + 'static)) -> Self {
        let message = err.to_string();
        let mut stack = format!("Error: {message}");
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push_str("\n    caused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }
        ErrorInfo::new("Error", message).with_stack(stack)
    }
}

/// A record split into the three groups the stream renders separately.
#[derive(Debug)]
pub struct Classified<'a> {
    pub metadata: Vec<(&'a str, &'a Value)>,
    pub context: Vec<(&'a str, &'a Value)>,
    pub error: Option<&'a ErrorInfo>,
}

/// Split a record into metadata, context and error. No field lands in
/// more than one group.
pub fn classify(record: &LogRecord) -> Classified<'_> {
    let metadata = METADATA_KEYS
        .iter()
        .filter_map(|key| record.field(key).map(|value| (*key, value)))
        .collect();

    let context = record
        .fields
        .iter()
        .filter(|(key, _)| {
            !METADATA_KEYS.contains(&key.as_str()) && !EXCLUDED_KEYS.contains(&key.as_str())
        })
        .map(|(key, value)| (key.as_str(), value))
        .collect();

    Classified {
        metadata,
        context,
        error: record.error.as_ref(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;

    fn keys<'a>(group: &[(&'a str, &'a Value)]) -> Vec<&'a str> {
        group.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn metadata_follows_fixed_order() {
        let record = LogRecord::new("svc", Level::Info)
            .with_field("identity", "cat/obj")
            .with_field("x", 1)
            .with_field("requestId", 7)
            .with_field("module", "db");
        let classified = classify(&record);
        assert_eq!(keys(&classified.metadata), ["module", "requestId", "identity"]);
        assert_eq!(keys(&classified.context), ["x"]);
    }

    #[test]
    fn excluded_keys_never_reach_context() {
        let record = LogRecord::new("svc", Level::Info)
            .with_field("hostname", "box")
            .with_field("schemaVersion", 0)
            .with_field("b", 2)
            .with_field("a", 1);
        let classified = classify(&record);
        assert!(classified.metadata.is_empty());
        assert_eq!(keys(&classified.context), ["b", "a"]);
    }

    #[test]
    fn set_field_replaces_in_place() {
        let mut record = LogRecord::new("svc", 30).with_field("a", 1).with_field("b", 2);
        record.set_field("a", 3);
        assert_eq!(keys(&classify(&record).context), ["a", "b"]);
        assert!(matches!(record.field("a"), Some(Value::Int(3))));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn std_errors_list_their_sources() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));
        let info = ErrorInfo::from_std_error(&err);
        assert_eq!(info.name, "Error");
        assert_eq!(info.message, "outer failure");
        assert_eq!(
            info.stack.as_deref(),
            Some("Error: outer failure\n    caused by: disk gone")
        );
    }
}
