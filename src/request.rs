use crate::ice::Current;
use crate::record::LogRecord;
use crate::value::Value;

/// Request metadata attached to every record logged while serving one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestScope {
    pub request_id: i32,
    pub operation: String,
    pub identity: String,
}

impl RequestScope {
    pub fn new(current: &Current) -> Self {
        Self {
            request_id: current.request_id,
            operation: current.operation.clone(),
            identity: current.id.to_string(),
        }
    }

    /// Copy the scope's metadata onto `record`.
    pub fn apply(&self, mut record: LogRecord) -> LogRecord {
        record.set_field("requestId", self.request_id);
        record.set_field("operation", self.operation.as_str());
        record.set_field("identity", self.identity.as_str());
        record
    }

    /// Like [`apply`](Self::apply), with extra context fields appended.
    pub fn apply_with<K, V, I>(&self, record: LogRecord, extra: I) -> LogRecord
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut record = self.apply(record);
        for (key, value) in extra {
            record.set_field(key, value);
        }
        record
    }

    /// A `tracing` span carrying the scope's fields. Events emitted inside it
    /// pick the fields up as metadata through
    /// [`YamlLayer`](crate::layer::YamlLayer).
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "request",
            requestId = self.request_id,
            operation = %self.operation,
            identity = %self.identity,
        )
    }
}

impl From<&Current> for RequestScope {
    fn from(current: &Current) -> Self {
        RequestScope::new(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ice::Identity;
    use crate::level::Level;
    use crate::record::classify;

    fn current() -> Current {
        Current {
            id: Identity::new("printer", "devices"),
            facet: String::new(),
            operation: "print".into(),
            request_id: 12,
        }
    }

    #[test]
    fn apply_sets_metadata_fields() {
        let scope = RequestScope::from(&current());
        let record = scope.apply(LogRecord::new("svc", Level::Info));
        let classified = classify(&record);
        let keys: Vec<_> = classified.metadata.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["requestId", "operation", "identity"]);
        assert!(matches!(record.field("identity"), Some(Value::Str(s)) if s == "devices/printer"));
    }

    #[test]
    fn extra_fields_become_context() {
        let scope = RequestScope::new(&current());
        let record = scope.apply_with(LogRecord::new("svc", Level::Info), [("pages", 3)]);
        let classified = classify(&record);
        assert_eq!(classified.context.len(), 1);
        assert_eq!(classified.context[0].0, "pages");
    }
}
