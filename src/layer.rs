use crate::level::Level;
use crate::record::{ErrorInfo, LogRecord};
use crate::stream::YamlStream;
use crate::value::{Fields, Value};
use chrono::Utc;
use std::error::Error;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Field name whose error value becomes the record's error block.
pub const ERROR_FIELD: &str = "error";

const MESSAGE_FIELD: &str = "message";

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// writes them through a [`YamlStream`].
///
/// Fields recorded on enclosing spans are copied onto each event's record,
/// innermost span last, so a span carrying `requestId`, `operation` and
/// `identity` supplies the metadata block for everything logged inside it.
/// Rendering happens synchronously on the calling thread.
pub struct YamlLayer {
    stream: YamlStream,
    min_level: Level,
    hostname: Option<String>,
}

impl YamlLayer {
    /// Create a layer writing through `stream`. Events below `min_level`
    /// are skipped before any record is built.
    pub fn new(stream: YamlStream, min_level: Level) -> Self {
        Self {
            stream,
            min_level,
            hostname: std::env::var("HOSTNAME").ok(),
        }
    }

    pub fn stream(&self) -> &YamlStream {
        &self.stream
    }
}

/// Map a `tracing` level onto the record severity scale.
pub fn severity_of(level: &tracing::Level) -> Level {
    if *level == tracing::Level::ERROR {
        Level::Error
    } else if *level == tracing::Level::WARN {
        Level::Warn
    } else if *level == tracing::Level::INFO {
        Level::Info
    } else if *level == tracing::Level::DEBUG {
        Level::Debug
    } else {
        Level::Trace
    }
}

/// Span fields kept in the span's extensions until it closes.
#[derive(Debug, Default)]
struct SpanFields(Fields);

fn put(fields: &mut Fields, name: &str, value: Value) {
    match fields.iter_mut().find(|(key, _)| key == name) {
        Some(slot) => slot.1 = value,
        None => fields.push((name.to_string(), value)),
    }
}

/// Collects span fields as typed values.
struct FieldVisitor<'a> {
    fields: &'a mut Fields,
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        put(self.fields, field.name(), Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        put(self.fields, field.name(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        put(self.fields, field.name(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        put(self.fields, field.name(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        put(self.fields, field.name(), Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        put(self.fields, field.name(), Value::error(ErrorInfo::from_std_error(value)));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        put(self.fields, field.name(), Value::Str(format!("{:?}", value)));
    }
}

/// Collects event fields straight into the record, routing `message` and
/// `error` to their dedicated slots.
struct EventVisitor<'a> {
    record: &'a mut LogRecord,
}

impl EventVisitor<'_> {
    fn fields(&mut self) -> FieldVisitor<'_> {
        FieldVisitor {
            fields: &mut self.record.fields,
        }
    }
}

impl Visit for EventVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == MESSAGE_FIELD {
            self.record.message = Some(value.to_string());
        } else if field.name() == ERROR_FIELD {
            self.record.error = Some(ErrorInfo::new("Error", value));
        } else {
            self.fields().record_str(field, value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields().record_i64(field, value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields().record_u64(field, value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields().record_f64(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields().record_bool(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        if field.name() == ERROR_FIELD {
            self.record.error = Some(ErrorInfo::from_std_error(value));
        } else {
            self.fields().record_error(field, value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == MESSAGE_FIELD {
            self.record.message = Some(format!("{:?}", value));
        } else if field.name() == ERROR_FIELD {
            // `error = %e` and `error = ?e` arrive here as text.
            self.record.error = Some(ErrorInfo::new("Error", format!("{:?}", value)));
        } else {
            self.fields().record_debug(field, value);
        }
    }
}

impl<S> Layer<S> for YamlLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut fields = Fields::new();
        attrs.record(&mut FieldVisitor { fields: &mut fields });

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(fields));
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            let mut extensions = span.extensions_mut();
            if let Some(stored) = extensions.get_mut::<SpanFields>() {
                values.record(&mut FieldVisitor { fields: &mut stored.0 });
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        let level = severity_of(meta.level());
        if level < self.min_level {
            return;
        }

        let mut record = LogRecord::new(meta.target(), level)
            .with_timestamp(Utc::now())
            .with_process_id(std::process::id());
        record.hostname = self.hostname.clone();

        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(stored) = span.extensions().get::<SpanFields>() {
                    for (key, value) in &stored.0 {
                        record.set_field(key.as_str(), value.clone());
                    }
                }
            }
        }

        event.record(&mut EventVisitor { record: &mut record });
        self.stream.write(&record);
    }
}
