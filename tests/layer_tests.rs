//! `tracing` events rendered through `YamlLayer`.

use std::io;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;
use tracing_yaml_sink::ice::{Current, Identity};
use tracing_yaml_sink::layer::YamlLayer;
use tracing_yaml_sink::level::Level;
use tracing_yaml_sink::request::RequestScope;
use tracing_yaml_sink::sink::MemorySink;
use tracing_yaml_sink::stream::{StreamConfig, YamlStream};

fn capture(min_level: Level, f: impl FnOnce()) -> MemorySink {
    let sink = MemorySink::new();
    let stream = YamlStream::new(StreamConfig::new("/srv/app"), Arc::new(sink.clone())).unwrap();
    let subscriber = Registry::default().with(YamlLayer::new(stream, min_level));
    tracing::subscriber::with_default(subscriber, f);
    sink
}

#[test]
fn event_fields_become_context() {
    let sink = capture(Level::Info, || {
        info!(target: "svc", user_id = 42, admin = false, "hello");
    });
    assert_eq!(sink.contents(), "[INFO] svc: hello\n  user_id: 42\n  admin: false\n");
}

#[test]
fn events_below_min_level_are_skipped() {
    let sink = capture(Level::Warn, || {
        debug!(target: "svc", "noise");
        info!(target: "svc", "still noise");
        warn!(target: "svc", "kept");
    });
    assert_eq!(sink.writes(), ["[WARN] svc: kept\n"]);
}

#[test]
fn request_span_supplies_metadata() {
    let current = Current {
        id: Identity::new("printer", "devices"),
        operation: "print".into(),
        request_id: 12,
        ..Current::default()
    };
    let scope = RequestScope::new(&current);

    let sink = capture(Level::Info, || {
        let _entered = scope.span().entered();
        info!(target: "svc", pages = 3, "printing");
    });
    assert_eq!(
        sink.contents(),
        "[INFO] svc: printing\n  requestId: 12\n  operation: print\n  identity: devices/printer\n  pages: 3\n"
    );
}

#[test]
fn inner_spans_override_outer_fields() {
    let sink = capture(Level::Info, || {
        let _outer = info_span!("outer", operation = "list").entered();
        let _inner = info_span!("inner", operation = "get").entered();
        info!(target: "svc", "nested");
    });
    assert_eq!(sink.contents(), "[INFO] svc: nested\n  operation: get\n");
}

#[test]
fn late_recorded_span_fields_are_visible() {
    let sink = capture(Level::Info, || {
        let span = info_span!("request", requestId = tracing::field::Empty);
        let _entered = span.enter();
        span.record("requestId", 5);
        info!(target: "svc", "recorded");
    });
    assert_eq!(sink.contents(), "[INFO] svc: recorded\n  requestId: 5\n");
}

#[test]
fn error_field_becomes_the_error_block() {
    let sink = capture(Level::Info, || {
        let err = io::Error::new(io::ErrorKind::NotFound, "missing file");
        error!(target: "svc", error = &err as &(dyn std::error::Error + 'static), "open failed");
    });
    assert_eq!(sink.contents(), "[ERROR] svc: open failed\n  Error: Error: missing file\n");
}

#[test]
fn displayed_error_field_becomes_the_error_block() {
    let sink = capture(Level::Info, || {
        let err = io::Error::new(io::ErrorKind::NotFound, "missing file");
        error!(target: "svc", error = %err, "open failed");
    });
    assert_eq!(sink.contents(), "[ERROR] svc: open failed\n  Error: Error: missing file\n");
}

#[test]
fn string_error_field_becomes_the_error_block() {
    let sink = capture(Level::Info, || {
        warn!(target: "svc", error = "disk full", retries = 2, "write deferred");
    });
    assert_eq!(sink.contents(), "[WARN] svc: write deferred\n  retries: 2\n  Error: Error: disk full\n");
}

#[test]
fn events_outside_spans_carry_no_metadata() {
    let sink = capture(Level::Info, || {
        {
            let _entered = info_span!("request", requestId = 1).entered();
        }
        info!(target: "svc", "after");
    });
    assert_eq!(sink.contents(), "[INFO] svc: after\n");
}
