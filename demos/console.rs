use std::io;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use tracing_yaml_sink::init::{init_tracing_with_config, LayerConfig};
use tracing_yaml_sink::level::Level;
use tracing_yaml_sink::sink::{LogSink, StdoutSink};
use tracing_yaml_sink::stream::StreamConfig;

fn main() {
    let sink: Arc<dyn LogSink> = Arc::new(StdoutSink);

    let layer_config = LayerConfig {
        stream: StreamConfig::new(env!("CARGO_MANIFEST_DIR")).with_show_date(true),
        min_level: Level::Debug,
    };

    if let Err(e) = init_tracing_with_config(sink, layer_config) {
        eprintln!("failed to install subscriber: {e}");
        return;
    }

    info!(target: "console", version = env!("CARGO_PKG_VERSION"), "console demo started");

    let span = tracing::info_span!("request", requestId = 1, operation = "status", identity = "admin/console");
    span.in_scope(|| {
        warn!(target: "console", queue_depth = 17, "queue is filling up");
        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "backend unreachable");
        error!(target: "console", error = &err as &(dyn std::error::Error + 'static), "status check failed");
    });

    let n: u64 = 1_000;
    let start = Instant::now();
    for i in 0..n {
        tracing::debug!(target: "console", iteration = i, "tick");
    }
    let elapsed = start.elapsed();
    eprintln!(
        "rendered {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
