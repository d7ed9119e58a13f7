use std::sync::Arc;
use std::time::Instant;

use tracing_yaml_sink::ice::{Current, EnumValue, Identity, IceValue, Long, ObjectPrx, UserException};
use tracing_yaml_sink::level::Level;
use tracing_yaml_sink::noop_sink::NoopSink;
use tracing_yaml_sink::record::LogRecord;
use tracing_yaml_sink::request::RequestScope;
use tracing_yaml_sink::stream::{StreamConfig, YamlStream};
use tracing_yaml_sink::value::Value;

fn main() {
    let config = StreamConfig::new("/srv/printer");
    let stream = match YamlStream::stdout(config.clone()) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("invalid stream config: {e}");
            return;
        }
    };

    let current = Current {
        id: Identity::new("printer-3", "devices"),
        operation: "print".into(),
        request_id: 42,
        ..Current::default()
    };
    let scope = RequestScope::new(&current);

    let job = IceValue::new("::Printing::Job")
        .with_field("pages", 12)
        .with_field("duplex", true)
        .with_field("tray", EnumValue::new("UPPER", 1));
    let record = scope.apply_with(
        LogRecord::new("printer", Level::Info).with_message("job accepted"),
        [
            ("job", Value::from(job)),
            ("spooler", Value::from(ObjectPrx::new(Identity::new("spooler", "")).with_endpoint("tcp -h 10.0.0.4 -p 4061"))),
            ("bytes", Value::from(Long(9_007_199_254_740_993))),
        ],
    );
    stream.write(&record);

    let jammed = UserException::new("Printing::PaperJam")
        .with_message("paper jam")
        .with_cause("tray UPPER jammed at sheet 7")
        .with_stack("Error: paper jam\n    at feed (/srv/printer/lib/feeder.js:88:11)\n    at print (/srv/printer/lib/job.js:20:3)")
        .with_field("sheet", 7);
    let failed = scope.apply(
        LogRecord::new("printer", Level::Error)
            .with_message("job failed")
            .with_error((&jammed).into()),
    );
    stream.write(&failed);

    // Rendering cost alone, without terminal output.
    let quiet = match YamlStream::new(config, Arc::new(NoopSink)) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("invalid stream config: {e}");
            return;
        }
    };
    let n: u64 = 10_000;
    let start = Instant::now();
    for _ in 0..n {
        quiet.write(&failed);
    }
    let elapsed = start.elapsed();
    eprintln!(
        "rendered {} records in {:?} (~{:.0} rec/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
