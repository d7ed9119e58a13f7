use crate::error::SinkError;
use crate::sink::LogSink;

/// A sink that simply drops all rendered records.
///
/// Useful for measuring the cost of rendering itself without any output,
/// and for tests that only care about the returned text.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn write(&self, _text: &str) -> Result<(), SinkError> {
        Ok(())
    }
}
