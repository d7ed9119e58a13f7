use crate::error::SinkError;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Destination for rendered log text.
///
/// The stream calls `write` exactly once per record with the complete
/// text block, newline-terminated. Implementations are responsible for
/// serializing concurrent writes so that blocks from different threads do
/// not interleave.
pub trait LogSink: Send + Sync {
    /// Write one rendered record.
    ///
    /// **Returns**
    /// - `Ok(())` if the text was handed to the underlying output.
    /// - `Err(..)` if the output failed. The stream reports the failure on
    ///   stderr and drops the record; it never retries.
    fn write(&self, text: &str) -> Result<(), SinkError>;

    /// Flush buffered output, if the sink buffers.
    ///
    /// Default implementation is a no-op.
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Console sink writing to the process's standard output.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write(&self, text: &str) -> Result<(), SinkError> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        io::stdout().lock().flush()?;
        Ok(())
    }
}

/// Sink over any writer, e.g. stderr or an open file.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer.into_inner().map_err(|_| SinkError::Poisoned)
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn write(&self, text: &str) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writer.flush()?;
        Ok(())
    }
}

/// Sink that keeps every write in memory. Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    writes: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write so far, one entry per record.
    pub fn writes(&self) -> Vec<String> {
        self.writes
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_default()
    }

    /// All writes concatenated, as a console would show them.
    pub fn contents(&self) -> String {
        self.writes().concat()
    }

    pub fn clear(&self) {
        if let Ok(mut writes) = self.writes.lock() {
            writes.clear();
        }
    }
}

impl LogSink for MemorySink {
    fn write(&self, text: &str) -> Result<(), SinkError> {
        self.writes
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_clones_share_writes() {
        let sink = MemorySink::new();
        let other = sink.clone();
        other.write("a\n").unwrap();
        sink.write("b\n").unwrap();
        assert_eq!(sink.writes(), ["a\n", "b\n"]);
        assert_eq!(other.contents(), "a\nb\n");
        sink.clear();
        assert!(other.writes().is_empty());
    }

    #[test]
    fn writer_sink_appends_to_writer() {
        let sink = WriterSink::new(Vec::new());
        sink.write("one\n").unwrap();
        sink.write("two\n").unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.into_inner().unwrap(), b"one\ntwo\n");
    }
}
