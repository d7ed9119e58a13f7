//! Console rendering of structured log records as indented, YAML-like text.
//!
//! A [`stream::YamlStream`] takes a [`record::LogRecord`], renders its
//! request metadata, free-form context and error, and writes the result to
//! a [`sink::LogSink`] in one call. With the `layer` feature, a
//! `tracing_subscriber` layer feeds it from ordinary `tracing` events.

pub mod error;
pub mod level;
pub mod value;
pub mod record;
pub mod render;
pub mod error_format;
pub mod sink;
pub mod noop_sink;
pub mod stream;
pub mod ice;
pub mod request;
pub mod env;

#[cfg(feature = "layer")]
pub mod layer;

#[cfg(feature = "layer")]
pub mod init;
