//! Progress Sink Adapter

mod tracing_progress_sink;

pub use tracing_progress_sink::TracingProgressSink;
