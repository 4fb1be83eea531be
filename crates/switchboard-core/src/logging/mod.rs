//! Logging abstractions
//!
//! Components take an `Arc<dyn Logger>` rather than logging through a global,
//! so tests can pass `NoOpLogger`.

mod traits;
mod noop;
mod tracing_logger;

pub use traits::{Level, Logger, SharedLogger};
pub use noop::NoOpLogger;
pub use tracing_logger::TracingLogger;
