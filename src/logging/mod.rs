//! Logging: subscriber installation for binaries and the data-quality sink
//! injected into every pipeline stage.

mod format;
mod sink;

pub use format::StructuredLogger;
pub use sink::{CollectingSink, ImputeStrategy, NullSink, QualityEvent, QualitySink, TracingSink};
