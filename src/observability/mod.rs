//! Observability for refinement runs
//!
//! Structured logging through `tracing` and a process-wide metrics collector.

pub mod logging;
pub mod metrics;

pub use logging::{init_default_logging, init_logging, LogFormat};
pub use metrics::{metrics, MetricsCollector, MetricsSnapshot};

// Span macros for structured logging
pub use logging::{iteration_span, refinement_span};
