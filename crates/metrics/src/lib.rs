//! Logging and metrics for transaction tracking and class declaration
//!
//! # Features
//!
//! - Prometheus counters for status queries, tracking duration, declarations,
//!   alias rollbacks and recoveries
//! - `tracing-subscriber` initialization (text or JSON) with error-event
//!   counting
//! - Correlation IDs and a span per declare workflow
//!
//! # Example
//!
//! ```no_run
//! use stark_declare_metrics::{init_tracing, MetricsCollector, TracingOptions};
//! use std::sync::Arc;
//!
//! let collector = Arc::new(MetricsCollector::new());
//! init_tracing(&TracingOptions::default(), Some(collector.clone())).unwrap();
//!
//! println!("{}", collector.export_metrics().unwrap());
//! ```

pub mod collector;
pub mod metrics;
pub mod tracing;

pub use collector::{DeclarationResult, MetricsCollector, MetricsError};
pub use self::tracing::{
    init_tracing, CorrelationId, DeclareSpan, ErrorContext, MetricsLayer, TracingError,
    TracingOptions, DEFAULT_FILTER,
};
