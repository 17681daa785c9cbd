use std::sync::Arc;
use tracing::{field::Visit, Event, Level, Subscriber};
use tracing_subscriber::{
    fmt,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::collector::MetricsCollector;

/// Filter used when neither `RUST_LOG` nor an explicit directive is set
pub const DEFAULT_FILTER: &str = "info,stark_declare=debug";

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct TracingOptions {
    /// `EnvFilter` directive, e.g. `info` or `warn,stark_declare_tracker=debug`
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            json: false,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `options.filter`. When a collector is
/// given, error-level events are counted per target.
pub fn init_tracing(
    options: &TracingOptions,
    collector: Option<Arc<MetricsCollector>>,
) -> Result<(), TracingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.filter))
        .map_err(|e| TracingError::InitError(e.to_string()))?;

    let json_layer = options.json.then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .json()
    });
    let text_layer = (!options.json).then(|| fmt::layer().with_target(true).with_level(true));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(collector.map(MetricsLayer::new))
        .try_init()
        .map_err(|e| TracingError::InitError(e.to_string()))?;

    Ok(())
}

/// Tracing layer that counts error events
pub struct MetricsLayer {
    collector: Arc<MetricsCollector>,
}

impl MetricsLayer {
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        Self { collector }
    }
}

impl<S> Layer<S> for MetricsLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() != Level::ERROR {
            return;
        }

        let mut visitor = ErrorVisitor::default();
        event.record(&mut visitor);

        let target = visitor
            .error_type
            .unwrap_or_else(|| metadata.target().to_string());
        self.collector.record_error_event(&target);
    }
}

/// Picks up an explicit `error_type` field when an event carries one
#[derive(Default)]
struct ErrorVisitor {
    error_type: Option<String>,
}

impl Visit for ErrorVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "error_type" {
            self.error_type = Some(format!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "error_type" {
            self.error_type = Some(value.to_string());
        }
    }
}

/// Correlation ID tying together the log lines of one declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(uuid::Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Span context for one declare workflow
#[derive(Debug, Clone)]
pub struct DeclareSpan {
    pub correlation_id: CorrelationId,
    pub contract_name: String,
    pub network: String,
    pub alias: Option<String>,
}

impl DeclareSpan {
    pub fn new(contract_name: &str, network: &str, alias: Option<&str>) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            contract_name: contract_name.to_string(),
            network: network.to_string(),
            alias: alias.map(str::to_string),
        }
    }

    /// Span to instrument the declare future with
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "declare",
            correlation_id = %self.correlation_id,
            contract = %self.contract_name,
            network = %self.network,
            alias = self.alias.as_deref().unwrap_or(""),
        )
    }
}

/// Log an error with declaration context before propagating it
pub trait ErrorContext {
    fn with_correlation_id(self, correlation_id: CorrelationId) -> Self;

    fn with_tx_hash(self, tx_hash: &str) -> Self;
}

impl<T, E> ErrorContext for Result<T, E>
where
    E: std::fmt::Display,
{
    fn with_correlation_id(self, correlation_id: CorrelationId) -> Self {
        self.map_err(|e| {
            tracing::error!(
                correlation_id = %correlation_id,
                error = %e,
                "error occurred"
            );
            e
        })
    }

    fn with_tx_hash(self, tx_hash: &str) -> Self {
        self.map_err(|e| {
            tracing::error!(
                tx_hash = %tx_hash,
                error = %e,
                "error occurred"
            );
            e
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("tracing initialization error: {0}")]
    InitError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_generation() {
        let id1 = CorrelationId::new();
        let id2 = CorrelationId::new();

        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), 36);
    }

    #[test]
    fn test_declare_span_creation() {
        let span = DeclareSpan::new("token", "goerli", Some("my_token"));

        assert_eq!(span.contract_name, "token");
        assert_eq!(span.network, "goerli");
        assert_eq!(span.alias.as_deref(), Some("my_token"));
    }

    #[test]
    fn test_error_context_passes_error_through() {
        let result: Result<(), String> = Err("boom".to_string());
        let result = result.with_tx_hash("0x1");
        assert_eq!(result.unwrap_err(), "boom");

        let span = DeclareSpan::new("token", "goerli", None);
        let result: Result<u8, String> = Err("conflict".to_string());
        assert_eq!(
            result.with_correlation_id(span.correlation_id).unwrap_err(),
            "conflict"
        );

        let ok: Result<u8, String> = Ok(7);
        assert_eq!(ok.with_correlation_id(CorrelationId::new()), Ok(7));
    }

    #[test]
    fn test_default_options() {
        let options = TracingOptions::default();
        assert_eq!(options.filter, DEFAULT_FILTER);
        assert!(!options.json);
    }
}
