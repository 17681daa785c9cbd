use std::time::Duration;

use prometheus::{Encoder, TextEncoder};
use stark_declare_types::TransactionStatus;

use crate::metrics::*;

/// Outcome label for a declaration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationResult {
    /// Submitted without tracking
    Submitted,
    Accepted,
    Rejected,
    /// Still pending when a non-following poll returned
    Pending,
    AliasConflict,
    Failed,
}

impl DeclarationResult {
    fn as_str(&self) -> &'static str {
        match self {
            DeclarationResult::Submitted => "submitted",
            DeclarationResult::Accepted => "accepted",
            DeclarationResult::Rejected => "rejected",
            DeclarationResult::Pending => "pending",
            DeclarationResult::AliasConflict => "alias_conflict",
            DeclarationResult::Failed => "failed",
        }
    }
}

/// Facade over the process-wide Prometheus registry
#[derive(Debug)]
pub struct MetricsCollector {
    _private: (),
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self { _private: () }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TRACKING
    // ═══════════════════════════════════════════════════════════════════════════

    /// Record one status observation
    pub fn record_status_query(&self, status: TransactionStatus) {
        TX_STATUS_QUERIES
            .with_label_values(&[status.as_label()])
            .inc();
    }

    pub fn record_status_query_failure(&self, reason: &str) {
        TX_STATUS_QUERY_FAILURES.with_label_values(&[reason]).inc();
    }

    pub fn record_tracking_started(&self) {
        ACTIVE_TRACKERS.inc();
    }

    /// Record the end of a tracking run, successful or not
    pub fn record_tracking_finished(&self, duration: Duration) {
        ACTIVE_TRACKERS.dec();
        TX_TRACKING_DURATION.observe(duration.as_millis() as f64);
    }

    pub fn record_debug_decode(&self, rewritten: bool) {
        let result = if rewritten { "rewritten" } else { "fallback" };
        DEBUG_DECODES.with_label_values(&[result]).inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DECLARATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_declaration(&self, result: DeclarationResult) {
        DECLARATIONS.with_label_values(&[result.as_str()]).inc();
    }

    pub fn record_alias_rollback(&self) {
        ALIAS_ROLLBACKS.inc();
    }

    pub fn record_alias_recovery(&self, action: &str) {
        ALIAS_RECOVERIES.with_label_values(&[action]).inc();
    }

    pub fn record_error_event(&self, target: &str) {
        ERROR_EVENTS.with_label_values(&[target]).inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXPORT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Export metrics in Prometheus text format
    pub fn export_metrics(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingError(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingError(e.to_string()))
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("encoding error: {0}")]
    EncodingError(String),
}
