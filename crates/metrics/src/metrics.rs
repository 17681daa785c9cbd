use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

lazy_static! {
    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSACTION TRACKING METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Status queries issued against the network, by observed status
    pub static ref TX_STATUS_QUERIES: IntCounterVec = register_int_counter_vec!(
        "stark_declare_tx_status_queries_total",
        "Transaction status queries by observed status",
        &["status"]
    )
    .unwrap();

    /// Status queries that failed before a status could be read
    pub static ref TX_STATUS_QUERY_FAILURES: IntCounterVec = register_int_counter_vec!(
        "stark_declare_tx_status_query_failures_total",
        "Transaction status queries that failed",
        &["reason"]
    )
    .unwrap();

    /// Time from first query to terminal (or reported) state, in milliseconds
    pub static ref TX_TRACKING_DURATION: Histogram = register_histogram!(
        "stark_declare_tx_tracking_duration_ms",
        "Transaction tracking duration in milliseconds",
        vec![100.0, 1000.0, 10000.0, 30000.0, 60000.0, 300000.0, 900000.0]
    )
    .unwrap();

    /// Transactions currently being polled
    pub static ref ACTIVE_TRACKERS: IntGauge = register_int_gauge!(
        "stark_declare_active_trackers",
        "Transactions currently being polled"
    )
    .unwrap();

    /// Rejection messages rewritten by the debug decoder, by result
    pub static ref DEBUG_DECODES: IntCounterVec = register_int_counter_vec!(
        "stark_declare_debug_decodes_total",
        "Debug decoder invocations by result",
        &["result"]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // DECLARATION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Declarations attempted, by result
    pub static ref DECLARATIONS: IntCounterVec = register_int_counter_vec!(
        "stark_declare_declarations_total",
        "Declarations by result",
        &["result"]
    )
    .unwrap();

    /// Alias registrations rolled back after rejection
    pub static ref ALIAS_ROLLBACKS: IntCounter = register_int_counter!(
        "stark_declare_alias_rollbacks_total",
        "Alias registrations rolled back after a rejected declaration"
    )
    .unwrap();

    /// Provisional aliases resolved by recovery, by action
    pub static ref ALIAS_RECOVERIES: IntCounterVec = register_int_counter_vec!(
        "stark_declare_alias_recoveries_total",
        "Provisional alias reconciliations by action",
        &["action"]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // LOGGING METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Error-level log events, by target module
    pub static ref ERROR_EVENTS: IntCounterVec = register_int_counter_vec!(
        "stark_declare_error_events_total",
        "Error-level log events by target",
        &["target"]
    )
    .unwrap();
}
