use stark_declare_metrics::MetricsCollector;
use stark_declare_types::{
    PollMode, TransactionOutcome, TransactionReceipt, TransactionStatus, TxHash,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{DebugDecoder, PassthroughDecoder, RetryTimer, TokioTimer, TrackerError, TxStatusQuery};

/// Pause between status queries while a transaction is not final
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Polling configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Wait between two queries of a non-terminal transaction
    pub retry_interval: Duration,

    /// Give up once this much time has passed without a terminal state.
    /// `None` polls until the network decides.
    pub deadline: Option<Duration>,

    /// Address → artifact mapping handed to the debug decoder
    pub contracts_file: Option<PathBuf>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            retry_interval: DEFAULT_RETRY_INTERVAL,
            deadline: None,
            contracts_file: None,
        }
    }
}

impl PollerConfig {
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_contracts_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.contracts_file = Some(path.into());
        self
    }
}

/// Follows a transaction until the network accepts or rejects it.
///
/// Each observation is classified on its own: the network may report a
/// status that goes backwards, and that is not an error. Rejection is
/// always terminal and never retried.
pub struct StatusPoller<Q, D = PassthroughDecoder, T = TokioTimer> {
    query: Q,
    decoder: D,
    timer: T,
    config: PollerConfig,
    metrics: Option<Arc<MetricsCollector>>,
}

impl<Q: TxStatusQuery> StatusPoller<Q> {
    pub fn new(query: Q, config: PollerConfig) -> Self {
        Self {
            query,
            decoder: PassthroughDecoder,
            timer: TokioTimer,
            config,
            metrics: None,
        }
    }
}

impl<Q, D, T> StatusPoller<Q, D, T>
where
    Q: TxStatusQuery,
    D: DebugDecoder,
    T: RetryTimer,
{
    pub fn with_decoder<D2: DebugDecoder>(self, decoder: D2) -> StatusPoller<Q, D2, T> {
        StatusPoller {
            query: self.query,
            decoder,
            timer: self.timer,
            config: self.config,
            metrics: self.metrics,
        }
    }

    pub fn with_timer<T2: RetryTimer>(self, timer: T2) -> StatusPoller<Q, D, T2> {
        StatusPoller {
            query: self.query,
            decoder: self.decoder,
            timer,
            config: self.config,
            metrics: self.metrics,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn network(&self) -> &str {
        self.query.network()
    }

    /// Fetch a transaction's status, following it as far as `mode` asks.
    ///
    /// Returns the last observed status; the error message is set only for
    /// rejected transactions. The future yields between polls and may be
    /// dropped to stop tracking.
    pub async fn track(
        &self,
        tx_hash: TxHash,
        mode: PollMode,
    ) -> Result<TransactionOutcome, TrackerError> {
        info!(
            tx_hash = %tx_hash,
            network = %self.query.network(),
            mode = %mode,
            "querying the network for transaction status"
        );

        let guard = TrackingGuard::start(self.metrics.as_deref());
        let result = self.resolve(tx_hash, mode, guard.started).await;
        if let (Err(e), Some(metrics)) = (&result, &self.metrics) {
            metrics.record_status_query_failure(e.kind());
        }
        result
    }

    async fn resolve(
        &self,
        tx_hash: TxHash,
        mode: PollMode,
        started: Instant,
    ) -> Result<TransactionOutcome, TrackerError> {
        let receipt = self.poll_receipt(tx_hash, mode, started).await?;

        if !receipt.status().is_rejected() {
            return Ok(TransactionOutcome::accepted_or_pending(
                tx_hash,
                receipt.status(),
            ));
        }

        let mut error_message = receipt.failure_message()?;
        if mode == PollMode::Debug {
            error_message = self.decode(tx_hash, error_message).await;
        }

        info!(tx_hash = %tx_hash, error_message = %error_message, "transaction rejected");
        Ok(TransactionOutcome::rejected(tx_hash, error_message))
    }

    async fn poll_receipt(
        &self,
        tx_hash: TxHash,
        mode: PollMode,
        started: Instant,
    ) -> Result<TransactionReceipt, TrackerError> {
        let mut queries: u32 = 0;
        let mut previous: Option<TransactionStatus> = None;

        loop {
            let payload = self.query.query(tx_hash).await?;
            queries += 1;

            let receipt = TransactionReceipt::from_payload(tx_hash, payload)?;
            let status = receipt.status();
            if let Some(metrics) = &self.metrics {
                metrics.record_status_query(status);
            }

            if let Some(prev) = previous.filter(|prev| status < *prev) {
                debug!(tx_hash = %tx_hash, from = %prev, to = %status, "transaction status went backwards");
            }
            previous = Some(status);

            if status.is_rejected() {
                warn!(tx_hash = %tx_hash, status = %status, queries, "transaction status");
                return Ok(receipt);
            }

            if status.is_accepted() {
                info!(tx_hash = %tx_hash, status = %status, queries, "transaction status, no error in transaction");
                return Ok(receipt);
            }

            if !mode.follows() {
                info!(tx_hash = %tx_hash, status = %status, "transaction status");
                return Ok(receipt);
            }

            if let Some(deadline) = self.config.deadline {
                if started.elapsed() + self.config.retry_interval > deadline {
                    return Err(TrackerError::DeadlineExceeded {
                        tx_hash,
                        last_status: status,
                        queries,
                        deadline,
                    });
                }
            }

            info!(
                tx_hash = %tx_hash,
                status = %status,
                retry_in_secs = self.config.retry_interval.as_secs_f64(),
                "transaction status, trying again"
            );
            self.timer.wait(self.config.retry_interval).await;
        }
    }

    /// Decoder failures fall back to the raw message
    async fn decode(&self, tx_hash: TxHash, error_message: String) -> String {
        let command = self.query.command(tx_hash);
        let result = self
            .decoder
            .decode(
                &error_message,
                &command,
                self.query.network(),
                self.config.contracts_file.as_deref(),
            )
            .await;

        let rewritten = result.is_ok();
        if let Some(metrics) = &self.metrics {
            metrics.record_debug_decode(rewritten);
        }

        match result {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(tx_hash = %tx_hash, error = %e, "could not decode error message, keeping raw message");
                error_message
            }
        }
    }
}

/// Keeps the active-tracker gauge balanced even when the future is dropped
struct TrackingGuard<'a> {
    metrics: Option<&'a MetricsCollector>,
    started: Instant,
}

impl<'a> TrackingGuard<'a> {
    fn start(metrics: Option<&'a MetricsCollector>) -> Self {
        if let Some(metrics) = metrics {
            metrics.record_tracking_started();
        }
        Self {
            metrics,
            started: Instant::now(),
        }
    }
}

impl Drop for TrackingGuard<'_> {
    fn drop(&mut self) {
        if let Some(metrics) = self.metrics {
            metrics.record_tracking_finished(self.started.elapsed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DecodeError, QueryError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Mutex;

    struct FixedQuery {
        payload: serde_json::Value,
    }

    #[async_trait]
    impl TxStatusQuery for FixedQuery {
        fn network(&self) -> &str {
            "goerli"
        }

        fn command(&self, tx_hash: TxHash) -> Vec<String> {
            vec!["starknet".to_string(), "tx_status".to_string(), tx_hash.to_string()]
        }

        async fn query(&self, _tx_hash: TxHash) -> Result<serde_json::Value, QueryError> {
            Ok(self.payload.clone())
        }
    }

    struct FailingQuery;

    #[async_trait]
    impl TxStatusQuery for FailingQuery {
        fn network(&self) -> &str {
            "goerli"
        }

        fn command(&self, _tx_hash: TxHash) -> Vec<String> {
            Vec::new()
        }

        async fn query(&self, _tx_hash: TxHash) -> Result<serde_json::Value, QueryError> {
            Err(QueryError::Other("gateway unreachable".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingDecoder {
        calls: Mutex<Vec<(String, Vec<String>, String)>>,
    }

    #[async_trait]
    impl DebugDecoder for RecordingDecoder {
        async fn decode(
            &self,
            error_message: &str,
            command: &[String],
            network: &str,
            _contracts_file: Option<&Path>,
        ) -> Result<String, DecodeError> {
            self.calls.lock().unwrap().push((
                error_message.to_string(),
                command.to_vec(),
                network.to_string(),
            ));
            Ok(format!("decoded: {error_message}"))
        }
    }

    struct BrokenDecoder;

    #[async_trait]
    impl DebugDecoder for BrokenDecoder {
        async fn decode(
            &self,
            _error_message: &str,
            _command: &[String],
            _network: &str,
            _contracts_file: Option<&Path>,
        ) -> Result<String, DecodeError> {
            Err(DecodeError::Other("artifacts missing".to_string()))
        }
    }

    fn rejected_payload(message: &str) -> serde_json::Value {
        json!({
            "tx_status": "REJECTED",
            "tx_failure_reason": { "code": "TRANSACTION_FAILED", "error_message": message }
        })
    }

    #[test]
    fn test_default_config() {
        let config = PollerConfig::default();
        assert_eq!(config.retry_interval, Duration::from_secs(30));
        assert!(config.deadline.is_none());
        assert!(config.contracts_file.is_none());
    }

    #[tokio::test]
    async fn test_accepted_has_no_error_message() {
        let poller = StatusPoller::new(
            FixedQuery {
                payload: json!({ "tx_status": "ACCEPTED_ON_L1" }),
            },
            PollerConfig::default(),
        );

        let outcome = poller.track(TxHash::from(1u64), PollMode::Track).await.unwrap();
        assert_eq!(outcome.status, TransactionStatus::AcceptedOnL1);
        assert!(outcome.error_message.is_none());
    }

    #[tokio::test]
    async fn test_rejected_without_reason_is_malformed() {
        let poller = StatusPoller::new(
            FixedQuery {
                payload: json!({ "tx_status": "REJECTED" }),
            },
            PollerConfig::default(),
        );

        let err = poller
            .track(TxHash::from(1u64), PollMode::None)
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::MalformedReceipt(_)));
    }

    #[tokio::test]
    async fn test_unknown_status_stops_polling() {
        let poller = StatusPoller::new(
            FixedQuery {
                payload: json!({ "tx_status": "REVERTED" }),
            },
            PollerConfig::default(),
        );

        let err = poller
            .track(TxHash::from(1u64), PollMode::Track)
            .await
            .unwrap_err();
        match err {
            TrackerError::UnknownStatus(e) => assert_eq!(e.label, "REVERTED"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_query_failure_propagates() {
        let poller = StatusPoller::new(FailingQuery, PollerConfig::default())
            .with_metrics(Arc::new(MetricsCollector::new()));

        let err = poller
            .track(TxHash::from(1u64), PollMode::Track)
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Query(_)));
        assert_eq!(err.kind(), "query");
    }

    #[tokio::test]
    async fn test_debug_mode_decodes_message() {
        let decoder = Arc::new(RecordingDecoder::default());
        let poller = StatusPoller::new(
            FixedQuery {
                payload: rejected_payload("Error at pc=0:5"),
            },
            PollerConfig::default(),
        )
        .with_decoder(decoder.clone());

        let outcome = poller.track(TxHash::from(0x2au64), PollMode::Debug).await.unwrap();
        assert_eq!(
            outcome.error_message.as_deref(),
            Some("decoded: Error at pc=0:5")
        );

        let calls = decoder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, vec!["starknet", "tx_status", "0x2a"]);
        assert_eq!(calls[0].2, "goerli");
    }

    #[tokio::test]
    async fn test_track_mode_does_not_decode() {
        let decoder = Arc::new(RecordingDecoder::default());
        let poller = StatusPoller::new(
            FixedQuery {
                payload: rejected_payload("Error at pc=0:5"),
            },
            PollerConfig::default(),
        )
        .with_decoder(decoder.clone());

        let outcome = poller.track(TxHash::from(1u64), PollMode::Track).await.unwrap();
        assert_eq!(outcome.error_message.as_deref(), Some("Error at pc=0:5"));
        assert!(decoder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_decoder_failure_keeps_raw_message() {
        let poller = StatusPoller::new(
            FixedQuery {
                payload: rejected_payload("Error at pc=0:5"),
            },
            PollerConfig::default(),
        )
        .with_decoder(BrokenDecoder);

        let outcome = poller.track(TxHash::from(1u64), PollMode::Debug).await.unwrap();
        assert_eq!(outcome.status, TransactionStatus::Rejected);
        assert_eq!(outcome.error_message.as_deref(), Some("Error at pc=0:5"));
    }
}
