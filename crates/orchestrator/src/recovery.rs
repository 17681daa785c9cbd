use futures::stream::{self, StreamExt};
use stark_declare_metrics::{ErrorContext, MetricsCollector};
use stark_declare_registry::{AliasRegistry, AliasStore};
use stark_declare_tracker::{
    DebugDecoder, PassthroughDecoder, RetryTimer, StatusPoller, TokioTimer, TxStatusQuery,
};
use stark_declare_types::{AliasEntry, ClassHash, PollMode, TransactionStatus, TxHash};
use std::sync::Arc;
use tracing::info;

use crate::RecoveryError;

/// Entries reconciled at the same time
pub const DEFAULT_CONCURRENCY: usize = 4;

/// What happened to one provisional alias
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryAction {
    /// Declaration accepted, alias committed
    Finalized { status: TransactionStatus },

    /// Declaration rejected, alias removed
    RolledBack { error_message: Option<String> },

    /// Still in flight, left provisional
    StillPending { status: TransactionStatus },

    /// Could not reconcile, left untouched
    Failed { reason: String },
}

impl RecoveryAction {
    /// Short label for metrics
    pub fn label(&self) -> &'static str {
        match self {
            RecoveryAction::Finalized { .. } => "finalized",
            RecoveryAction::RolledBack { .. } => "rolled_back",
            RecoveryAction::StillPending { .. } => "pending",
            RecoveryAction::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryResult {
    pub alias: String,
    pub class_hash: ClassHash,
    pub tx_hash: TxHash,
    pub action: RecoveryAction,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecoveryReport {
    pub network: String,
    pub results: Vec<RecoveryResult>,
}

impl RecoveryReport {
    fn count(&self, label: &str) -> usize {
        self.results
            .iter()
            .filter(|r| r.action.label() == label)
            .count()
    }

    pub fn finalized(&self) -> usize {
        self.count("finalized")
    }

    pub fn rolled_back(&self) -> usize {
        self.count("rolled_back")
    }

    pub fn pending(&self) -> usize {
        self.count("pending")
    }

    pub fn failed(&self) -> usize {
        self.count("failed")
    }

    /// Result for one alias
    pub fn get(&self, alias: &str) -> Option<&RecoveryResult> {
        self.results.iter().find(|r| r.alias == alias)
    }
}

/// Resolves provisional aliases left behind by interrupted declarations.
///
/// Each provisional entry's transaction is queried once: rejected entries
/// are removed, accepted ones committed, the rest left for a later pass.
pub struct AliasRecovery<S, Q, D = PassthroughDecoder, T = TokioTimer> {
    registry: Arc<AliasRegistry<S>>,
    poller: StatusPoller<Q, D, T>,
    concurrency: usize,
    metrics: Option<Arc<MetricsCollector>>,
}

impl<S, Q, D, T> AliasRecovery<S, Q, D, T>
where
    S: AliasStore,
    Q: TxStatusQuery,
    D: DebugDecoder,
    T: RetryTimer,
{
    pub fn new(registry: Arc<AliasRegistry<S>>, poller: StatusPoller<Q, D, T>) -> Self {
        Self {
            registry,
            poller,
            concurrency: DEFAULT_CONCURRENCY,
            metrics: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Reconcile every provisional alias on the poller's network
    pub async fn reconcile(&self) -> Result<RecoveryReport, RecoveryError> {
        let network = self.poller.network().to_string();
        let entries = self.registry.provisional(&network).await?;
        info!(network = %network, provisional = entries.len(), "reconciling provisional aliases");

        let pending = entries
            .into_iter()
            .filter_map(|entry| entry.pending_tx().map(|tx_hash| (entry, tx_hash)));

        let results: Vec<RecoveryResult> = stream::iter(pending)
            .map(|(entry, tx_hash)| async move {
                let action = match self
                    .reconcile_entry(&entry, tx_hash)
                    .await
                    .with_tx_hash(&tx_hash.to_string())
                {
                    Ok(action) => action,
                    Err(e) => RecoveryAction::Failed {
                        reason: e.to_string(),
                    },
                };

                if let Some(metrics) = &self.metrics {
                    metrics.record_alias_recovery(action.label());
                }

                RecoveryResult {
                    alias: entry.alias,
                    class_hash: entry.class_hash,
                    tx_hash,
                    action,
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let report = RecoveryReport { network, results };
        info!(
            network = %report.network,
            finalized = report.finalized(),
            rolled_back = report.rolled_back(),
            pending = report.pending(),
            failed = report.failed(),
            "reconciliation complete"
        );
        Ok(report)
    }

    async fn reconcile_entry(
        &self,
        entry: &AliasEntry,
        tx_hash: TxHash,
    ) -> Result<RecoveryAction, RecoveryError> {
        let outcome = self.poller.track(tx_hash, PollMode::None).await?;

        if outcome.is_rejected() {
            self.registry
                .unregister(entry.class_hash, &entry.network, Some(&entry.alias), true)
                .await?;
            info!(alias = %entry.alias, tx_hash = %tx_hash, "declaration was rejected, alias removed");
            return Ok(RecoveryAction::RolledBack {
                error_message: outcome.error_message,
            });
        }

        if outcome.is_accepted() {
            self.registry.finalize(&entry.alias, &entry.network).await?;
            info!(alias = %entry.alias, tx_hash = %tx_hash, "declaration was accepted, alias committed");
            return Ok(RecoveryAction::Finalized {
                status: outcome.status,
            });
        }

        Ok(RecoveryAction::StillPending {
            status: outcome.status,
        })
    }
}
