use stark_declare_metrics::{DeclarationResult, DeclareSpan, ErrorContext, MetricsCollector};
use stark_declare_registry::{AliasRegistry, AliasStore};
use stark_declare_tracker::{
    DebugDecoder, PassthroughDecoder, RetryTimer, StatusPoller, TokioTimer, TxStatusQuery,
};
use stark_declare_types::{ClassHash, DeclareRequest, TransactionOutcome, TxHash};
use std::sync::Arc;
use tracing::{info, warn, Instrument};

use crate::submit::{parse_submission_output, DeclareSubmitter, SubmitArgs};
use crate::DeclareError;

/// Result of a declaration that reached the network
#[derive(Debug, Clone, PartialEq)]
pub enum DeclareOutcome {
    /// Submitted, and accepted or still in flight. `outcome` is `None` when
    /// no tracking was requested.
    Declared {
        class_hash: ClassHash,
        tx_hash: TxHash,
        outcome: Option<TransactionOutcome>,
    },

    /// The network rejected the declaration; its alias was rolled back
    Rejected {
        class_hash: ClassHash,
        outcome: TransactionOutcome,
    },
}

impl DeclareOutcome {
    /// Declared class hash, `None` on rejection
    pub fn class_hash(&self) -> Option<&ClassHash> {
        match self {
            DeclareOutcome::Declared { class_hash, .. } => Some(class_hash),
            DeclareOutcome::Rejected { .. } => None,
        }
    }

    /// Class hash as `0x` + 64 hex digits, `None` on rejection
    pub fn padded_class_hash(&self) -> Option<String> {
        self.class_hash().map(|hash| hash.felt().to_fixed_hex())
    }

    pub fn tx_hash(&self) -> TxHash {
        match self {
            DeclareOutcome::Declared { tx_hash, .. } => *tx_hash,
            DeclareOutcome::Rejected { outcome, .. } => outcome.tx_hash,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, DeclareOutcome::Rejected { .. })
    }

    /// The network's failure message, for rejections
    pub fn error_message(&self) -> Option<&str> {
        match self {
            DeclareOutcome::Rejected { outcome, .. } => outcome.error_message.as_deref(),
            DeclareOutcome::Declared { .. } => None,
        }
    }
}

/// Metric label for a finished declaration; each declaration gets exactly one
pub fn declaration_result(result: &Result<DeclareOutcome, DeclareError>) -> DeclarationResult {
    match result {
        Ok(DeclareOutcome::Rejected { .. }) => DeclarationResult::Rejected,
        Ok(DeclareOutcome::Declared { outcome: None, .. }) => DeclarationResult::Submitted,
        Ok(DeclareOutcome::Declared {
            outcome: Some(outcome),
            ..
        }) if outcome.is_accepted() => DeclarationResult::Accepted,
        Ok(DeclareOutcome::Declared { .. }) => DeclarationResult::Pending,
        Err(DeclareError::AliasConflict { .. }) => DeclarationResult::AliasConflict,
        Err(_) => DeclarationResult::Failed,
    }
}

/// Declares contract classes on one network and keeps the alias registry
/// in step with what the network decides.
///
/// The alias is written provisionally as soon as the submission returns a
/// class hash, committed once the network accepts the declaration and
/// removed if it is rejected.
pub struct DeclareOrchestrator<Sub, S, Q, D = PassthroughDecoder, T = TokioTimer> {
    submitter: Sub,
    registry: Arc<AliasRegistry<S>>,
    poller: StatusPoller<Q, D, T>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl<Sub, S, Q, D, T> DeclareOrchestrator<Sub, S, Q, D, T>
where
    Sub: DeclareSubmitter,
    S: AliasStore,
    Q: TxStatusQuery,
    D: DebugDecoder,
    T: RetryTimer,
{
    pub fn new(submitter: Sub, registry: Arc<AliasRegistry<S>>, poller: StatusPoller<Q, D, T>) -> Self {
        Self {
            submitter,
            registry,
            poller,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &Arc<AliasRegistry<S>> {
        &self.registry
    }

    pub fn poller(&self) -> &StatusPoller<Q, D, T> {
        &self.poller
    }

    /// Network this orchestrator declares on
    pub fn network(&self) -> &str {
        self.poller.network()
    }

    /// Declare `request.contract_name` and track it as far as
    /// `request.poll_mode` asks.
    ///
    /// An existing alias fails before anything is sent. A rejected
    /// declaration is reported as [`DeclareOutcome::Rejected`], not an error.
    pub async fn declare(&self, request: DeclareRequest) -> Result<DeclareOutcome, DeclareError> {
        let span = DeclareSpan::new(&request.contract_name, &request.network, request.alias());
        let result = self
            .run(&request)
            .instrument(span.span())
            .await
            .with_correlation_id(span.correlation_id);

        if let Some(metrics) = &self.metrics {
            metrics.record_declaration(declaration_result(&result));
        }

        result
    }

    async fn run(&self, request: &DeclareRequest) -> Result<DeclareOutcome, DeclareError> {
        if request.network != self.network() {
            return Err(DeclareError::NetworkMismatch {
                expected: self.network().to_string(),
                requested: request.network.clone(),
            });
        }

        info!(contract = %request.contract_name, "declaring contract");

        let alias = request.alias();
        if let Some(alias) = alias {
            if self.registry.exists(alias, &request.network).await? {
                warn!(alias = %alias, network = %request.network, "alias already exists");
                return Err(DeclareError::AliasConflict {
                    alias: alias.to_string(),
                    network: request.network.clone(),
                });
            }
        }

        let output = self.submitter.submit(&SubmitArgs::from(request)).await?;
        let (class_hash, tx_hash) = parse_submission_output(&output)?;
        info!(
            contract = %request.contract_name,
            class_hash = %class_hash,
            tx_hash = %tx_hash,
            "successfully sent declaration"
        );

        self.registry
            .register(class_hash, &request.network, alias, Some(tx_hash))
            .await?;

        let Some(mode) = request.poll_mode else {
            return Ok(DeclareOutcome::Declared {
                class_hash,
                tx_hash,
                outcome: None,
            });
        };

        let outcome = self.poller.track(tx_hash, mode).await?;

        if outcome.is_rejected() {
            self.registry
                .unregister(class_hash, &request.network, alias, true)
                .await?;
            if let (Some(metrics), Some(_)) = (&self.metrics, alias) {
                metrics.record_alias_rollback();
            }
            warn!(
                class_hash = %class_hash,
                tx_hash = %tx_hash,
                error_message = outcome.error_message.as_deref().unwrap_or(""),
                "declaration rejected"
            );
            return Ok(DeclareOutcome::Rejected {
                class_hash,
                outcome,
            });
        }

        if outcome.is_accepted() {
            if let Some(alias) = alias {
                self.registry.finalize(alias, &request.network).await?;
            }
        }

        Ok(DeclareOutcome::Declared {
            class_hash,
            tx_hash,
            outcome: Some(outcome),
        })
    }
}
