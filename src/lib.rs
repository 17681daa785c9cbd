//! Declare StarkNet contract classes and keep their aliases in step with
//! what the network decides.
//!
//! The member crates do the work; this crate re-exports them and provides
//! [`DeclareContext`], which turns an [`AppConfig`] into the `starknet`
//! CLI collaborators, an alias store and per-network orchestrators.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use stark_declare::{Address, DeclareContext, DeclareRequest, PollMode};
//! use std::path::Path;
//!
//! let ctx = DeclareContext::load(Path::new("config/local.toml")).await?;
//! ctx.init_tracing()?;
//!
//! let request = DeclareRequest::new(Address::from(0x1234u64), "erc20", vec![], "devnet")
//!     .with_alias("token")
//!     .with_poll_mode(PollMode::Track);
//! let outcome = ctx.declare(request).await?;
//! println!("{:?}", outcome.padded_class_hash());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub use stark_declare_config::{
    validate_config, AppConfig, ConfigLoader, RegistryBackend, RegistryConfig, ENV_PREFIX,
};
pub use stark_declare_metrics::{init_tracing, MetricsCollector, TracingOptions};
pub use stark_declare_orchestrator::{
    AliasRecovery, CliDeclareSubmitter, DeclareError, DeclareOrchestrator, DeclareOutcome,
    DeclareSubmitter, RecoveryAction, RecoveryReport,
};
pub use stark_declare_registry::{
    AliasRegistry, AliasStore, FileAliasStore, InMemoryAliasStore, SqliteAliasStore, StoreError,
};
pub use stark_declare_tracker::{
    CliDebugDecoder, CliStatusQuery, NetworkTarget, PollerConfig, StarknetCli, StatusPoller,
    TrackerError, TxStatusQuery,
};
pub use stark_declare_types::{
    Address, AliasEntry, ClassHash, DeclareRequest, Felt, PollMode, TransactionOutcome,
    TransactionStatus, TxHash,
};

/// Store selected at runtime from [`RegistryConfig`]
pub type SharedAliasStore = Arc<dyn AliasStore>;

pub type CliPoller = StatusPoller<CliStatusQuery, CliDebugDecoder>;

pub type CliOrchestrator = DeclareOrchestrator<
    Arc<CliDeclareSubmitter>,
    SharedAliasStore,
    CliStatusQuery,
    CliDebugDecoder,
>;

pub type CliRecovery = AliasRecovery<SharedAliasStore, CliStatusQuery, CliDebugDecoder>;

/// Open the alias store `config` selects
pub async fn open_store(config: &RegistryConfig) -> Result<SharedAliasStore> {
    let store: SharedAliasStore = match config.backend {
        RegistryBackend::File => Arc::new(FileAliasStore::new(&config.directory)),
        RegistryBackend::Sqlite => Arc::new(
            SqliteAliasStore::new(&config.sqlite_path)
                .await
                .with_context(|| {
                    format!(
                        "failed to open alias database {}",
                        config.sqlite_path.display()
                    )
                })?,
        ),
        RegistryBackend::Memory => Arc::new(InMemoryAliasStore::new()),
    };

    info!(backend = ?config.backend, "opened alias store");
    Ok(store)
}

/// Configured collaborators shared by every declaration and recovery pass
pub struct DeclareContext {
    config: AppConfig,
    registry: Arc<AliasRegistry<SharedAliasStore>>,
    submitter: Arc<CliDeclareSubmitter>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl DeclareContext {
    /// Load a config file (with `STARK_DECLARE_*` overrides) and build a
    /// context from it
    pub async fn load(path: &Path) -> Result<Self> {
        let config = ConfigLoader::from_file_with_env(path, ENV_PREFIX)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        Self::from_config(config).await
    }

    /// Validate `config` and open its alias store
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        validate_config(&config).context("invalid configuration")?;
        let store = open_store(&config.registry).await?;
        Ok(Self::with_store(config, store))
    }

    /// Build a context over an already opened store
    pub fn with_store(config: AppConfig, store: SharedAliasStore) -> Self {
        let submitter = config.networks.iter().fold(
            CliDeclareSubmitter::new(
                &config.toolchain.starknet_bin,
                &config.toolchain.artifacts_dir,
            ),
            |submitter, (name, network)| match &network.gateway_url {
                Some(url) => submitter.with_gateway(name, url),
                None => submitter,
            },
        );

        let metrics = config
            .logging
            .metrics_enabled
            .then(|| Arc::new(MetricsCollector::new()));

        Self {
            registry: Arc::new(AliasRegistry::new(store)),
            submitter: Arc::new(submitter),
            metrics,
            config,
        }
    }

    /// Install the global tracing subscriber described by the logging
    /// section
    pub fn init_tracing(&self) -> Result<()> {
        let options = TracingOptions {
            filter: self.config.logging.log_level.clone(),
            json: self.config.logging.json,
        };
        init_tracing(&options, self.metrics.clone()).context("failed to initialize tracing")
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<AliasRegistry<SharedAliasStore>> {
        &self.registry
    }

    pub fn metrics(&self) -> Option<&Arc<MetricsCollector>> {
        self.metrics.as_ref()
    }

    /// Status poller for `network`, using the tracking section
    pub fn poller_for(&self, network: &str) -> CliPoller {
        let cli = StarknetCli::new(
            &self.config.toolchain.starknet_bin,
            NetworkTarget::resolve(network, self.config.gateway_url(network)),
        );

        let tracking = &self.config.tracking;
        let mut poller_config = PollerConfig::default().with_retry_interval(tracking.retry_interval());
        if let Some(deadline) = tracking.deadline() {
            poller_config = poller_config.with_deadline(deadline);
        }
        if let Some(contracts_file) = &self.config.toolchain.contracts_file {
            poller_config = poller_config.with_contracts_file(contracts_file);
        }

        let poller = StatusPoller::new(CliStatusQuery::new(cli.clone()), poller_config)
            .with_decoder(CliDebugDecoder::new(cli));
        match &self.metrics {
            Some(metrics) => poller.with_metrics(metrics.clone()),
            None => poller,
        }
    }

    pub fn orchestrator_for(&self, network: &str) -> CliOrchestrator {
        let orchestrator = DeclareOrchestrator::new(
            self.submitter.clone(),
            self.registry.clone(),
            self.poller_for(network),
        );
        match &self.metrics {
            Some(metrics) => orchestrator.with_metrics(metrics.clone()),
            None => orchestrator,
        }
    }

    pub fn recovery_for(&self, network: &str) -> CliRecovery {
        let recovery = AliasRecovery::new(self.registry.clone(), self.poller_for(network))
            .with_concurrency(self.config.tracking.recovery_concurrency);
        match &self.metrics {
            Some(metrics) => recovery.with_metrics(metrics.clone()),
            None => recovery,
        }
    }

    /// Declare on the request's network.
    ///
    /// Requests without a poll mode get `tracking.default_poll_mode`.
    /// [`DeclareError`] stays reachable through `downcast_ref`.
    pub async fn declare(&self, mut request: DeclareRequest) -> Result<DeclareOutcome> {
        if request.poll_mode.is_none() {
            request.poll_mode = self.config.tracking.default_poll_mode;
        }

        let network = request.network.clone();
        let contract = request.contract_name.clone();
        self.orchestrator_for(&network)
            .declare(request)
            .await
            .with_context(|| format!("failed to declare {contract} on {network}"))
    }

    /// Resolve provisional aliases left on `network` by interrupted runs
    pub async fn recover(&self, network: &str) -> Result<RecoveryReport> {
        self.recovery_for(network)
            .reconcile()
            .await
            .with_context(|| format!("alias recovery on {network} failed"))
    }

    /// Prometheus text exposition, `None` with metrics disabled
    pub fn export_metrics(&self) -> Result<Option<String>> {
        self.metrics
            .as_ref()
            .map(|metrics| metrics.export_metrics())
            .transpose()
            .context("failed to export metrics")
    }
}
