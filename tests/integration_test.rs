//! End-to-end declaration flows through [`DeclareContext`].
//!
//! The `starknet` binary is replaced by a shell script: `declare` prints a
//! class hash and a transaction hash, `tx_status` prints whatever receipt
//! the test last wrote to `status.json`.

#![cfg(unix)]

use stark_declare::{
    Address, AppConfig, ClassHash, DeclareContext, DeclareError, DeclareOutcome, DeclareRequest,
    Felt, PollMode, RecoveryAction, RegistryBackend, TransactionStatus, TxHash,
};
use stark_declare_config::NetworkConfig;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ═══════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════

const CLASS_HASH: u64 = 0x3fe8;
const TX_HASH: u64 = 0x7b1c;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("artifacts")).unwrap();
        std::fs::write(dir.path().join("artifacts/erc20.json"), "{}").unwrap();

        let script = dir.path().join("starknet");
        let mut file = std::fs::File::create(&script).unwrap();
        writeln!(file, "#!/bin/sh").unwrap();
        writeln!(file, "DIR=$(dirname \"$0\")").unwrap();
        writeln!(file, "case \"$1\" in").unwrap();
        writeln!(file, "  declare)").unwrap();
        writeln!(file, "    echo \"$@\" >> \"$DIR/declare.log\"").unwrap();
        writeln!(file, "    echo \"Declare transaction was sent.\"").unwrap();
        writeln!(file, "    echo \"Contract class hash: {CLASS_HASH:#x}\"").unwrap();
        writeln!(file, "    echo \"Transaction hash: {TX_HASH:#x}\"").unwrap();
        writeln!(file, "    ;;").unwrap();
        writeln!(file, "  tx_status) cat \"$DIR/status.json\" ;;").unwrap();
        writeln!(file, "  *) exit 2 ;;").unwrap();
        writeln!(file, "esac").unwrap();
        drop(file);
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn set_status(&self, receipt: serde_json::Value) {
        std::fs::write(self.path().join("status.json"), receipt.to_string()).unwrap();
    }

    fn declarations(&self) -> String {
        std::fs::read_to_string(self.path().join("devnet.declarations.txt")).unwrap_or_default()
    }

    fn submissions(&self) -> usize {
        std::fs::read_to_string(self.path().join("declare.log"))
            .map(|log| log.lines().count())
            .unwrap_or(0)
    }

    fn config(&self, default_poll_mode: Option<PollMode>) -> AppConfig {
        let mut config = AppConfig::default();
        config.logging.metrics_enabled = false;
        config.networks.insert(
            "devnet".to_string(),
            NetworkConfig {
                gateway_url: Some("http://127.0.0.1:5050/".to_string()),
            },
        );
        config.tracking.retry_interval_secs = 1;
        config.tracking.default_poll_mode = default_poll_mode;
        config.registry.backend = RegistryBackend::File;
        config.registry.directory = self.path().to_path_buf();
        config.toolchain.starknet_bin = self.path().join("starknet");
        config.toolchain.artifacts_dir = self.path().join("artifacts");
        config
    }

    async fn context(&self, default_poll_mode: Option<PollMode>) -> DeclareContext {
        DeclareContext::from_config(self.config(default_poll_mode))
            .await
            .unwrap()
    }
}

fn request(alias: &str) -> DeclareRequest {
    DeclareRequest::new(
        Address::from(0x4d2u64),
        "erc20",
        vec![Felt::from(12u64), Felt::from(34u64)],
        "devnet",
    )
    .with_alias(alias)
}

// ═══════════════════════════════════════════════════════════════════════════
// DECLARE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_accepted_declaration_commits_alias() {
    let fixture = Fixture::new();
    fixture.set_status(serde_json::json!({ "tx_status": "ACCEPTED_ON_L2" }));
    let ctx = fixture.context(Some(PollMode::Track)).await;

    let outcome = ctx.declare(request("token")).await.unwrap();

    match &outcome {
        DeclareOutcome::Declared {
            class_hash,
            tx_hash,
            outcome: Some(tracked),
        } => {
            assert_eq!(*class_hash, ClassHash::from(CLASS_HASH));
            assert_eq!(*tx_hash, TxHash::from(TX_HASH));
            assert_eq!(tracked.status, TransactionStatus::AcceptedOnL2);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        outcome.padded_class_hash().unwrap(),
        format!("0x{:0>64}", "3fe8")
    );

    let entry = ctx.registry().lookup("token", "devnet").await.unwrap().unwrap();
    assert!(!entry.is_provisional());
    assert_eq!(fixture.declarations().trim(), format!("{}:token", ClassHash::from(CLASS_HASH)));
}

#[tokio::test]
async fn test_rejected_declaration_rolls_back_alias() {
    let fixture = Fixture::new();
    fixture.set_status(serde_json::json!({
        "tx_status": "REJECTED",
        "tx_failure_reason": { "error_message": "Class already declared" }
    }));
    let ctx = fixture.context(Some(PollMode::Track)).await;

    let outcome = ctx.declare(request("token")).await.unwrap();

    assert!(outcome.is_rejected());
    assert_eq!(outcome.error_message(), Some("Class already declared"));
    assert!(outcome.class_hash().is_none());
    assert!(!ctx.registry().exists("token", "devnet").await.unwrap());
    assert!(!fixture.declarations().contains("token"));
}

#[tokio::test]
async fn test_declaration_without_tracking_leaves_provisional_alias() {
    let fixture = Fixture::new();
    let ctx = fixture.context(None).await;

    let outcome = ctx.declare(request("token")).await.unwrap();

    assert!(matches!(
        outcome,
        DeclareOutcome::Declared { outcome: None, .. }
    ));
    let entry = ctx.registry().lookup("token", "devnet").await.unwrap().unwrap();
    assert!(entry.is_provisional());
    assert_eq!(entry.pending_tx(), Some(TxHash::from(TX_HASH)));
}

#[tokio::test]
async fn test_request_poll_mode_overrides_default() {
    let fixture = Fixture::new();
    fixture.set_status(serde_json::json!({ "tx_status": "RECEIVED" }));
    // Default would follow forever; the request asks for a single query
    let ctx = fixture.context(Some(PollMode::Track)).await;

    let outcome = ctx
        .declare(request("token").with_poll_mode(PollMode::None))
        .await
        .unwrap();

    match outcome {
        DeclareOutcome::Declared {
            outcome: Some(tracked),
            ..
        } => assert_eq!(tracked.status, TransactionStatus::Received),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(ctx
        .registry()
        .lookup("token", "devnet")
        .await
        .unwrap()
        .unwrap()
        .is_provisional());
}

#[tokio::test]
async fn test_existing_alias_fails_before_submission() {
    let fixture = Fixture::new();
    fixture.set_status(serde_json::json!({ "tx_status": "ACCEPTED_ON_L1" }));
    let ctx = fixture.context(Some(PollMode::Track)).await;

    ctx.declare(request("token")).await.unwrap();
    assert_eq!(fixture.submissions(), 1);
    let before = fixture.declarations();

    let err = ctx.declare(request("token")).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DeclareError>(),
        Some(DeclareError::AliasConflict { alias, network }) if alias == "token" && network == "devnet"
    ));
    assert_eq!(fixture.submissions(), 1);
    assert_eq!(fixture.declarations(), before);
}

#[tokio::test]
async fn test_signature_sent_in_decimal() {
    let fixture = Fixture::new();
    let ctx = fixture.context(None).await;

    ctx.declare(request("token")).await.unwrap();

    let log = std::fs::read_to_string(fixture.path().join("declare.log")).unwrap();
    assert!(log.contains("--signature 12 34"));
    assert!(log.contains("--gateway_url http://127.0.0.1:5050/"));
}

// ═══════════════════════════════════════════════════════════════════════════
// RECOVERY
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_recovery_after_restart() {
    let fixture = Fixture::new();

    {
        let ctx = fixture.context(None).await;
        ctx.declare(request("token")).await.unwrap();
    }

    // A new process over the same directory finds the provisional entry
    fixture.set_status(serde_json::json!({ "tx_status": "ACCEPTED_ON_L2" }));
    let ctx = fixture.context(None).await;
    let report = ctx.recover("devnet").await.unwrap();

    assert_eq!(report.finalized(), 1);
    assert_eq!(
        report.get("token").unwrap().action,
        RecoveryAction::Finalized {
            status: TransactionStatus::AcceptedOnL2
        }
    );
    assert!(!ctx
        .registry()
        .lookup("token", "devnet")
        .await
        .unwrap()
        .unwrap()
        .is_provisional());

    // Nothing left to do on a second pass
    let report = ctx.recover("devnet").await.unwrap();
    assert!(report.results.is_empty());
}

#[tokio::test]
async fn test_recovery_rolls_back_rejected() {
    let fixture = Fixture::new();
    let ctx = fixture.context(None).await;
    ctx.declare(request("token")).await.unwrap();

    fixture.set_status(serde_json::json!({
        "tx_status": "REJECTED",
        "tx_failure_reason": { "error_message": "Out of gas" }
    }));
    let report = ctx.recover("devnet").await.unwrap();

    assert_eq!(report.rolled_back(), 1);
    assert!(!ctx.registry().exists("token", "devnet").await.unwrap());
}

// ═══════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_load_context_from_file() {
    let fixture = Fixture::new();
    let config_path: PathBuf = fixture.path().join("stark-declare.toml");
    let toml = format!(
        r#"
[logging]
metrics_enabled = false

[networks.devnet]
gateway_url = "http://127.0.0.1:5050/"

[tracking]
default_poll_mode = "track"

[registry]
backend = "sqlite"
sqlite_path = "{}"

[toolchain]
starknet_bin = "{}"
artifacts_dir = "{}"
"#,
        fixture.path().join("aliases.db").display(),
        fixture.path().join("starknet").display(),
        fixture.path().join("artifacts").display(),
    );
    std::fs::write(&config_path, toml).unwrap();
    fixture.set_status(serde_json::json!({ "tx_status": "ACCEPTED_ON_L2" }));

    let ctx = DeclareContext::load(&config_path).await.unwrap();
    ctx.declare(request("token")).await.unwrap();

    assert!(fixture.path().join("aliases.db").exists());
    assert!(!ctx
        .registry()
        .lookup("token", "devnet")
        .await
        .unwrap()
        .unwrap()
        .is_provisional());
}
