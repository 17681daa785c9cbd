use async_trait::async_trait;
use stark_declare_types::TxHash;
use std::sync::Arc;

use crate::{QueryError, StarknetCli};

/// Point query for a transaction's current status.
///
/// Implementations return the raw response; classification happens in the
/// poller.
#[async_trait]
pub trait TxStatusQuery: Send + Sync {
    /// Network the query targets
    fn network(&self) -> &str;

    /// The command line this query runs, handed to the debug decoder
    fn command(&self, tx_hash: TxHash) -> Vec<String>;

    async fn query(&self, tx_hash: TxHash) -> Result<serde_json::Value, QueryError>;
}

#[async_trait]
impl<T: TxStatusQuery + ?Sized> TxStatusQuery for Arc<T> {
    fn network(&self) -> &str {
        (**self).network()
    }

    fn command(&self, tx_hash: TxHash) -> Vec<String> {
        (**self).command(tx_hash)
    }

    async fn query(&self, tx_hash: TxHash) -> Result<serde_json::Value, QueryError> {
        (**self).query(tx_hash).await
    }
}

/// `starknet tx_status --hash <tx>` through the toolchain CLI
#[derive(Debug, Clone)]
pub struct CliStatusQuery {
    cli: StarknetCli,
}

impl CliStatusQuery {
    pub fn new(cli: StarknetCli) -> Self {
        Self { cli }
    }

    fn args(tx_hash: TxHash) -> [String; 3] {
        ["tx_status".to_string(), "--hash".to_string(), tx_hash.to_string()]
    }
}

#[async_trait]
impl TxStatusQuery for CliStatusQuery {
    fn network(&self) -> &str {
        self.cli.network()
    }

    fn command(&self, tx_hash: TxHash) -> Vec<String> {
        self.cli.command_line(Self::args(tx_hash))
    }

    async fn query(&self, tx_hash: TxHash) -> Result<serde_json::Value, QueryError> {
        let stdout = self.cli.run(Self::args(tx_hash)).await?;
        Ok(serde_json::from_str(stdout.trim())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NetworkTarget;

    #[test]
    fn test_cli_query_command() {
        let query = CliStatusQuery::new(StarknetCli::new(
            "starknet",
            NetworkTarget::resolve("mainnet", None),
        ));

        assert_eq!(query.network(), "mainnet");
        assert_eq!(
            query.command(TxHash::from(0xabcu64)),
            vec![
                "starknet",
                "tx_status",
                "--hash",
                "0xabc",
                "--network",
                "alpha-mainnet"
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cli_query_parses_stdout() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("starknet");
        let mut file = std::fs::File::create(&script).unwrap();
        writeln!(file, "#!/bin/sh").unwrap();
        writeln!(file, "echo '{{\"tx_status\": \"PENDING\", \"block_hash\": \"0x1\"}}'").unwrap();
        drop(file);
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let query = CliStatusQuery::new(StarknetCli::new(
            &script,
            NetworkTarget::resolve("goerli", None),
        ));
        let payload = query.query(TxHash::from(1u64)).await.unwrap();
        assert_eq!(payload["tx_status"], "PENDING");
    }
}
