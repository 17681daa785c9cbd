use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{DecodeError, StarknetCli};

/// Rewrites a rejection message using locally available build artifacts.
///
/// Best effort: the poller falls back to the raw message on any error.
#[async_trait]
pub trait DebugDecoder: Send + Sync {
    async fn decode(
        &self,
        error_message: &str,
        command: &[String],
        network: &str,
        contracts_file: Option<&Path>,
    ) -> Result<String, DecodeError>;
}

#[async_trait]
impl<D: DebugDecoder + ?Sized> DebugDecoder for Arc<D> {
    async fn decode(
        &self,
        error_message: &str,
        command: &[String],
        network: &str,
        contracts_file: Option<&Path>,
    ) -> Result<String, DecodeError> {
        (**self)
            .decode(error_message, command, network, contracts_file)
            .await
    }
}

/// Leaves messages untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughDecoder;

#[async_trait]
impl DebugDecoder for PassthroughDecoder {
    async fn decode(
        &self,
        error_message: &str,
        _command: &[String],
        _network: &str,
        _contracts_file: Option<&Path>,
    ) -> Result<String, DecodeError> {
        Ok(error_message.to_string())
    }
}

/// Re-runs the status query with `--contracts <file> --error_message` so
/// the toolchain can map the failing pc back to source
#[derive(Debug, Clone)]
pub struct CliDebugDecoder {
    cli: StarknetCli,
}

impl CliDebugDecoder {
    pub fn new(cli: StarknetCli) -> Self {
        Self { cli }
    }
}

#[async_trait]
impl DebugDecoder for CliDebugDecoder {
    async fn decode(
        &self,
        error_message: &str,
        command: &[String],
        network: &str,
        contracts_file: Option<&Path>,
    ) -> Result<String, DecodeError> {
        let contracts_file = match contracts_file {
            Some(path) if path.exists() => path,
            Some(path) => {
                warn!(
                    network = %network,
                    contracts_file = %path.display(),
                    "contracts file not found, cannot decode error message"
                );
                return Ok(error_message.to_string());
            }
            None => {
                warn!(network = %network, "no contracts file configured, cannot decode error message");
                return Ok(error_message.to_string());
            }
        };

        let mut line = command.to_vec();
        line.push("--contracts".to_string());
        line.push(contracts_file.display().to_string());
        line.push("--error_message".to_string());

        debug!(network = %network, "decoding error message with local artifacts");
        let output = self.cli.run_command_line(&line).await?;
        let decoded = output.trim();
        if decoded.is_empty() {
            return Err(DecodeError::EmptyOutput);
        }
        Ok(decoded.to_string())
    }
}
