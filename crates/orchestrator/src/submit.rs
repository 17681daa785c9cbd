use async_trait::async_trait;
use regex::Regex;
use stark_declare_tracker::{NetworkTarget, StarknetCli};
use stark_declare_types::{Address, ClassHash, DeclareRequest, Felt, TxHash};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::SubmissionError;

/// Everything the toolchain needs to send one declaration
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitArgs {
    pub sender: Address,
    pub contract_name: String,
    pub signature: Vec<Felt>,
    pub max_fee: u128,
    pub network: String,
    pub overriding_path: Option<PathBuf>,
    pub mainnet_token: Option<String>,
}

impl From<&DeclareRequest> for SubmitArgs {
    fn from(request: &DeclareRequest) -> Self {
        Self {
            sender: request.sender,
            contract_name: request.contract_name.clone(),
            signature: request.signature.clone(),
            max_fee: request.effective_max_fee(),
            network: request.network.clone(),
            overriding_path: request.overriding_path.clone(),
            mainnet_token: request.mainnet_token.clone(),
        }
    }
}

/// Sends a declare transaction and returns the tool's raw output
#[async_trait]
pub trait DeclareSubmitter: Send + Sync {
    async fn submit(&self, args: &SubmitArgs) -> Result<String, SubmissionError>;
}

#[async_trait]
impl<S: DeclareSubmitter + ?Sized> DeclareSubmitter for Arc<S> {
    async fn submit(&self, args: &SubmitArgs) -> Result<String, SubmissionError> {
        (**self).submit(args).await
    }
}

/// `starknet declare` through the toolchain CLI
#[derive(Debug, Clone)]
pub struct CliDeclareSubmitter {
    program: PathBuf,
    artifacts_dir: PathBuf,
    gateway_urls: HashMap<String, String>,
}

impl CliDeclareSubmitter {
    pub fn new(program: impl Into<PathBuf>, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            artifacts_dir: artifacts_dir.into(),
            gateway_urls: HashMap::new(),
        }
    }

    /// Send `network` through `url` instead of its default target
    pub fn with_gateway(mut self, network: impl Into<String>, url: impl Into<String>) -> Self {
        self.gateway_urls.insert(network.into(), url.into());
        self
    }

    /// Compiled artifact for the contract
    pub fn contract_path(&self, args: &SubmitArgs) -> PathBuf {
        let base: &Path = args.overriding_path.as_deref().unwrap_or(&self.artifacts_dir);
        base.join(format!("{}.json", args.contract_name))
    }

    fn cli(&self, network: &str) -> StarknetCli {
        let gateway = self.gateway_urls.get(network).map(String::as_str);
        StarknetCli::new(&self.program, NetworkTarget::resolve(network, gateway))
    }

    /// Arguments after the program name, network selection excluded
    pub fn arguments(&self, args: &SubmitArgs) -> Vec<String> {
        let mut line = vec![
            "declare".to_string(),
            "--contract".to_string(),
            self.contract_path(args).display().to_string(),
            "--sender".to_string(),
            args.sender.to_string(),
            "--max_fee".to_string(),
            args.max_fee.to_string(),
        ];

        if !args.signature.is_empty() {
            line.push("--signature".to_string());
            line.extend(args.signature.iter().map(Felt::to_dec_string));
        }

        if let Some(token) = &args.mainnet_token {
            line.push("--token".to_string());
            line.push(token.clone());
        }

        line
    }
}

#[async_trait]
impl DeclareSubmitter for CliDeclareSubmitter {
    async fn submit(&self, args: &SubmitArgs) -> Result<String, SubmissionError> {
        let contract = self.contract_path(args);
        tokio::fs::metadata(&contract).await?;

        debug!(
            contract = %contract.display(),
            network = %args.network,
            "submitting declaration"
        );
        Ok(self.cli(&args.network).run(self.arguments(args)).await?)
    }
}

/// Pull `(class hash, transaction hash)` out of declare output: the first
/// two hex values, in that order
pub fn parse_submission_output(output: &str) -> Result<(ClassHash, TxHash), SubmissionError> {
    let parse_error = |reason: &str| SubmissionError::Parse {
        reason: reason.to_string(),
        output: output.trim().to_string(),
    };

    let hex_regex = Regex::new(r"0x[\da-fA-F]+").map_err(|e| parse_error(&e.to_string()))?;
    let mut values = hex_regex.find_iter(output).map(|m| m.as_str());

    let class_hash = values
        .next()
        .ok_or_else(|| parse_error("missing class hash"))?
        .parse::<ClassHash>()
        .map_err(|e| parse_error(&e.to_string()))?;
    let tx_hash = values
        .next()
        .ok_or_else(|| parse_error("missing transaction hash"))?
        .parse::<TxHash>()
        .map_err(|e| parse_error(&e.to_string()))?;

    Ok((class_hash, tx_hash))
}
