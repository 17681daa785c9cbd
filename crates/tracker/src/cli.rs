use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::CommandError;

/// Gateway used for networks without a public alias
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:5050/";

/// Environment variable the toolchain reads to identify a custom network
pub const NETWORK_ID_ENV: &str = "STARKNET_NETWORK_ID";

/// How the toolchain should reach a network
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkTarget {
    /// A network the toolchain knows by id (`--network alpha-goerli`)
    Public { name: String, network_id: String },
    /// Any other network, addressed through its gateway URL
    Gateway { name: String, url: String },
}

impl NetworkTarget {
    /// Pick the target for a network name.
    ///
    /// An explicit gateway URL always wins; otherwise `mainnet` and
    /// `goerli`/`testnet` map to the public ids and anything else goes
    /// through the default local gateway.
    pub fn resolve(name: &str, gateway_url: Option<&str>) -> Self {
        if let Some(url) = gateway_url {
            return NetworkTarget::Gateway {
                name: name.to_string(),
                url: url.to_string(),
            };
        }

        let public = match name {
            "mainnet" => Some("alpha-mainnet"),
            "goerli" | "testnet" => Some("alpha-goerli"),
            _ => None,
        };

        match public {
            Some(id) => NetworkTarget::Public {
                name: name.to_string(),
                network_id: id.to_string(),
            },
            None => NetworkTarget::Gateway {
                name: name.to_string(),
                url: DEFAULT_GATEWAY_URL.to_string(),
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            NetworkTarget::Public { name, .. } | NetworkTarget::Gateway { name, .. } => name,
        }
    }

    /// Arguments selecting this network on the command line
    pub fn args(&self) -> Vec<String> {
        match self {
            NetworkTarget::Public { network_id, .. } => {
                vec!["--network".to_string(), network_id.clone()]
            }
            NetworkTarget::Gateway { url, .. } => vec![
                "--gateway_url".to_string(),
                url.clone(),
                "--feeder_gateway_url".to_string(),
                url.clone(),
            ],
        }
    }

    /// Environment the child process needs for this network
    pub fn envs(&self) -> Vec<(String, String)> {
        match self {
            NetworkTarget::Public { .. } => Vec::new(),
            NetworkTarget::Gateway { name, .. } => {
                vec![(NETWORK_ID_ENV.to_string(), name.clone())]
            }
        }
    }
}

/// Runs the `starknet` toolchain binary against one network
#[derive(Debug, Clone)]
pub struct StarknetCli {
    program: PathBuf,
    target: NetworkTarget,
}

impl StarknetCli {
    pub fn new(program: impl Into<PathBuf>, target: NetworkTarget) -> Self {
        Self {
            program: program.into(),
            target,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn target(&self) -> &NetworkTarget {
        &self.target
    }

    pub fn network(&self) -> &str {
        self.target.name()
    }

    /// Full command line: program, `args`, then the network selection
    pub fn command_line<I, S>(&self, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut line = vec![self.program.display().to_string()];
        line.extend(args.into_iter().map(Into::into));
        line.extend(self.target.args());
        line
    }

    /// Run `args` against the configured network and return stdout
    pub async fn run<I, S>(&self, args: I) -> Result<String, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let line = self.command_line(args);
        self.run_command_line(&line).await
    }

    /// Run a prepared command line with this network's environment
    pub async fn run_command_line(&self, line: &[String]) -> Result<String, CommandError> {
        let (program, args) = line.split_first().ok_or(CommandError::EmptyCommand)?;
        debug!(command = %line.join(" "), "running toolchain command");

        let output = Command::new(program)
            .args(args)
            .envs(self.target.envs())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CommandError::Failed {
                command: line.join(" "),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
