use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::{Address, ClassHash, Felt, TxHash};

// ═══════════════════════════════════════════════════════════════════════════
// POLL MODE
// ═══════════════════════════════════════════════════════════════════════════

/// How far to follow a transaction after submitting it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PollMode {
    /// Single query, report whatever state it returns
    #[default]
    None,
    /// Poll until accepted or rejected
    Track,
    /// Like `Track`, and decode rejection messages against local artifacts
    Debug,
}

impl PollMode {
    /// Whether non-terminal states are polled again
    pub fn follows(&self) -> bool {
        matches!(self, PollMode::Track | PollMode::Debug)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown poll mode: {0:?} (expected none, track or debug)")]
pub struct PollModeParseError(pub String);

impl FromStr for PollMode {
    type Err = PollModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(PollMode::None),
            "track" => Ok(PollMode::Track),
            "debug" => Ok(PollMode::Debug),
            _ => Err(PollModeParseError(s.to_string())),
        }
    }
}

impl fmt::Display for PollMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PollMode::None => "none",
            PollMode::Track => "track",
            PollMode::Debug => "debug",
        };
        f.write_str(s)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// DECLARE REQUEST
// ═══════════════════════════════════════════════════════════════════════════

/// Caller input for declaring a contract class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclareRequest {
    pub sender: Address,
    pub contract_name: String,
    pub signature: Vec<Felt>,
    pub network: String,
    pub alias: Option<String>,
    /// Defaults to zero when absent
    pub max_fee: Option<u128>,
    /// Directory to read compiled artifacts from instead of the default
    pub overriding_path: Option<PathBuf>,
    pub mainnet_token: Option<String>,
    /// Tracking requested after submission; `None` skips tracking entirely
    pub poll_mode: Option<PollMode>,
}

impl DeclareRequest {
    pub fn new(
        sender: Address,
        contract_name: impl Into<String>,
        signature: Vec<Felt>,
        network: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            contract_name: contract_name.into(),
            signature,
            network: network.into(),
            alias: None,
            max_fee: None,
            overriding_path: None,
            mainnet_token: None,
            poll_mode: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_max_fee(mut self, max_fee: u128) -> Self {
        self.max_fee = Some(max_fee);
        self
    }

    pub fn with_overriding_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.overriding_path = Some(path.into());
        self
    }

    pub fn with_mainnet_token(mut self, token: impl Into<String>) -> Self {
        self.mainnet_token = Some(token.into());
        self
    }

    pub fn with_poll_mode(mut self, mode: PollMode) -> Self {
        self.poll_mode = Some(mode);
        self
    }

    pub fn effective_max_fee(&self) -> u128 {
        self.max_fee.unwrap_or(0)
    }

    /// The alias, if one was given and is non-empty
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref().filter(|a| !a.is_empty())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ALIAS ENTRY
// ═══════════════════════════════════════════════════════════════════════════

/// Confirmation state of an alias binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AliasState {
    /// Registered right after submission, declaration not yet confirmed
    Provisional { tx_hash: TxHash },
    Committed,
}

/// A persisted alias → class hash binding, unique by `(alias, network)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub alias: String,
    pub class_hash: ClassHash,
    pub network: String,
    pub state: AliasState,
    /// Unix seconds
    pub created_at: u64,
}

impl AliasEntry {
    pub fn provisional(
        alias: impl Into<String>,
        class_hash: ClassHash,
        network: impl Into<String>,
        tx_hash: TxHash,
        created_at: u64,
    ) -> Self {
        Self {
            alias: alias.into(),
            class_hash,
            network: network.into(),
            state: AliasState::Provisional { tx_hash },
            created_at,
        }
    }

    pub fn committed(
        alias: impl Into<String>,
        class_hash: ClassHash,
        network: impl Into<String>,
        created_at: u64,
    ) -> Self {
        Self {
            alias: alias.into(),
            class_hash,
            network: network.into(),
            state: AliasState::Committed,
            created_at,
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self.state, AliasState::Provisional { .. })
    }

    /// Transaction awaiting confirmation, for provisional entries
    pub fn pending_tx(&self) -> Option<TxHash> {
        match self.state {
            AliasState::Provisional { tx_hash } => Some(tx_hash),
            AliasState::Committed => None,
        }
    }

    pub fn commit(&mut self) {
        self.state = AliasState::Committed;
    }
}
