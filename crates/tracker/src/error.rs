use stark_declare_types::{
    MalformedReceiptError, ReceiptStatusError, TransactionStatus, TxHash, UnknownStatusError,
};
use std::time::Duration;
use thiserror::Error;

/// Failure running an external toolchain command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {code:?}: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("empty command line")]
    EmptyCommand,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("invalid JSON in status response: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("status query failed: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("decoder produced no output")]
    EmptyOutput,

    #[error("decode failed: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatusError),

    #[error(transparent)]
    MalformedReceipt(#[from] MalformedReceiptError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(
        "transaction {tx_hash} still {last_status} after {queries} queries, deadline of {deadline:?} exceeded"
    )]
    DeadlineExceeded {
        tx_hash: TxHash,
        last_status: TransactionStatus,
        queries: u32,
        deadline: Duration,
    },
}

impl From<ReceiptStatusError> for TrackerError {
    fn from(err: ReceiptStatusError) -> Self {
        match err {
            ReceiptStatusError::Unknown(e) => TrackerError::UnknownStatus(e),
            ReceiptStatusError::Malformed(e) => TrackerError::MalformedReceipt(e),
        }
    }
}

impl TrackerError {
    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            TrackerError::UnknownStatus(_) => "unknown_status",
            TrackerError::MalformedReceipt(_) => "malformed_receipt",
            TrackerError::Query(_) => "query",
            TrackerError::DeadlineExceeded { .. } => "deadline",
        }
    }
}
