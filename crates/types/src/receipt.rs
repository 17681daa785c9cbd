use serde::{Deserialize, Serialize};

use crate::{MalformedReceiptError, ReceiptStatusError, TransactionStatus, TxHash};

/// A single status observation for a transaction.
///
/// The raw response is kept so rejection diagnostics can be read without a
/// second query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    tx_hash: TxHash,
    status: TransactionStatus,
    raw_payload: serde_json::Value,
}

impl TransactionReceipt {
    /// Build a receipt from a raw query response
    pub fn from_payload(
        tx_hash: TxHash,
        raw_payload: serde_json::Value,
    ) -> Result<Self, ReceiptStatusError> {
        let status = TransactionStatus::from_receipt(&raw_payload)?;
        Ok(Self {
            tx_hash,
            status,
            raw_payload,
        })
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn raw_payload(&self) -> &serde_json::Value {
        &self.raw_payload
    }

    /// `tx_failure_reason.error_message` of a rejected transaction
    pub fn failure_message(&self) -> Result<String, MalformedReceiptError> {
        self.raw_payload
            .get("tx_failure_reason")
            .and_then(|reason| reason.get("error_message"))
            .and_then(|msg| msg.as_str())
            .map(str::to_string)
            .ok_or_else(|| MalformedReceiptError::missing("tx_failure_reason.error_message"))
    }
}

/// Final report of a tracking run, returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    pub tx_hash: TxHash,
    pub status: TransactionStatus,
    /// Populated only for rejected transactions
    pub error_message: Option<String>,
}

impl TransactionOutcome {
    pub fn accepted_or_pending(tx_hash: TxHash, status: TransactionStatus) -> Self {
        debug_assert!(!status.is_rejected());
        Self {
            tx_hash,
            status,
            error_message: None,
        }
    }

    pub fn rejected(tx_hash: TxHash, error_message: String) -> Self {
        Self {
            tx_hash,
            status: TransactionStatus::Rejected,
            error_message: Some(error_message),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status.is_accepted()
    }

    pub fn is_rejected(&self) -> bool {
        self.status.is_rejected()
    }
}
