use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raised when the network reports a status label outside the known set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transaction status: {label:?}")]
pub struct UnknownStatusError {
    pub label: String,
}

/// Raised when a query response lacks a field the lifecycle depends on
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed receipt: missing or invalid field `{field}`")]
pub struct MalformedReceiptError {
    pub field: String,
}

impl MalformedReceiptError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

/// Errors from reading a status out of a raw receipt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiptStatusError {
    #[error(transparent)]
    Unknown(#[from] UnknownStatusError),

    #[error(transparent)]
    Malformed(#[from] MalformedReceiptError),
}

/// Lifecycle of a transaction as reported by the network.
///
/// Variants are declared in progress order: a rejected transaction never
/// progresses, the two accepted states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Rejected,
    NotReceived,
    Received,
    Pending,
    AcceptedOnL2,
    AcceptedOnL1,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 6] = [
        TransactionStatus::Rejected,
        TransactionStatus::NotReceived,
        TransactionStatus::Received,
        TransactionStatus::Pending,
        TransactionStatus::AcceptedOnL2,
        TransactionStatus::AcceptedOnL1,
    ];

    /// Map a raw network label onto the lifecycle.
    ///
    /// Labels may use underscores or spaces as separators
    /// (`ACCEPTED_ON_L2` and `ACCEPTED ON L2` are equivalent).
    pub fn classify(raw_label: &str) -> Result<Self, UnknownStatusError> {
        let normalized = raw_label.replace(' ', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_label() == normalized)
            .ok_or_else(|| UnknownStatusError {
                label: raw_label.to_string(),
            })
    }

    /// Classify the `tx_status` field of a raw query response
    pub fn from_receipt(receipt: &serde_json::Value) -> Result<Self, ReceiptStatusError> {
        let label = receipt
            .get("tx_status")
            .and_then(|v| v.as_str())
            .ok_or_else(|| MalformedReceiptError::missing("tx_status"))?;
        Ok(Self::classify(label)?)
    }

    /// Underscore-separated label as the network spells it
    pub fn as_label(&self) -> &'static str {
        match self {
            TransactionStatus::Rejected => "REJECTED",
            TransactionStatus::NotReceived => "NOT_RECEIVED",
            TransactionStatus::Received => "RECEIVED",
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::AcceptedOnL2 => "ACCEPTED_ON_L2",
            TransactionStatus::AcceptedOnL1 => "ACCEPTED_ON_L1",
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            TransactionStatus::AcceptedOnL2 | TransactionStatus::AcceptedOnL1
        )
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, TransactionStatus::Rejected)
    }

    /// Neither accepted nor rejected; polling may continue
    pub fn is_pending(&self) -> bool {
        match self {
            TransactionStatus::NotReceived
            | TransactionStatus::Received
            | TransactionStatus::Pending => true,
            TransactionStatus::Rejected
            | TransactionStatus::AcceptedOnL2
            | TransactionStatus::AcceptedOnL1 => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }
}

impl FromStr for TransactionStatus {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::classify(s)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_label().replace('_', " "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_known_labels() {
        let cases = [
            ("REJECTED", TransactionStatus::Rejected),
            ("NOT_RECEIVED", TransactionStatus::NotReceived),
            ("RECEIVED", TransactionStatus::Received),
            ("PENDING", TransactionStatus::Pending),
            ("ACCEPTED_ON_L2", TransactionStatus::AcceptedOnL2),
            ("ACCEPTED_ON_L1", TransactionStatus::AcceptedOnL1),
        ];

        for (label, expected) in cases {
            assert_eq!(TransactionStatus::classify(label).unwrap(), expected);
        }
    }

    #[test]
    fn test_classify_space_separated_labels() {
        assert_eq!(
            TransactionStatus::classify("ACCEPTED ON L2").unwrap(),
            TransactionStatus::AcceptedOnL2
        );
        assert_eq!(
            TransactionStatus::classify("NOT RECEIVED").unwrap(),
            TransactionStatus::NotReceived
        );
    }

    #[test]
    fn test_classify_unknown_label() {
        let err = TransactionStatus::classify("ACCEPTED_ON_L3").unwrap_err();
        assert_eq!(err.label, "ACCEPTED_ON_L3");

        assert!(TransactionStatus::classify("").is_err());
        assert!(TransactionStatus::classify("pending").is_err());
    }

    #[test]
    fn test_classify_does_not_trim() {
        assert!(TransactionStatus::classify(" PENDING").is_err());
        assert!(TransactionStatus::classify("PENDING ").is_err());
        assert!(TransactionStatus::classify("REJECTED\n").is_err());
    }

    #[test]
    fn test_predicates_are_exclusive() {
        for status in TransactionStatus::ALL {
            let flags = [status.is_accepted(), status.is_rejected(), status.is_pending()];
            assert_eq!(
                flags.iter().filter(|f| **f).count(),
                1,
                "{status:?} must be in exactly one class"
            );
        }
    }

    #[test]
    fn test_pending_states() {
        let pending: Vec<_> = TransactionStatus::ALL
            .into_iter()
            .filter(|s| !s.is_accepted() && !s.is_rejected())
            .collect();

        assert_eq!(
            pending,
            vec![
                TransactionStatus::NotReceived,
                TransactionStatus::Received,
                TransactionStatus::Pending,
            ]
        );
    }

    #[test]
    fn test_display_replaces_underscores() {
        for status in TransactionStatus::ALL {
            assert_eq!(status.to_string(), status.as_label().replace('_', " "));
        }
        assert_eq!(TransactionStatus::AcceptedOnL2.to_string(), "ACCEPTED ON L2");
    }

    #[test]
    fn test_display_classifies_back() {
        for status in TransactionStatus::ALL {
            assert_eq!(
                TransactionStatus::classify(&status.to_string()).unwrap(),
                status
            );
        }
    }

    #[test]
    fn test_progress_ordering() {
        assert!(TransactionStatus::Rejected < TransactionStatus::NotReceived);
        assert!(TransactionStatus::Pending < TransactionStatus::AcceptedOnL2);
        assert!(TransactionStatus::AcceptedOnL2 < TransactionStatus::AcceptedOnL1);
    }

    #[test]
    fn test_from_receipt() {
        let receipt = json!({ "tx_status": "PENDING", "block_hash": "0x1" });
        assert_eq!(
            TransactionStatus::from_receipt(&receipt).unwrap(),
            TransactionStatus::Pending
        );

        let missing = json!({ "block_hash": "0x1" });
        assert!(matches!(
            TransactionStatus::from_receipt(&missing),
            Err(ReceiptStatusError::Malformed(_))
        ));

        let unknown = json!({ "tx_status": "ABORTED" });
        assert!(matches!(
            TransactionStatus::from_receipt(&unknown),
            Err(ReceiptStatusError::Unknown(_))
        ));
    }

    #[test]
    fn test_serde_label() {
        let json = serde_json::to_string(&TransactionStatus::AcceptedOnL2).unwrap();
        assert_eq!(json, "\"ACCEPTED_ON_L2\"");
    }
}
