use stark_declare_registry::StoreError;
use stark_declare_tracker::{CommandError, TrackerError};
use thiserror::Error;

/// Failure sending a declaration to the network
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("declare command failed: {0}")]
    CommandFailed(#[from] CommandError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse declare output ({reason}): {output}")]
    Parse { reason: String, output: String },
}

#[derive(Debug, Error)]
pub enum DeclareError {
    #[error("alias {alias} already exists on {network}")]
    AliasConflict { alias: String, network: String },

    #[error("orchestrator tracks {expected}, request targets {requested}")]
    NetworkMismatch { expected: String, requested: String },

    #[error("submission failed: {0}")]
    Submission(#[from] SubmissionError),

    #[error("alias registry error: {0}")]
    Registry(#[from] StoreError),

    #[error("tracking failed: {0}")]
    Tracking(#[from] TrackerError),
}

impl DeclareError {
    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            DeclareError::AliasConflict { .. } => "alias_conflict",
            DeclareError::NetworkMismatch { .. } => "network_mismatch",
            DeclareError::Submission(_) => "submission",
            DeclareError::Registry(_) => "registry",
            DeclareError::Tracking(_) => "tracking",
        }
    }
}

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("alias registry error: {0}")]
    Registry(#[from] StoreError),

    #[error("tracking failed: {0}")]
    Tracking(#[from] TrackerError),
}
