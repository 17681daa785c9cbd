pub mod error;
pub mod orchestrator;
pub mod recovery;
pub mod submit;


// Re-export main types
pub use error::{DeclareError, RecoveryError, SubmissionError};
pub use orchestrator::{declaration_result, DeclareOrchestrator, DeclareOutcome};
pub use recovery::{
    AliasRecovery, RecoveryAction, RecoveryReport, RecoveryResult, DEFAULT_CONCURRENCY,
};
pub use submit::{parse_submission_output, CliDeclareSubmitter, DeclareSubmitter, SubmitArgs};
