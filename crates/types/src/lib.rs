//! Core types for transaction lifecycle tracking and class declaration
//!
//! - [`TransactionStatus`]: closed lifecycle enumeration and its classifier
//! - [`TransactionReceipt`] / [`TransactionOutcome`]: per-query observations
//!   and the final tracking report
//! - [`Felt`], [`ClassHash`], [`TxHash`], [`Address`]: 256-bit identifiers
//! - [`DeclareRequest`], [`AliasEntry`], [`PollMode`]

pub mod declare;
pub mod felt;
pub mod receipt;
pub mod status;

pub use declare::*;
pub use felt::*;
pub use receipt::*;
pub use status::*;
