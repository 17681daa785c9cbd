//! Transaction status tracking
//!
//! [`StatusPoller`] queries a transaction's status through a
//! [`TxStatusQuery`], classifies each observation and keeps polling until a
//! terminal state is reached (or stops after one query in
//! [`PollMode::None`](stark_declare_types::PollMode)). Rejections carry the
//! network's failure message, optionally rewritten by a [`DebugDecoder`].

pub mod cli;
pub mod decoder;
pub mod error;
pub mod poller;
pub mod query;
pub mod timer;

pub use cli::*;
pub use decoder::*;
pub use error::*;
pub use poller::*;
pub use query::*;
pub use timer::*;
