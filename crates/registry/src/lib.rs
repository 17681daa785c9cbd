//! Persisted alias registry
//!
//! Maps human-readable aliases to declared class hashes, per network.
//! [`AliasRegistry`] works over any [`AliasStore`]:
//!
//! - [`InMemoryAliasStore`] for tests
//! - [`FileAliasStore`]: `<network>.declarations.txt` files
//! - [`SqliteAliasStore`]: one `aliases` table, atomic across processes

pub mod file_store;
pub mod registry;
pub mod sqlite_store;
pub mod store;

pub use file_store::{FileAliasStore, DECLARATIONS_FILENAME};
pub use registry::AliasRegistry;
pub use sqlite_store::SqliteAliasStore;
pub use store::{AliasStore, InMemoryAliasStore, StoreError};
