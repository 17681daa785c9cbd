use async_trait::async_trait;
use stark_declare_types::{AliasEntry, ClassHash};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

// ═══════════════════════════════════════════════════════════════════════════
// ERROR TYPES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("alias {alias} already bound to {existing} on {network}")]
    DuplicateAlias {
        alias: String,
        network: String,
        existing: ClassHash,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

// ═══════════════════════════════════════════════════════════════════════════
// STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════

/// Alias storage, keyed by `(network, alias)`
#[async_trait]
pub trait AliasStore: Send + Sync {
    async fn get(&self, network: &str, alias: &str) -> Result<Option<AliasEntry>, StoreError>;

    /// Insert if absent.
    ///
    /// Succeeds without change when the alias already points at the same
    /// class hash; fails with [`StoreError::DuplicateAlias`] otherwise.
    async fn insert(&self, entry: &AliasEntry) -> Result<(), StoreError>;

    /// Remove an entry, optionally only when it points at `class_hash`.
    /// Returns whether anything was removed.
    async fn remove(
        &self,
        network: &str,
        alias: &str,
        class_hash: Option<ClassHash>,
    ) -> Result<bool, StoreError>;

    /// Mark an entry committed. Returns whether the entry exists.
    async fn commit(&self, network: &str, alias: &str) -> Result<bool, StoreError>;

    /// All entries on a network, oldest first
    async fn list(&self, network: &str) -> Result<Vec<AliasEntry>, StoreError>;
}

#[async_trait]
impl<S: AliasStore + ?Sized> AliasStore for std::sync::Arc<S> {
    async fn get(&self, network: &str, alias: &str) -> Result<Option<AliasEntry>, StoreError> {
        (**self).get(network, alias).await
    }

    async fn insert(&self, entry: &AliasEntry) -> Result<(), StoreError> {
        (**self).insert(entry).await
    }

    async fn remove(
        &self,
        network: &str,
        alias: &str,
        class_hash: Option<ClassHash>,
    ) -> Result<bool, StoreError> {
        (**self).remove(network, alias, class_hash).await
    }

    async fn commit(&self, network: &str, alias: &str) -> Result<bool, StoreError> {
        (**self).commit(network, alias).await
    }

    async fn list(&self, network: &str) -> Result<Vec<AliasEntry>, StoreError> {
        (**self).list(network).await
    }
}

/// Shared insert-if-absent decision for backends that read before writing
pub(crate) fn check_insert(
    existing: Option<&AliasEntry>,
    entry: &AliasEntry,
) -> Result<bool, StoreError> {
    match existing {
        None => Ok(true),
        Some(current) if current.class_hash == entry.class_hash => Ok(false),
        Some(current) => Err(StoreError::DuplicateAlias {
            alias: entry.alias.clone(),
            network: entry.network.clone(),
            existing: current.class_hash,
        }),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE (for testing)
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct InMemoryAliasStore {
    entries: RwLock<HashMap<(String, String), AliasEntry>>,
}

impl InMemoryAliasStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries across all networks
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn key(network: &str, alias: &str) -> (String, String) {
    (network.to_string(), alias.to_string())
}

#[async_trait]
impl AliasStore for InMemoryAliasStore {
    async fn get(&self, network: &str, alias: &str) -> Result<Option<AliasEntry>, StoreError> {
        Ok(self.entries.read().await.get(&key(network, alias)).cloned())
    }

    async fn insert(&self, entry: &AliasEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let k = key(&entry.network, &entry.alias);
        if check_insert(entries.get(&k), entry)? {
            entries.insert(k, entry.clone());
        }
        Ok(())
    }

    async fn remove(
        &self,
        network: &str,
        alias: &str,
        class_hash: Option<ClassHash>,
    ) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        let k = key(network, alias);
        let matches = entries
            .get(&k)
            .is_some_and(|e| class_hash.map_or(true, |hash| e.class_hash == hash));
        if matches {
            entries.remove(&k);
        }
        Ok(matches)
    }

    async fn commit(&self, network: &str, alias: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&key(network, alias)) {
            Some(entry) => {
                entry.commit();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self, network: &str) -> Result<Vec<AliasEntry>, StoreError> {
        let entries = self.entries.read().await;
        let mut results: Vec<_> = entries
            .values()
            .filter(|e| e.network == network)
            .cloned()
            .collect();

        results.sort_by(|a, b| (a.created_at, &a.alias).cmp(&(b.created_at, &b.alias)));
        Ok(results)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use stark_declare_types::TxHash;

    fn entry(alias: &str, hash: u64) -> AliasEntry {
        AliasEntry::provisional(alias, ClassHash::from(hash), "goerli", TxHash::from(7u64), 100)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryAliasStore::new();
        store.insert(&entry("token", 1)).await.unwrap();

        let found = store.get("goerli", "token").await.unwrap().unwrap();
        assert_eq!(found.class_hash, ClassHash::from(1u64));
        assert!(store.get("mainnet", "token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_same_hash_is_idempotent() {
        let store = InMemoryAliasStore::new();
        store.insert(&entry("token", 1)).await.unwrap();
        store.insert(&entry("token", 1)).await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_different_hash_conflicts() {
        let store = InMemoryAliasStore::new();
        store.insert(&entry("token", 1)).await.unwrap();

        let err = store.insert(&entry("token", 2)).await.unwrap_err();
        match err {
            StoreError::DuplicateAlias { existing, .. } => {
                assert_eq!(existing, ClassHash::from(1u64))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_remove_checks_class_hash() {
        let store = InMemoryAliasStore::new();
        store.insert(&entry("token", 1)).await.unwrap();

        assert!(!store
            .remove("goerli", "token", Some(ClassHash::from(2u64)))
            .await
            .unwrap());
        assert!(store.remove("goerli", "token", None).await.unwrap());
        assert!(store.is_empty().await);
        assert!(!store.remove("goerli", "token", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_commit() {
        let store = InMemoryAliasStore::new();
        store.insert(&entry("token", 1)).await.unwrap();

        assert!(store.commit("goerli", "token").await.unwrap());
        let found = store.get("goerli", "token").await.unwrap().unwrap();
        assert!(!found.is_provisional());
        assert!(!store.commit("goerli", "missing").await.unwrap());
    }
}
