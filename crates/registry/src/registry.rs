use stark_declare_types::{AliasEntry, ClassHash, TxHash};
use tracing::{debug, info};

use crate::store::{AliasStore, StoreError};

/// Alias → class hash bindings for every network, over one store.
///
/// Constructed explicitly and handed to whoever needs it. `exists` followed
/// by `register` is not atomic; `register` itself never overwrites a
/// different binding.
#[derive(Debug)]
pub struct AliasRegistry<S> {
    store: S,
}

impl<S: AliasStore> AliasRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn exists(&self, alias: &str, network: &str) -> Result<bool, StoreError> {
        Ok(self.store.get(network, alias).await?.is_some())
    }

    /// Bind `alias` to `class_hash` on `network`.
    ///
    /// No-op without an alias. With a transaction hash the entry starts
    /// provisional until [`finalize`](Self::finalize) or
    /// [`unregister`](Self::unregister).
    pub async fn register(
        &self,
        class_hash: ClassHash,
        network: &str,
        alias: Option<&str>,
        tx_hash: Option<TxHash>,
    ) -> Result<(), StoreError> {
        let Some(alias) = alias.filter(|a| !a.is_empty()) else {
            return Ok(());
        };

        let created_at = chrono::Utc::now().timestamp().max(0) as u64;
        let entry = match tx_hash {
            Some(tx_hash) => AliasEntry::provisional(alias, class_hash, network, tx_hash, created_at),
            None => AliasEntry::committed(alias, class_hash, network, created_at),
        };

        self.store.insert(&entry).await?;
        info!(
            alias = %alias,
            network = %network,
            class_hash = %class_hash,
            provisional = entry.is_provisional(),
            "registered alias"
        );
        Ok(())
    }

    /// Drop the binding for `alias` on `network`.
    ///
    /// Rolling back a declaration removes the alias whatever it points at;
    /// otherwise the class hash must match. No-op when absent.
    pub async fn unregister(
        &self,
        class_hash: ClassHash,
        network: &str,
        alias: Option<&str>,
        is_declaration: bool,
    ) -> Result<(), StoreError> {
        let Some(alias) = alias.filter(|a| !a.is_empty()) else {
            return Ok(());
        };

        let required = (!is_declaration).then_some(class_hash);
        let removed = self.store.remove(network, alias, required).await?;
        if removed {
            info!(alias = %alias, network = %network, class_hash = %class_hash, "unregistered alias");
        } else {
            debug!(alias = %alias, network = %network, "nothing to unregister");
        }
        Ok(())
    }

    /// Promote a provisional entry to committed. No-op when absent.
    pub async fn finalize(&self, alias: &str, network: &str) -> Result<(), StoreError> {
        if self.store.commit(network, alias).await? {
            debug!(alias = %alias, network = %network, "alias committed");
        }
        Ok(())
    }

    pub async fn lookup(&self, alias: &str, network: &str) -> Result<Option<AliasEntry>, StoreError> {
        self.store.get(network, alias).await
    }

    pub async fn list(&self, network: &str) -> Result<Vec<AliasEntry>, StoreError> {
        self.store.list(network).await
    }

    /// Entries still waiting on their declaration's outcome
    pub async fn provisional(&self, network: &str) -> Result<Vec<AliasEntry>, StoreError> {
        Ok(self
            .store
            .list(network)
            .await?
            .into_iter()
            .filter(AliasEntry::is_provisional)
            .collect())
    }
}
