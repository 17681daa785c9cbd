use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use stark_declare_types::{AliasEntry, AliasState, ClassHash, TxHash};
use std::path::Path;

use crate::store::{AliasStore, StoreError};

// ═══════════════════════════════════════════════════════════════════════════
// SQLITE STORE IMPLEMENTATION
// ═══════════════════════════════════════════════════════════════════════════

/// Alias store on SQLite. The `(network, alias)` primary key makes
/// register-if-absent atomic across processes sharing the database.
pub struct SqliteAliasStore {
    pool: SqlitePool,
}

impl SqliteAliasStore {
    /// Open (or create) the database at `db_path`
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await.map_err(db_error)?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite database (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        // every pooled connection would otherwise get its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db_error)?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(include_str!("../migrations/001_create_aliases.sql"))
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(())
    }

    fn row_to_entry(row: &SqliteRow) -> Result<AliasEntry, StoreError> {
        let class_hash: String = row.get("class_hash");
        let class_hash = class_hash
            .parse::<ClassHash>()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let state: String = row.get("state");
        let tx_hash: Option<String> = row.get("tx_hash");
        let state = match (state.as_str(), tx_hash) {
            ("committed", _) => AliasState::Committed,
            ("provisional", Some(tx)) => AliasState::Provisional {
                tx_hash: tx
                    .parse::<TxHash>()
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            },
            (other, _) => {
                return Err(StoreError::Serialization(format!(
                    "unknown alias state: {other}"
                )))
            }
        };

        Ok(AliasEntry {
            alias: row.get("alias"),
            class_hash,
            network: row.get("network"),
            state,
            created_at: row.get::<i64, _>("created_at") as u64,
        })
    }
}

#[async_trait]
impl AliasStore for SqliteAliasStore {
    async fn get(&self, network: &str, alias: &str) -> Result<Option<AliasEntry>, StoreError> {
        let row = sqlx::query("SELECT * FROM aliases WHERE network = ? AND alias = ?")
            .bind(network)
            .bind(alias)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        match row {
            Some(row) => Ok(Some(Self::row_to_entry(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, entry: &AliasEntry) -> Result<(), StoreError> {
        let (state, tx_hash) = state_columns(&entry.state);

        let result = sqlx::query(
            r#"
            INSERT INTO aliases (network, alias, class_hash, tx_hash, state, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.network)
        .bind(&entry.alias)
        .bind(entry.class_hash.to_string())
        .bind(tx_hash)
        .bind(state)
        .bind(entry.created_at as i64)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                match self.get(&entry.network, &entry.alias).await? {
                    Some(existing) if existing.class_hash == entry.class_hash => Ok(()),
                    Some(existing) => Err(StoreError::DuplicateAlias {
                        alias: entry.alias.clone(),
                        network: entry.network.clone(),
                        existing: existing.class_hash,
                    }),
                    // removed between the failed insert and the read
                    None => self.insert(entry).await,
                }
            }
            Err(e) => Err(db_error(e)),
        }
    }

    async fn remove(
        &self,
        network: &str,
        alias: &str,
        class_hash: Option<ClassHash>,
    ) -> Result<bool, StoreError> {
        let result = match class_hash {
            Some(hash) => {
                sqlx::query("DELETE FROM aliases WHERE network = ? AND alias = ? AND class_hash = ?")
                    .bind(network)
                    .bind(alias)
                    .bind(hash.to_string())
                    .execute(&self.pool)
                    .await
            }
            None => {
                sqlx::query("DELETE FROM aliases WHERE network = ? AND alias = ?")
                    .bind(network)
                    .bind(alias)
                    .execute(&self.pool)
                    .await
            }
        }
        .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(&self, network: &str, alias: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE aliases
            SET state = 'committed', tx_hash = NULL
            WHERE network = ? AND alias = ?
            "#,
        )
        .bind(network)
        .bind(alias)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, network: &str) -> Result<Vec<AliasEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM aliases WHERE network = ? ORDER BY created_at ASC, alias ASC",
        )
        .bind(network)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(Self::row_to_entry).collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HELPER FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════

fn state_columns(state: &AliasState) -> (&'static str, Option<String>) {
    match state {
        AliasState::Committed => ("committed", None),
        AliasState::Provisional { tx_hash } => ("provisional", Some(tx_hash.to_string())),
    }
}

fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

// ═══════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn provisional(alias: &str, hash: u64, created_at: u64) -> AliasEntry {
        AliasEntry::provisional(
            alias,
            ClassHash::from(hash),
            "goerli",
            TxHash::from(0x99u64),
            created_at,
        )
    }

    #[tokio::test]
    async fn test_sqlite_insert_and_get() {
        let store = SqliteAliasStore::in_memory().await.unwrap();
        let entry = provisional("token", 1, 100);

        store.insert(&entry).await.unwrap();

        let retrieved = store.get("goerli", "token").await.unwrap();
        assert_eq!(retrieved, Some(entry));
    }

    #[tokio::test]
    async fn test_sqlite_duplicate_alias_error() {
        let store = SqliteAliasStore::in_memory().await.unwrap();
        store.insert(&provisional("token", 1, 100)).await.unwrap();

        store.insert(&provisional("token", 1, 200)).await.unwrap();
        let result = store.insert(&provisional("token", 2, 300)).await;

        assert!(matches!(result, Err(StoreError::DuplicateAlias { .. })));
    }

    #[tokio::test]
    async fn test_sqlite_commit_clears_tx_hash() {
        let store = SqliteAliasStore::in_memory().await.unwrap();
        store.insert(&provisional("token", 1, 100)).await.unwrap();

        assert!(store.commit("goerli", "token").await.unwrap());
        let entry = store.get("goerli", "token").await.unwrap().unwrap();
        assert_eq!(entry.state, AliasState::Committed);
        assert!(entry.pending_tx().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_remove_and_list() {
        let store = SqliteAliasStore::in_memory().await.unwrap();
        store.insert(&provisional("b", 2, 200)).await.unwrap();
        store.insert(&provisional("a", 1, 100)).await.unwrap();

        let aliases: Vec<_> = store
            .list("goerli")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.alias)
            .collect();
        assert_eq!(aliases, vec!["a", "b"]);

        assert!(!store
            .remove("goerli", "a", Some(ClassHash::from(2u64)))
            .await
            .unwrap());
        assert!(store.remove("goerli", "a", None).await.unwrap());
        assert_eq!(store.list("goerli").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.db");

        {
            let store = SqliteAliasStore::new(&path).await.unwrap();
            store.insert(&provisional("token", 1, 100)).await.unwrap();
        }

        let reopened = SqliteAliasStore::new(&path).await.unwrap();
        assert!(reopened.get("goerli", "token").await.unwrap().is_some());
    }
}
