use async_trait::async_trait;
use stark_declare_types::{AliasEntry, AliasState, ClassHash, TxHash};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::store::{check_insert, AliasStore, StoreError};

/// Suffix of the per-network declarations file
pub const DECLARATIONS_FILENAME: &str = "declarations.txt";

// ═══════════════════════════════════════════════════════════════════════════
// LINE FORMAT
// ═══════════════════════════════════════════════════════════════════════════

/// One line of a declarations file.
///
/// `<class hash>:<alias>` is committed, `<class hash>:<alias>:<tx hash>` is
/// provisional. Anything else (alias-less legacy lines included) is kept
/// verbatim so rewrites never lose data.
#[derive(Debug, Clone, PartialEq)]
enum Line {
    Entry(AliasEntry),
    Opaque(String),
}

impl Line {
    fn parse(raw: &str, network: &str) -> Self {
        let parts: Vec<&str> = raw.trim().split(':').collect();
        let parsed = match parts.as_slice() {
            [hash, alias] if !alias.is_empty() => hash
                .parse::<ClassHash>()
                .ok()
                .map(|class_hash| AliasEntry::committed(*alias, class_hash, network, 0)),
            [hash, alias, tx] if !alias.is_empty() => {
                match (hash.parse::<ClassHash>(), tx.parse::<TxHash>()) {
                    (Ok(class_hash), Ok(tx_hash)) => Some(AliasEntry::provisional(
                        *alias, class_hash, network, tx_hash, 0,
                    )),
                    _ => None,
                }
            }
            _ => None,
        };

        match parsed {
            Some(entry) => Line::Entry(entry),
            None => {
                if parts.len() > 1 {
                    warn!(network = %network, line = %raw, "unrecognized declarations line, keeping as is");
                }
                Line::Opaque(raw.to_string())
            }
        }
    }

    fn render(&self) -> String {
        match self {
            Line::Entry(entry) => render_entry(entry),
            Line::Opaque(raw) => raw.clone(),
        }
    }

    fn entry(&self) -> Option<&AliasEntry> {
        match self {
            Line::Entry(entry) => Some(entry),
            Line::Opaque(_) => None,
        }
    }
}

fn render_entry(entry: &AliasEntry) -> String {
    match entry.state {
        AliasState::Committed => format!("{}:{}", entry.class_hash, entry.alias),
        AliasState::Provisional { tx_hash } => {
            format!("{}:{}:{}", entry.class_hash, entry.alias, tx_hash)
        }
    }
}

fn validate_alias(alias: &str) -> Result<(), StoreError> {
    if alias.is_empty() || alias.contains([':', '\n', '\r']) {
        return Err(StoreError::Serialization(format!(
            "alias {alias:?} cannot be stored in a declarations file"
        )));
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// FILE STORE IMPLEMENTATION
// ═══════════════════════════════════════════════════════════════════════════

/// Keeps aliases in `<network>.declarations.txt` files under one directory.
///
/// Check-and-write is serialized inside this process only; two processes
/// sharing the directory can still race between the check and the append.
/// Timestamps are not persisted, entries read back with `created_at == 0`.
#[derive(Debug)]
pub struct FileAliasStore {
    directory: PathBuf,
    lock: Mutex<()>,
}

impl FileAliasStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the declarations file for `network`
    pub fn path_for(&self, network: &str) -> PathBuf {
        self.directory
            .join(format!("{network}.{DECLARATIONS_FILENAME}"))
    }

    async fn read_lines(&self, network: &str) -> Result<Vec<Line>, StoreError> {
        let contents = match fs::read_to_string(self.path_for(network)).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Line::parse(line, network))
            .collect())
    }

    fn find<'a>(lines: &'a [Line], alias: &str) -> Option<&'a AliasEntry> {
        lines
            .iter()
            .filter_map(Line::entry)
            .find(|entry| entry.alias == alias)
    }

    async fn append(&self, network: &str, entry: &AliasEntry) -> Result<(), StoreError> {
        fs::create_dir_all(&self.directory).await?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(network))
            .await?;
        file.write_all(format!("{}\n", render_entry(entry)).as_bytes())
            .await?;
        file.flush().await?;
        Ok(())
    }

    /// Replace the whole file through a temp file + rename
    async fn rewrite(&self, network: &str, lines: &[Line]) -> Result<(), StoreError> {
        let path = self.path_for(network);
        let tmp = path.with_extension("txt.tmp");

        let mut contents = String::new();
        for line in lines {
            contents.push_str(&line.render());
            contents.push('\n');
        }

        fs::write(&tmp, contents).await?;
        fs::rename(&tmp, &path).await?;
        debug!(network = %network, path = %path.display(), "rewrote declarations file");
        Ok(())
    }
}

#[async_trait]
impl AliasStore for FileAliasStore {
    async fn get(&self, network: &str, alias: &str) -> Result<Option<AliasEntry>, StoreError> {
        let lines = self.read_lines(network).await?;
        Ok(Self::find(&lines, alias).cloned())
    }

    async fn insert(&self, entry: &AliasEntry) -> Result<(), StoreError> {
        validate_alias(&entry.alias)?;

        let _guard = self.lock.lock().await;
        let lines = self.read_lines(&entry.network).await?;
        if check_insert(Self::find(&lines, &entry.alias), entry)? {
            self.append(&entry.network, entry).await?;
        }
        Ok(())
    }

    async fn remove(
        &self,
        network: &str,
        alias: &str,
        class_hash: Option<ClassHash>,
    ) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut lines = self.read_lines(network).await?;
        let before = lines.len();

        lines.retain(|line| match line.entry() {
            Some(entry) => {
                entry.alias != alias || class_hash.is_some_and(|hash| entry.class_hash != hash)
            }
            None => true,
        });

        if lines.len() == before {
            return Ok(false);
        }
        self.rewrite(network, &lines).await?;
        Ok(true)
    }

    async fn commit(&self, network: &str, alias: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut lines = self.read_lines(network).await?;

        let mut found = false;
        let mut changed = false;
        for line in lines.iter_mut() {
            if let Line::Entry(entry) = line {
                if entry.alias == alias {
                    found = true;
                    changed |= entry.is_provisional();
                    entry.commit();
                }
            }
        }

        if changed {
            self.rewrite(network, &lines).await?;
        }
        Ok(found)
    }

    async fn list(&self, network: &str) -> Result<Vec<AliasEntry>, StoreError> {
        let lines = self.read_lines(network).await?;
        Ok(lines.iter().filter_map(Line::entry).cloned().collect())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════
