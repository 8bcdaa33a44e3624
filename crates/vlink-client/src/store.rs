//! Guest access-token cache: remembers redeemed bearer grants per
//! capability token.
//!
//! Two backends are available:
//!   - **Memory**: a plain map, used by tests.
//!   - **JSON**: loads entirely into memory, every mutation flushed
//!     atomically via temp+rename so an abandoned operation never leaves
//!     a partially written entry.
//!
//! Entries hold the bearer string only, never passwords or file keys.

use anyhow::Context;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use vlink_core::{ShareError, ShareResult};

/// Cache key for the bearer redeemed from a capability token.
pub fn access_token_cache_key(capability_token: &str) -> String {
    format!("file_access_token_{capability_token}")
}

/// Injectable key-value store for redeemed bearer grants.
pub trait TokenStore: Send + Sync {
    /// Look up a cached value.
    fn get(&self, key: &str) -> Option<String>;
    /// Insert or replace a value, durably.
    fn set(&mut self, key: &str, value: &str) -> ShareResult<()>;
    /// Remove a value, durably. Removing a missing key is not an error.
    fn delete(&mut self, key: &str) -> ShareResult<()>;
}

/// In-memory store for tests and single-shot use.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: HashMap<String, String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> ShareResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> ShareResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON-file-backed store, persisted across sessions.
pub struct JsonTokenStore {
    db_path: PathBuf,
    entries: HashMap<String, String>,
}

impl JsonTokenStore {
    /// Load or create a store at the given path.
    /// If the file doesn't exist, starts empty.
    pub fn open(db_path: &Path) -> ShareResult<Self> {
        let entries = if db_path.exists() {
            let content = std::fs::read_to_string(db_path)
                .with_context(|| format!("reading token cache: {}", db_path.display()))?;
            serde_json::from_str(&content)
                .map_err(|e| ShareError::Cache(format!("parsing {}: {e}", db_path.display())))?
        } else {
            HashMap::new()
        };

        Ok(JsonTokenStore {
            db_path: db_path.to_path_buf(),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Atomic write: serialize to a temp file, then rename over the target.
    fn flush(&self) -> ShareResult<()> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating cache dir: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| ShareError::Cache(format!("serializing token cache: {e}")))?;

        let tmp_path = self.db_path.with_extension("tmp");
        std::fs::write(&tmp_path, &json)
            .with_context(|| format!("writing token cache temp: {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.db_path)
            .with_context(|| format!("renaming token cache: {}", self.db_path.display()))?;

        Ok(())
    }
}

impl TokenStore for JsonTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> ShareResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn delete(&mut self, key: &str) -> ShareResult<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
