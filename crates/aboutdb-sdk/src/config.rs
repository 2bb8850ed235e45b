use std::path::{Path, PathBuf};

use aboutdb_store::DEFAULT_CHUNK_CAPACITY;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Where index tables live.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendKind {
    /// `Vec`-backed tables owned by the process.
    #[default]
    Memory,
    /// SQLite tables; `path = None` keeps the database in memory.
    Sqlite { path: Option<PathBuf> },
}

/// Configuration for an [`AboutDb`](crate::AboutDb) instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Capacity of every chunk in bytes. Also the largest storable value.
    pub chunk_capacity: usize,
    /// Deepest chain of links a read will follow.
    pub max_link_depth: usize,
    /// Index existing objects when a definition is added after data.
    pub backfill_on_define: bool,
    /// Backing store for index tables.
    pub index_backend: BackendKind,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
            max_link_depth: 64,
            backfill_on_define: true,
            index_backend: BackendKind::Memory,
        }
    }
}

impl StoreConfig {
    /// Parse a TOML document. Missing keys take their default values.
    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> SdkResult<()> {
        if self.chunk_capacity == 0 {
            return Err(SdkError::Config("chunk_capacity must be positive".into()));
        }
        if self.max_link_depth == 0 {
            return Err(SdkError::Config("max_link_depth must be positive".into()));
        }
        Ok(())
    }
}
