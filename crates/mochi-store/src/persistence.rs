//! Local persistence adapters
//!
//! Used in draft mode only: the whole state is written through after every
//! change as one versioned blob.

use crate::error::PersistError;
use mochi_model::Plan;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current draft file format
pub const FORMAT_VERSION: u32 = 1;

/// Everything the store holds, newest plan first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub plans: Vec<Plan>,
}

#[derive(Serialize)]
struct FileOut<'a> {
    version: u32,
    plans: &'a [Plan],
}

#[derive(Deserialize)]
struct FileIn {
    version: u32,
    #[serde(default)]
    plans: Vec<Plan>,
}

/// Whole-state load/save
pub trait LocalPersistence: Send + Sync {
    /// Load saved state; absent storage yields the empty state
    fn load_all(&self) -> Result<StoreState, PersistError>;

    /// Replace saved state
    fn save_all(&self, state: &StoreState) -> Result<(), PersistError>;
}

/// JSON draft file, written atomically
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalPersistence for JsonFilePersistence {
    fn load_all(&self) -> Result<StoreState, PersistError> {
        if !self.path.exists() {
            return Ok(StoreState::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        let file: FileIn = serde_json::from_str(&raw)?;
        if file.version != FORMAT_VERSION {
            return Err(PersistError::UnsupportedVersion(file.version));
        }
        Ok(StoreState { plans: file.plans })
    }

    fn save_all(&self, state: &StoreState) -> Result<(), PersistError> {
        let out = FileOut {
            version: FORMAT_VERSION,
            plans: &state.plans,
        };
        let json = serde_json::to_string_pretty(&out)?;
        atomic_write(&self.path, &json)
    }
}

/// Write via a sibling temp file and rename
fn atomic_write(path: &Path, content: &str) -> Result<(), PersistError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// In-process persistence for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    state: Mutex<StoreState>,
    saves: Mutex<usize>,
}

impl MemoryPersistence {
    #[must_use]
    pub fn new(state: StoreState) -> Self {
        Self {
            state: Mutex::new(state),
            saves: Mutex::new(0),
        }
    }

    /// Last saved state
    #[must_use]
    pub fn saved(&self) -> StoreState {
        self.state.lock().clone()
    }

    /// Number of `save_all` calls so far
    #[must_use]
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl LocalPersistence for MemoryPersistence {
    fn load_all(&self) -> Result<StoreState, PersistError> {
        Ok(self.state.lock().clone())
    }

    fn save_all(&self, state: &StoreState) -> Result<(), PersistError> {
        *self.state.lock() = state.clone();
        *self.saves.lock() += 1;
        Ok(())
    }
}
