//! Project persistence.
//!
//! The whole project is stored as one JSON record under a fixed key. There is
//! no schema versioning and no partial update: every save replaces the record.

use crate::error::StorageError;
use crate::models::TranslationProject;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Fixed key under which the active project is stored.
pub const STORAGE_KEY: &str = "uztrans_active_project";

/// Key-value backing for the single active project.
pub trait ProjectStore {
    /// Serialize and store the full project, replacing any previous record.
    fn save(&self, project: &TranslationProject) -> Result<(), StorageError>;

    /// Read the stored project, if one exists.
    fn load(&self) -> Result<Option<TranslationProject>, StorageError>;

    /// Remove the stored project.
    fn clear(&self) -> Result<(), StorageError>;
}

fn serialize(project: &TranslationProject, limit: Option<usize>) -> Result<String, StorageError> {
    let content = serde_json::to_string(project)?;
    if let Some(limit) = limit {
        if content.len() > limit {
            return Err(StorageError::QuotaExceeded {
                size: content.len(),
                limit,
            });
        }
    }
    Ok(content)
}

/// Stores the project as a JSON file in a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    filepath: PathBuf,
    max_bytes: Option<usize>,
}

impl FileStore {
    /// Create a store rooted at `data_dir`. The directory is created on first save.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            filepath: data_dir.join(format!("{}.json", STORAGE_KEY)),
            max_bytes: None,
        }
    }

    /// Reject records larger than `max_bytes`.
    pub fn with_quota(mut self, max_bytes: Option<usize>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Get the filepath for this store.
    pub fn filepath(&self) -> &Path {
        &self.filepath
    }
}

impl ProjectStore for FileStore {
    fn save(&self, project: &TranslationProject) -> Result<(), StorageError> {
        let content = serialize(project, self.max_bytes)?;

        if let Some(parent) = self.filepath.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write then rename so a failed write never clobbers the last good record.
        let tmp = self.filepath.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.filepath)?;

        tracing::debug!(path = %self.filepath.display(), "project saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<TranslationProject>, StorageError> {
        if !self.filepath.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.filepath)?;
        let project: TranslationProject = serde_json::from_str(&content)?;
        Ok(Some(project))
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.filepath) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store holding the serialized record, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<String>>,
    max_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject records larger than `max_bytes`.
    pub fn with_quota(max_bytes: usize) -> Self {
        Self {
            record: Mutex::new(None),
            max_bytes: Some(max_bytes),
        }
    }

    /// Put raw text under the key, bypassing serialization.
    pub fn put_raw(&self, raw: impl Into<String>) {
        *self.lock() = Some(raw.into());
    }

    /// The raw stored text, if any.
    pub fn raw(&self) -> Option<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A poisoned lock still holds a usable record.
        self.record.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ProjectStore for MemoryStore {
    fn save(&self, project: &TranslationProject) -> Result<(), StorageError> {
        let content = serialize(project, self.max_bytes)?;
        *self.lock() = Some(content);
        Ok(())
    }

    fn load(&self) -> Result<Option<TranslationProject>, StorageError> {
        match self.lock().as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.lock() = None;
        Ok(())
    }
}
