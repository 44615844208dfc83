//! JSON snapshot - the whole entry list in one file, loaded into memory

use crate::engine::sqlite::root_display_name;
use crate::engine::MemoryCatalog;
use crate::entry::EntryRecord;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of a catalog for the in-memory backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub version: u32,
    pub root_path: String,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<EntryRecord>,
}

impl CatalogSnapshot {
    pub fn new(root_path: &Path, entries: Vec<EntryRecord>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            root_path: root_path.display().to_string(),
            generated_at: Utc::now(),
            entries,
        }
    }

    /// Write the snapshot atomically (temp file, then rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        let temp_file = path.with_extension("json.tmp");
        fs::write(&temp_file, json)?;
        fs::rename(&temp_file, path)?;
        tracing::info!(path = %path.display(), entries = self.entries.len(), "Snapshot saved");
        Ok(())
    }

    /// Read a snapshot. Every entry is validated while deserializing.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let snapshot: Self = serde_json::from_str(&data)?;
        if snapshot.version != SNAPSHOT_VERSION {
            tracing::warn!(
                found = snapshot.version,
                expected = SNAPSHOT_VERSION,
                "Snapshot version differs, loading anyway"
            );
        }
        tracing::info!(path = %path.display(), entries = snapshot.entries.len(), "Snapshot loaded");
        Ok(snapshot)
    }

    pub fn root_name(&self) -> String {
        root_display_name(&self.root_path)
    }

    pub fn into_catalog(self) -> MemoryCatalog {
        let root_name = self.root_name();
        MemoryCatalog::from_entries(&root_name, self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BrowseEngine;
    use crate::error::CatalogError;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("catalog.json");
        let entries = vec![
            EntryRecord::from_file_name("a.txt", 3, 1, 1, "docs").unwrap(),
            EntryRecord::from_file_name("b.png", 4, 2, 2, "").unwrap(),
        ];
        CatalogSnapshot::new(Path::new("/home/me/archive"), entries.clone())
            .save(&file)
            .unwrap();

        let loaded = CatalogSnapshot::load(&file).unwrap();
        assert_eq!(loaded.entries, entries);
        assert_eq!(loaded.root_name(), "archive");
        assert!(!temp_dir.path().join("catalog.json.tmp").exists());

        let catalog = loaded.into_catalog();
        let root = catalog.get_folder("").unwrap().unwrap();
        assert_eq!(root.name, "archive");
        assert_eq!(root.total_size_bytes, 7);
    }

    #[test]
    fn test_load_rejects_invalid_entry() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("bad.json");
        fs::write(
            &file,
            r#"{"version":1,"root_path":"/x","generated_at":"2024-01-01T00:00:00Z",
               "entries":[{"name":"a","extension":"","size_bytes":1,"modified":0,"created":0,"parent_path":"../up"}]}"#,
        )
        .unwrap();
        let err = CatalogSnapshot::load(&file).unwrap_err();
        assert!(matches!(err, CatalogError::Serialization(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = CatalogSnapshot::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
