//! SQLite store builder - writes the flat catalog consumed by the relational backend

use crate::entry::EntryRecord;
use crate::stats::extension_stats;
use anyhow::{Context, Result};
use chrono::Local;
use indicatif::ProgressBar;
use rusqlite::{params, Connection};
use std::path::Path;

const SCHEMA_VERSION: i32 = 1;
const DEFAULT_BATCH_SIZE: usize = 5000;

/// Store construction options.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Rows per insert batch.
    pub batch_size: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Create a fresh store at `db_path` holding `entries`.
///
/// An existing file at that path is replaced. Returns the size of the
/// database file in bytes.
pub fn build_store(
    db_path: &Path,
    root_path: &Path,
    entries: &[EntryRecord],
    options: &StoreOptions,
    progress: Option<&ProgressBar>,
) -> Result<u64> {
    tracing::info!(path = %db_path.display(), entries = entries.len(), "Creating catalog store");

    if db_path.exists() {
        std::fs::remove_file(db_path)
            .with_context(|| format!("Failed to remove existing store: {}", db_path.display()))?;
    }

    let mut db = Connection::open(db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

    // One-shot bulk load into a file nobody else reads yet
    db.pragma_update(None, "synchronous", "OFF")
        .with_context(|| "Failed to set synchronous mode")?;
    db.pragma_update(None, "temp_store", "MEMORY")
        .with_context(|| "Failed to set temp_store")?;
    db.pragma_update(None, "cache_size", "-16384")
        .with_context(|| "Failed to set cache_size")?;

    create_schema(&mut db)?;
    insert_entries(&mut db, entries, options.batch_size.max(1), progress)?;
    insert_metadata(&mut db, entries, root_path)?;
    create_indexes(&mut db)?;

    drop(db);

    let size = std::fs::metadata(db_path)
        .with_context(|| format!("Failed to stat store: {}", db_path.display()))?
        .len();
    tracing::info!(path = %db_path.display(), bytes = size, "Catalog store created");
    Ok(size)
}

fn create_schema(db: &mut Connection) -> Result<()> {
    let tx = db
        .transaction()
        .with_context(|| "Failed to start schema transaction")?;

    tx.execute(
        "CREATE TABLE schema_version (version INTEGER NOT NULL)",
        [],
    )
    .with_context(|| "Failed to create schema_version table")?;
    tx.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )
    .with_context(|| "Failed to record schema version")?;

    tx.execute(
        "CREATE TABLE entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            extension TEXT NOT NULL,
            size_bytes INTEGER NOT NULL,
            modified INTEGER NOT NULL,
            created INTEGER NOT NULL,
            directory TEXT NOT NULL,
            icon TEXT NOT NULL
        )",
        [],
    )
    .with_context(|| "Failed to create entries table")?;

    tx.execute(
        "CREATE TABLE metadata (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )
    .with_context(|| "Failed to create metadata table")?;

    tx.execute(
        "CREATE TABLE extension_stats (
            extension TEXT PRIMARY KEY,
            count INTEGER NOT NULL,
            total_size INTEGER NOT NULL
        )",
        [],
    )
    .with_context(|| "Failed to create extension_stats table")?;

    tx.commit()
        .with_context(|| "Failed to commit schema transaction")?;
    Ok(())
}

fn insert_entries(
    db: &mut Connection,
    entries: &[EntryRecord],
    batch_size: usize,
    progress: Option<&ProgressBar>,
) -> Result<()> {
    let tx = db
        .transaction()
        .with_context(|| "Failed to start insert transaction")?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO entries (name, extension, size_bytes, modified, created, directory, icon)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;

        let mut inserted = 0usize;
        for batch in entries.chunks(batch_size) {
            for entry in batch {
                stmt.execute(params![
                    entry.name(),
                    entry.extension(),
                    clamp_size_to_i64(entry.size_bytes()),
                    entry.modified(),
                    entry.created(),
                    entry.parent_path(),
                    entry.icon(),
                ])
                .with_context(|| format!("Failed to insert entry: {}", entry.relative_path()))?;
            }
            inserted += batch.len();
            if let Some(pb) = progress {
                pb.set_position(inserted as u64);
            }
            tracing::debug!(inserted, total = entries.len(), "Inserted entry batch");
        }
    }
    tx.commit()
        .with_context(|| "Failed to commit insert transaction")?;
    Ok(())
}

fn insert_metadata(db: &mut Connection, entries: &[EntryRecord], root_path: &Path) -> Result<()> {
    let total_size: u64 = entries.iter().map(|e| e.size_bytes()).sum();
    let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let tx = db
        .transaction()
        .with_context(|| "Failed to start metadata transaction")?;
    {
        let mut meta = tx.prepare_cached("INSERT INTO metadata (key, value) VALUES (?1, ?2)")?;
        meta.execute(params!["total_files", entries.len().to_string()])?;
        meta.execute(params!["total_size", total_size.to_string()])?;
        meta.execute(params!["root_path", root_path.display().to_string()])?;
        meta.execute(params!["generated_date", generated])?;

        let mut ext = tx.prepare_cached(
            "INSERT INTO extension_stats (extension, count, total_size) VALUES (?1, ?2, ?3)",
        )?;
        for stat in extension_stats(entries) {
            ext.execute(params![
                stat.extension,
                clamp_size_to_i64(stat.count),
                clamp_size_to_i64(stat.total_size)
            ])?;
        }
    }
    tx.commit()
        .with_context(|| "Failed to commit metadata transaction")?;
    Ok(())
}

/// Indexes are created after the bulk insert so the load does not pay for them.
fn create_indexes(db: &mut Connection) -> Result<()> {
    const INDEXES: &[(&str, &str)] = &[
        ("idx_directory", "entries(directory)"),
        ("idx_directory_name", "entries(directory, name)"),
        ("idx_name", "entries(name)"),
        ("idx_extension", "entries(extension)"),
        ("idx_size", "entries(size_bytes)"),
        ("idx_modified", "entries(modified)"),
        ("idx_created", "entries(created)"),
    ];

    let tx = db
        .transaction()
        .with_context(|| "Failed to start index transaction")?;
    for (name, target) in INDEXES {
        tx.execute(&format!("CREATE INDEX {} ON {}", name, target), [])
            .with_context(|| format!("Failed to create index {}", name))?;
    }
    tx.commit()
        .with_context(|| "Failed to commit index transaction")?;
    Ok(())
}

fn clamp_size_to_i64(size: u64) -> i64 {
    if size > i64::MAX as u64 {
        i64::MAX
    } else {
        size as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries() -> Vec<EntryRecord> {
        vec![
            EntryRecord::from_file_name("a.txt", 10, 1, 1, "").unwrap(),
            EntryRecord::from_file_name("b.txt", 20, 2, 2, "x").unwrap(),
            EntryRecord::from_file_name("c.jpg", 30, 3, 3, "x/y").unwrap(),
        ]
    }

    #[test]
    fn test_build_store_writes_rows() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("c.db");
        let opts = StoreOptions { batch_size: 2 };
        let size = build_store(&db_path, Path::new("/data"), &entries(), &opts, None).unwrap();
        assert!(size > 0);

        let db = Connection::open(&db_path).unwrap();
        let count: i64 = db
            .query_row("SELECT COUNT(*) FROM entries", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 3);

        let ext_count: i64 = db
            .query_row(
                "SELECT count FROM extension_stats WHERE extension = '.txt'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(ext_count, 2);

        let total: String = db
            .query_row("SELECT value FROM metadata WHERE key = 'total_size'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(total, "60");
    }

    #[test]
    fn test_build_store_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("c.db");
        build_store(&db_path, Path::new("/data"), &entries(), &StoreOptions::default(), None).unwrap();
        build_store(&db_path, Path::new("/data"), &entries()[..1], &StoreOptions::default(), None)
            .unwrap();

        let db = Connection::open(&db_path).unwrap();
        let count: i64 = db
            .query_row("SELECT COUNT(*) FROM entries", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_clamp_size() {
        assert_eq!(clamp_size_to_i64(5), 5);
        assert_eq!(clamp_size_to_i64(u64::MAX), i64::MAX);
    }
}
