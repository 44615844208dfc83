//! Relational backend - answers queries from a flat SQLite `entries` table
//!
//! No tree is kept. Folder totals come from range queries over `directory`
//! and child folders are derived from distinct directory prefixes, per call.

use super::{BrowseEngine, FolderView};
use crate::entry::EntryRecord;
use crate::error::{CatalogError, Result};
use crate::path::CatalogPath;
use crate::sort::{FolderSummary, ResultItem, TextQuery};
use crate::stats::ExtensionStat;
use crate::tree::FolderAggregate;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OpenFlags, Row};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

const DB_BUSY_TIMEOUT_SECS: u64 = 5;

/// SQL function sharing the engine's case-insensitive substring test.
const MATCH_FN: &str = "catalog_match";

const ENTRY_COLUMNS: &str = "name, extension, size_bytes, modified, created, directory";

/// Metadata recorded by the store builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreMetadata {
    pub total_files: u64,
    pub total_size: u64,
    pub root_path: String,
    pub generated_date: String,
}

/// Read-only catalog over a SQLite store.
///
/// Each call issues its own statements; no cursor survives between calls.
#[derive(Debug)]
pub struct SqliteCatalog {
    db: Connection,
    root_name: String,
}

impl SqliteCatalog {
    /// Open an existing store read-only.
    pub fn open(db_path: &Path) -> Result<Self> {
        let db = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let catalog = Self::from_connection(db)?;
        tracing::info!(
            path = %db_path.display(),
            root = %catalog.root_name,
            "Opened relational catalog"
        );
        Ok(catalog)
    }

    /// Wrap an already-open connection to a built store.
    pub fn from_connection(db: Connection) -> Result<Self> {
        db.busy_timeout(Duration::from_secs(DB_BUSY_TIMEOUT_SECS))?;

        // Prefix matches on `directory` must not fold ASCII case
        db.pragma_update(None, "case_sensitive_like", true)?;

        db.create_scalar_function(
            MATCH_FN,
            2,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let haystack: String = ctx.get(0)?;
                let needle: String = ctx.get(1)?;
                Ok(haystack.to_lowercase().contains(&needle))
            },
        )?;

        // Fails with the store's own error if this is not a catalog
        db.prepare("SELECT 1 FROM entries LIMIT 1")?;

        let root_path: Option<String> = match db.query_row(
            "SELECT value FROM metadata WHERE key = 'root_path'",
            [],
            |row| row.get(0),
        ) {
            Ok(value) => Some(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };
        let root_name = root_path
            .as_deref()
            .map(root_display_name)
            .unwrap_or_default();

        Ok(Self { db, root_name })
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// Metadata written when the store was built.
    pub fn metadata(&self) -> Result<StoreMetadata> {
        let mut stmt = self.db.prepare("SELECT key, value FROM metadata")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut meta = StoreMetadata::default();
        for row in rows {
            let (key, value) = row?;
            match key.as_str() {
                "total_files" => meta.total_files = parse_total(&key, &value),
                "total_size" => meta.total_size = parse_total(&key, &value),
                "root_path" => meta.root_path = value,
                "generated_date" => meta.generated_date = value,
                _ => {}
            }
        }
        Ok(meta)
    }

    /// Per-extension counts precomputed by the store builder.
    pub fn extension_stats(&self) -> Result<Vec<ExtensionStat>> {
        let mut stmt = self.db.prepare(
            "SELECT extension, count, total_size FROM extension_stats
             ORDER BY count DESC, extension ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ExtensionStat {
                extension: row.get(0)?,
                count: to_u64(row.get(1)?),
                total_size: to_u64(row.get(2)?),
            })
        })?;

        let mut stats = Vec::new();
        for row in rows {
            stats.push(row?);
        }
        Ok(stats)
    }

    /// Build a folder aggregate tree from the flat table. Nothing is cached:
    /// every call reads the table again.
    pub fn project_tree(&self) -> Result<FolderAggregate> {
        let entries = self.query_entries(
            &format!("SELECT {} FROM entries ORDER BY id", ENTRY_COLUMNS),
            [],
        )?;
        Ok(FolderAggregate::build(&self.root_name, entries))
    }

    fn query_entries<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<EntryRecord>> {
        let mut stmt = self.db.prepare(sql)?;
        let rows = stmt.query_map(params, read_entry_row)?;

        let mut entries = Vec::new();
        for row in rows {
            let raw = row?;
            entries.push(raw.into_record()?);
        }
        Ok(entries)
    }

    fn direct_entries(&self, path: &CatalogPath) -> Result<Vec<EntryRecord>> {
        self.query_entries(
            &format!(
                "SELECT {} FROM entries WHERE directory = ?1 ORDER BY id",
                ENTRY_COLUMNS
            ),
            [path.as_str()],
        )
    }

    /// Names of immediate child folders, in first-seen order.
    fn child_folder_names(&self, path: &CatalogPath) -> Result<Vec<String>> {
        let prefix = path.descendant_prefix();
        let directories: Vec<String> = if path.is_root() {
            let mut stmt = self
                .db
                .prepare("SELECT DISTINCT directory FROM entries WHERE directory != ''")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            let directories = rows.collect::<rusqlite::Result<Vec<String>>>()?;
            directories
        } else {
            let mut stmt = self.db.prepare(
                "SELECT DISTINCT directory FROM entries WHERE directory LIKE ?1 ESCAPE '\\'",
            )?;
            let pattern = format!("{}%", escape_like(&prefix));
            let rows = stmt.query_map([pattern], |row| row.get::<_, String>(0))?;
            let directories = rows.collect::<rusqlite::Result<Vec<String>>>()?;
            directories
        };

        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for directory in directories {
            let Some(rest) = directory.strip_prefix(&prefix) else {
                continue;
            };
            let segment = rest.split('/').next().unwrap_or_default();
            if !segment.is_empty() && seen.insert(segment.to_string()) {
                names.push(segment.to_string());
            }
        }
        Ok(names)
    }

    /// Subtree entry count and byte total for one folder.
    fn folder_totals(&self, path: &CatalogPath) -> Result<(u64, u64)> {
        let (count, size): (i64, i64) = if path.is_root() {
            self.db.query_row(
                "SELECT COUNT(*), COALESCE(SUM(size_bytes), 0) FROM entries",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?
        } else {
            let pattern = format!("{}%", escape_like(&path.descendant_prefix()));
            self.db.query_row(
                "SELECT COUNT(*), COALESCE(SUM(size_bytes), 0) FROM entries
                 WHERE directory = ?1 OR directory LIKE ?2 ESCAPE '\\'",
                params![path.as_str(), pattern],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?
        };
        Ok((to_u64(count), to_u64(size)))
    }

    /// Direct entry count and size per directory, rolled up into every
    /// ancestor folder (root excluded).
    fn rolled_up_directories(&self) -> Result<HashMap<String, (u64, u64)>> {
        let mut stmt = self.db.prepare(
            "SELECT directory, COUNT(*), COALESCE(SUM(size_bytes), 0)
             FROM entries WHERE directory != '' GROUP BY directory",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                to_u64(row.get(1)?),
                to_u64(row.get(2)?),
            ))
        })?;

        let mut totals: HashMap<String, (u64, u64)> = HashMap::new();
        for row in rows {
            let (directory, count, size) = row?;
            let path = CatalogPath::parse(&directory)
                .map_err(|e| CatalogError::invalid_entry(e.to_string()))?;
            for ancestor in path.lineage().into_iter().skip(1) {
                let slot = totals.entry(ancestor.as_str().to_string()).or_insert((0, 0));
                slot.0 += count;
                slot.1 += size;
            }
        }
        Ok(totals)
    }
}

impl BrowseEngine for SqliteCatalog {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn load_folder(&self, path: &CatalogPath) -> Result<Option<FolderView>> {
        let direct_entries = self.direct_entries(path)?;
        let child_names = self.child_folder_names(path)?;

        if !path.is_root() && direct_entries.is_empty() && child_names.is_empty() {
            return Ok(None);
        }

        let (entry_count, total_size_bytes) = self.folder_totals(path)?;

        let mut child_folders = Vec::with_capacity(child_names.len());
        for name in child_names {
            let child_path = path.join(&name);
            let (count, size) = self.folder_totals(&child_path)?;
            child_folders.push(FolderSummary {
                name,
                path: child_path,
                entry_count: count,
                total_size_bytes: size,
            });
        }

        let name = if path.is_root() {
            self.root_name.clone()
        } else {
            path.name().to_string()
        };

        Ok(Some(FolderView {
            name,
            path: path.clone(),
            entry_count,
            total_size_bytes,
            child_folders,
            direct_entries,
        }))
    }

    fn search_candidates(&self, query: &TextQuery) -> Result<Vec<ResultItem>> {
        let mut matches = Vec::new();

        for (directory, (count, size)) in self.rolled_up_directories()? {
            let path = CatalogPath::parse(&directory)?;
            if query.matches_folder_path(&path) {
                matches.push(ResultItem::Folder(FolderSummary {
                    name: path.name().to_string(),
                    path,
                    entry_count: count,
                    total_size_bytes: size,
                }));
            }
        }

        let files = self.query_entries(
            &format!(
                "SELECT {cols} FROM entries
                 WHERE {f}(name, ?1)
                    OR (extension != '(none)' AND {f}(extension, ?1))
                 ORDER BY id",
                cols = ENTRY_COLUMNS,
                f = MATCH_FN
            ),
            [query.needle()],
        )?;
        matches.extend(files.into_iter().map(ResultItem::file));

        Ok(matches)
    }

    fn list_all_entries(&self) -> Result<Vec<EntryRecord>> {
        self.query_entries(&format!("SELECT {} FROM entries", ENTRY_COLUMNS), [])
    }
}

/// Row as stored, before validation.
struct RawRow {
    name: String,
    extension: String,
    size_bytes: i64,
    modified: i64,
    created: i64,
    directory: String,
}

impl RawRow {
    fn into_record(self) -> Result<EntryRecord> {
        EntryRecord::new(
            self.name,
            &self.extension,
            to_u64(self.size_bytes),
            self.modified,
            self.created,
            &self.directory,
        )
    }
}

fn read_entry_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        name: row.get(0)?,
        extension: row.get(1)?,
        size_bytes: row.get(2)?,
        modified: row.get(3)?,
        created: row.get(4)?,
        directory: row.get(5)?,
    })
}

fn parse_total(key: &str, value: &str) -> u64 {
    match value.parse() {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(key, value, error = %e, "Unreadable store metadata; using 0");
            0
        }
    }
}

fn to_u64(value: i64) -> u64 {
    value.max(0) as u64
}

/// Escape `%`, `_` and the escape character itself for a LIKE pattern.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Last component of the scanned root, as shown for the catalog root.
pub(crate) fn root_display_name(root_path: &str) -> String {
    Path::new(root_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root_path.to_string())
}
