//! Browse engine - one query contract over two catalog backends
//!
//! Backends only answer three raw questions (load a folder, find search
//! candidates, enumerate entries). Filtering, ordering, pagination and the
//! search cap are implemented once here as provided trait methods.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryCatalog;
pub use sqlite::SqliteCatalog;

use crate::config::StatsSettings;
use crate::entry::EntryRecord;
use crate::error::Result;
use crate::path::CatalogPath;
use crate::snapshot::CatalogSnapshot;
use crate::sort::{compare_text, sort_items, FolderSummary, ResultItem, SortSpec, TextQuery};
use crate::stats::CatalogStats;
use serde::Serialize;
use std::ops::Range;
use std::path::Path;

/// Maximum number of results returned by a global search.
pub const SEARCH_LIMIT: usize = 1000;

/// Requested slice of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    /// `None` means no upper bound.
    pub limit: Option<usize>,
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }

    /// The whole listing.
    pub fn all() -> Self {
        Self {
            offset: 0,
            limit: None,
        }
    }

    /// Index range this page covers within a set of `total` items.
    pub fn range(&self, total: usize) -> Range<usize> {
        let start = self.offset.min(total);
        let end = match self.limit {
            Some(limit) => start.saturating_add(limit).min(total),
            None => total,
        };
        start..end
    }
}

/// Contents of one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderView {
    pub name: String,
    pub path: CatalogPath,
    pub entry_count: u64,
    pub total_size_bytes: u64,
    /// Immediate child folders with subtree totals, ordered by name.
    pub child_folders: Vec<FolderSummary>,
    pub direct_entries: Vec<EntryRecord>,
}

impl FolderView {
    pub fn child_folder_names(&self) -> Vec<&str> {
        self.child_folders.iter().map(|c| c.name.as_str()).collect()
    }

    /// Child folders followed by direct files, as listing candidates.
    fn into_candidates(self) -> Vec<ResultItem> {
        let mut items = Vec::with_capacity(self.child_folders.len() + self.direct_entries.len());
        items.extend(self.child_folders.into_iter().map(ResultItem::Folder));
        items.extend(self.direct_entries.into_iter().map(ResultItem::file));
        items
    }
}

/// One page of a folder listing plus the filtered (pre-pagination) total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub items: Vec<ResultItem>,
    pub total: usize,
}

impl Listing {
    fn paginate(mut items: Vec<ResultItem>, page: Page) -> Self {
        let total = items.len();
        let range = page.range(total);
        items.truncate(range.end);
        items.drain(..range.start);
        Self { items, total }
    }
}

/// Query surface shared by every catalog backend.
pub trait BrowseEngine {
    /// Short backend label for logs and output.
    fn backend_name(&self) -> &'static str;

    /// Raw folder lookup. Child folder order is unspecified; `None` when the
    /// folder does not exist.
    fn load_folder(&self, path: &CatalogPath) -> Result<Option<FolderView>>;

    /// Every folder whose path has a segment matching `query` and every file
    /// whose name or extension matches it. `query` is never empty.
    fn search_candidates(&self, query: &TextQuery) -> Result<Vec<ResultItem>>;

    /// All entries, unsorted.
    fn list_all_entries(&self) -> Result<Vec<EntryRecord>>;

    /// Folder contents with child folders ordered by name.
    fn get_folder(&self, path: &str) -> Result<Option<FolderView>> {
        let path = CatalogPath::parse(path)?;
        let mut view = self.load_folder(&path)?;
        if let Some(view) = view.as_mut() {
            view.child_folders
                .sort_by(|a, b| compare_text(&a.name, &b.name).then_with(|| a.name.cmp(&b.name)));
        }
        Ok(view)
    }

    /// Child folders and direct files of `path`, filtered by `search_text`,
    /// ordered by `sort`, sliced by `page`. A missing folder gives an empty
    /// listing.
    fn list_folder_contents(
        &self,
        path: &str,
        sort: &SortSpec,
        search_text: &str,
        page: Page,
    ) -> Result<Listing> {
        let Some(view) = self.get_folder(path)? else {
            tracing::debug!(path, backend = self.backend_name(), "Folder not found");
            return Ok(Listing::default());
        };

        let query = TextQuery::new(search_text);
        let mut items: Vec<ResultItem> = view
            .into_candidates()
            .into_iter()
            .filter(|item| query.matches_item(item))
            .collect();
        sort_items(&mut items, sort);
        Ok(Listing::paginate(items, page))
    }

    /// Global search with the default ordering and the standard cap.
    fn search_global(&self, search_text: &str) -> Result<Vec<ResultItem>> {
        self.search_global_with(search_text, &SortSpec::default(), SEARCH_LIMIT)
    }

    /// Global search. Matches are put in path order first so ties resolve
    /// the same on every backend, then sorted, then capped at `limit`.
    fn search_global_with(
        &self,
        search_text: &str,
        sort: &SortSpec,
        limit: usize,
    ) -> Result<Vec<ResultItem>> {
        let query = TextQuery::new(search_text);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches = self.search_candidates(&query)?;
        let found = matches.len();
        matches.sort_by_cached_key(item_path);
        sort_items(&mut matches, sort);
        matches.truncate(limit);

        if found > limit {
            tracing::debug!(found, limit, "Search results truncated");
        }
        Ok(matches)
    }
}

fn item_path(item: &ResultItem) -> String {
    match item {
        ResultItem::Folder(f) => f.path.as_str().to_string(),
        ResultItem::File(f) => f.entry.relative_path(),
    }
}

/// A catalog opened from disk, tagged by backend kind.
#[derive(Debug)]
pub enum Catalog {
    Memory(MemoryCatalog),
    Sqlite(SqliteCatalog),
}

impl Catalog {
    /// Open a catalog file: `.json` snapshots load into memory, anything
    /// else is opened as a read-only SQLite store.
    pub fn open(path: &Path) -> Result<Self> {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            let snapshot = CatalogSnapshot::load(path)?;
            Ok(Catalog::Memory(snapshot.into_catalog()))
        } else {
            Ok(Catalog::Sqlite(SqliteCatalog::open(path)?))
        }
    }

    /// Dataset statistics. SQLite stores supply their recorded totals and
    /// extension groups; snapshots compute everything from the entries.
    pub fn stats(&self, settings: &StatsSettings) -> Result<CatalogStats> {
        match self {
            Catalog::Memory(c) => Ok(CatalogStats::compute(&c.list_all_entries()?, settings)),
            Catalog::Sqlite(c) => {
                let meta = c.metadata()?;
                let by_count = c.extension_stats()?;
                let entries = c.list_all_entries()?;
                Ok(CatalogStats::from_parts(
                    &entries,
                    by_count,
                    meta.total_files,
                    meta.total_size,
                    settings,
                ))
            }
        }
    }

    fn engine(&self) -> &dyn BrowseEngine {
        match self {
            Catalog::Memory(c) => c,
            Catalog::Sqlite(c) => c,
        }
    }
}

impl BrowseEngine for Catalog {
    fn backend_name(&self) -> &'static str {
        self.engine().backend_name()
    }

    fn load_folder(&self, path: &CatalogPath) -> Result<Option<FolderView>> {
        self.engine().load_folder(path)
    }

    fn search_candidates(&self, query: &TextQuery) -> Result<Vec<ResultItem>> {
        self.engine().search_candidates(query)
    }

    fn list_all_entries(&self) -> Result<Vec<EntryRecord>> {
        self.engine().list_all_entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::sort::SortColumn;

    fn entry(name: &str, parent: &str, size: u64, modified: i64) -> EntryRecord {
        EntryRecord::from_file_name(name, size, modified, modified, parent).unwrap()
    }

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::from_entries(
            "root",
            vec![
                entry("zeta.txt", "", 5, 10),
                entry("Alpha.md", "", 50, 30),
                entry("beta.log", "", 500, 20),
                entry("inner.txt", "docs", 7, 1),
                entry("deep.bin", "docs/old", 70, 2),
                entry("song.mp3", "music", 700, 3),
            ],
        )
    }

    #[test]
    fn test_page_range() {
        assert_eq!(Page::new(0, 10).range(3), 0..3);
        assert_eq!(Page::new(2, 10).range(3), 2..3);
        assert_eq!(Page::new(5, 10).range(3), 3..3);
        assert_eq!(Page::all().range(4), 0..4);
        assert_eq!(Page::new(1, 0).range(4), 1..1);
    }

    #[test]
    fn test_listing_folders_first() {
        let listing = catalog()
            .list_folder_contents("", &SortSpec::new(SortColumn::Size, false, true), "", Page::all())
            .unwrap();
        assert_eq!(listing.total, 5);
        let names: Vec<&str> = listing.items.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["music", "docs", "beta.log", "Alpha.md", "zeta.txt"]);
    }

    #[test]
    fn test_listing_filter_counts_before_paging() {
        let listing = catalog()
            .list_folder_contents("", &SortSpec::default(), "T", Page::new(0, 1))
            .unwrap();
        // only zeta.txt and beta.log contain a 't'
        assert_eq!(listing.total, 2);
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].name(), "beta.log");
    }

    #[test]
    fn test_listing_missing_folder_is_empty() {
        let listing = catalog()
            .list_folder_contents("nope/never", &SortSpec::default(), "", Page::all())
            .unwrap();
        assert_eq!(listing, Listing::default());
    }

    #[test]
    fn test_listing_invalid_path() {
        let err = catalog()
            .list_folder_contents("docs//old", &SortSpec::default(), "", Page::all())
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPath { .. }));
    }

    #[test]
    fn test_get_folder_sorts_children() {
        let view = catalog().get_folder("").unwrap().unwrap();
        assert_eq!(view.child_folder_names(), vec!["docs", "music"]);
        assert_eq!(view.entry_count, 6);
        assert_eq!(view.name, "root");
    }

    #[test]
    fn test_search_empty_text() {
        assert!(catalog().search_global("   ").unwrap().is_empty());
    }

    #[test]
    fn test_search_respects_limit() {
        let results = catalog()
            .search_global_with("t", &SortSpec::default(), 2)
            .unwrap();
        assert_eq!(results.len(), 2);
    }
}
