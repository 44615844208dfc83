//! Result items and the single ordering/matching utility shared by every backend
//!
//! Both backends hand their candidates to these functions, so sort order and
//! filter semantics cannot drift between the in-memory tree and the store.

use crate::entry::EntryRecord;
use crate::path::CatalogPath;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Column a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    #[default]
    Name,
    Extension,
    Size,
    Modified,
    Created,
}

impl SortColumn {
    pub const ALL: [SortColumn; 5] = [
        SortColumn::Name,
        SortColumn::Extension,
        SortColumn::Size,
        SortColumn::Modified,
        SortColumn::Created,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Name => "name",
            SortColumn::Extension => "extension",
            SortColumn::Size => "size",
            SortColumn::Modified => "modified",
            SortColumn::Created => "created",
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(SortColumn::Name),
            "extension" | "ext" | "type" => Ok(SortColumn::Extension),
            "size" => Ok(SortColumn::Size),
            "modified" | "mtime" => Ok(SortColumn::Modified),
            "created" | "ctime" => Ok(SortColumn::Created),
            other => Err(format!(
                "unknown sort column '{}' (expected name, extension, size, modified or created)",
                other
            )),
        }
    }
}

/// How a listing is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: SortColumn,
    pub ascending: bool,
    pub folders_first: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            column: SortColumn::Name,
            ascending: true,
            folders_first: true,
        }
    }
}

impl SortSpec {
    pub fn new(column: SortColumn, ascending: bool, folders_first: bool) -> Self {
        Self {
            column,
            ascending,
            folders_first,
        }
    }
}

/// Aggregate view of one folder as it appears in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderSummary {
    pub name: String,
    pub path: CatalogPath,
    pub entry_count: u64,
    pub total_size_bytes: u64,
}

/// File entry as it appears in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileItem {
    #[serde(flatten)]
    pub entry: EntryRecord,
    pub icon: &'static str,
}

impl From<EntryRecord> for FileItem {
    fn from(entry: EntryRecord) -> Self {
        let icon = entry.icon();
        Self { entry, icon }
    }
}

/// Common element of every listing and search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultItem {
    Folder(FolderSummary),
    File(FileItem),
}

impl ResultItem {
    pub fn file(entry: EntryRecord) -> Self {
        ResultItem::File(entry.into())
    }

    pub fn name(&self) -> &str {
        match self {
            ResultItem::Folder(f) => &f.name,
            ResultItem::File(f) => f.entry.name(),
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, ResultItem::Folder(_))
    }

    /// Size as displayed: subtree total for folders, file size for files.
    pub fn size_bytes(&self) -> u64 {
        match self {
            ResultItem::Folder(f) => f.total_size_bytes,
            ResultItem::File(f) => f.entry.size_bytes(),
        }
    }

    /// Extension for files; folders sort as if they had none.
    pub fn extension(&self) -> &str {
        match self {
            ResultItem::Folder(_) => "",
            ResultItem::File(f) => f.entry.extension(),
        }
    }

    /// Folders carry no timestamps and order before any file time.
    pub fn modified(&self) -> Option<i64> {
        match self {
            ResultItem::Folder(_) => None,
            ResultItem::File(f) => Some(f.entry.modified()),
        }
    }

    pub fn created(&self) -> Option<i64> {
        match self {
            ResultItem::Folder(_) => None,
            ResultItem::File(f) => Some(f.entry.created()),
        }
    }
}

/// Case-insensitive lexical comparison.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Compare two items under `spec`. Equal items keep their input order when
/// used with a stable sort.
pub fn compare_items(a: &ResultItem, b: &ResultItem, spec: &SortSpec) -> Ordering {
    if spec.folders_first {
        let group = b.is_folder().cmp(&a.is_folder());
        if group != Ordering::Equal {
            return group;
        }
    }

    let ord = match spec.column {
        SortColumn::Name => compare_text(a.name(), b.name()),
        SortColumn::Extension => compare_text(a.extension(), b.extension()),
        SortColumn::Size => a.size_bytes().cmp(&b.size_bytes()),
        SortColumn::Modified => a.modified().cmp(&b.modified()),
        SortColumn::Created => a.created().cmp(&b.created()),
    };

    if spec.ascending {
        ord
    } else {
        ord.reverse()
    }
}

/// Stable in-place sort of a candidate set.
pub fn sort_items(items: &mut [ResultItem], spec: &SortSpec) {
    items.sort_by(|a, b| compare_items(a, b, spec));
}

/// Case-insensitive substring query.
#[derive(Debug, Clone)]
pub struct TextQuery {
    needle: String,
}

impl TextQuery {
    pub fn new(text: &str) -> Self {
        Self {
            needle: text.to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Substring test; an empty query matches everything.
    pub fn matches(&self, haystack: &str) -> bool {
        self.needle.is_empty() || haystack.to_lowercase().contains(&self.needle)
    }

    /// Folders match on name, files on name or extension.
    pub fn matches_item(&self, item: &ResultItem) -> bool {
        match item {
            ResultItem::Folder(f) => self.matches(&f.name),
            ResultItem::File(f) => self.matches_entry(&f.entry),
        }
    }

    pub fn matches_entry(&self, entry: &EntryRecord) -> bool {
        self.matches(entry.name()) || (entry.has_extension() && self.matches(entry.extension()))
    }

    /// Folder search matches when any segment of the path contains the needle.
    pub fn matches_folder_path(&self, path: &CatalogPath) -> bool {
        !path.is_root() && path.segments().any(|segment| self.matches(segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(name: &str, size: u64) -> ResultItem {
        ResultItem::Folder(FolderSummary {
            name: name.to_string(),
            path: CatalogPath::parse(name).unwrap(),
            entry_count: 1,
            total_size_bytes: size,
        })
    }

    fn file(name: &str, size: u64, modified: i64) -> ResultItem {
        ResultItem::file(EntryRecord::from_file_name(name, size, modified, modified, "").unwrap())
    }

    fn names(items: &[ResultItem]) -> Vec<&str> {
        items.iter().map(|i| i.name()).collect()
    }

    #[test]
    fn test_folders_first_by_name() {
        let mut items = vec![file("b.txt", 1, 0), folder("Zeta", 5), file("A.txt", 2, 0), folder("alpha", 9)];
        sort_items(&mut items, &SortSpec::default());
        assert_eq!(names(&items), vec!["alpha", "Zeta", "A.txt", "b.txt"]);
    }

    #[test]
    fn test_folders_first_descending_keeps_groups() {
        let mut items = vec![file("z.txt", 999, 0), folder("a", 1), folder("b", 2)];
        sort_items(&mut items, &SortSpec::new(SortColumn::Size, false, true));
        assert_eq!(names(&items), vec!["b", "a", "z.txt"]);
    }

    #[test]
    fn test_size_normalizes_folder_totals() {
        let mut items = vec![file("big.bin", 50, 0), folder("dir", 20), file("small.bin", 5, 0)];
        sort_items(&mut items, &SortSpec::new(SortColumn::Size, true, false));
        assert_eq!(names(&items), vec!["small.bin", "dir", "big.bin"]);
    }

    #[test]
    fn test_ties_are_stable() {
        let mut items = vec![file("x.txt", 7, 0), file("y.txt", 7, 0), file("w.txt", 7, 0)];
        sort_items(&mut items, &SortSpec::new(SortColumn::Size, false, true));
        assert_eq!(names(&items), vec!["x.txt", "y.txt", "w.txt"]);
    }

    #[test]
    fn test_modified_column() {
        let mut items = vec![file("new", 1, 300), file("old", 1, 100), file("mid", 1, 200)];
        sort_items(&mut items, &SortSpec::new(SortColumn::Modified, false, true));
        assert_eq!(names(&items), vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_sort_column_parse() {
        assert_eq!("SIZE".parse::<SortColumn>().unwrap(), SortColumn::Size);
        assert_eq!("ext".parse::<SortColumn>().unwrap(), SortColumn::Extension);
        assert!("bogus".parse::<SortColumn>().is_err());
    }

    #[test]
    fn test_text_query() {
        let q = TextQuery::new("REPORT");
        assert!(q.matches("quarterly-report.pdf"));
        assert!(!q.matches("summary.pdf"));
        assert!(TextQuery::new("").matches("anything"));

        let by_ext = TextQuery::new("pdf");
        assert!(by_ext.matches_item(&file("scan.PDF", 1, 0)));
        assert!(by_ext.matches_item(&folder("pdfs", 1)));
        assert!(!by_ext.matches_item(&folder("docs", 1)));
    }

    #[test]
    fn test_text_query_keeps_whitespace() {
        let space = TextQuery::new(" ");
        assert!(!space.is_empty());
        assert!(space.matches("my file.txt"));
        assert!(!space.matches("other.txt"));

        let trailing = TextQuery::new("file ");
        assert!(trailing.matches("my file .txt"));
        assert!(!trailing.matches("my file.txt"));
    }

    #[test]
    fn test_folder_path_match() {
        let q = TextQuery::new("report");
        assert!(q.matches_folder_path(&CatalogPath::parse("a/reports").unwrap()));
        assert!(q.matches_folder_path(&CatalogPath::parse("a/reports/x").unwrap()));
        assert!(!q.matches_folder_path(&CatalogPath::parse("a/b").unwrap()));
        assert!(!q.matches_folder_path(&CatalogPath::root()));
    }
}
