//! In-memory backend - answers queries straight from the folder aggregate tree

use super::{BrowseEngine, FolderView};
use crate::entry::EntryRecord;
use crate::error::Result;
use crate::path::CatalogPath;
use crate::sort::{ResultItem, TextQuery};
use crate::tree::FolderAggregate;

/// Catalog held entirely in memory.
///
/// The tree is built once and never mutated, so a `MemoryCatalog` can be
/// shared by reference across threads.
#[derive(Debug, Clone)]
pub struct MemoryCatalog {
    root: FolderAggregate,
}

impl MemoryCatalog {
    pub fn from_tree(root: FolderAggregate) -> Self {
        Self { root }
    }

    pub fn from_entries<I>(root_name: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = EntryRecord>,
    {
        Self::from_tree(FolderAggregate::build(root_name, entries))
    }

    pub fn tree(&self) -> &FolderAggregate {
        &self.root
    }
}

impl BrowseEngine for MemoryCatalog {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn load_folder(&self, path: &CatalogPath) -> Result<Option<FolderView>> {
        Ok(self.root.find(path).map(|node| FolderView {
            name: node.name().to_string(),
            path: node.path().clone(),
            entry_count: node.entry_count(),
            total_size_bytes: node.total_size_bytes(),
            child_folders: node.children().iter().map(FolderAggregate::summary).collect(),
            direct_entries: node.direct_entries().to_vec(),
        }))
    }

    fn search_candidates(&self, query: &TextQuery) -> Result<Vec<ResultItem>> {
        let mut matches = Vec::new();
        for folder in self.root.descendants() {
            if query.matches_folder_path(folder.path()) {
                matches.push(ResultItem::Folder(folder.summary()));
            }
            matches.extend(
                folder
                    .direct_entries()
                    .iter()
                    .filter(|e| query.matches_entry(e))
                    .cloned()
                    .map(ResultItem::file),
            );
        }
        Ok(matches)
    }

    fn list_all_entries(&self) -> Result<Vec<EntryRecord>> {
        Ok(self.root.entries().cloned().collect())
    }
}
