//! Folder aggregate tree - build subtree-inclusive folder totals from a flat entry list

use crate::entry::EntryRecord;
use crate::path::CatalogPath;
use crate::sort::FolderSummary;
use std::collections::HashMap;

/// One folder in the catalog tree.
///
/// `entry_count` and `total_size_bytes` cover the whole subtree, so listings
/// can show folder sizes without walking descendants.
#[derive(Debug, Clone)]
pub struct FolderAggregate {
    name: String,
    path: CatalogPath,
    entry_count: u64,
    total_size_bytes: u64,
    children: Vec<FolderAggregate>, // insertion order
    child_index: HashMap<String, usize>,
    direct_entries: Vec<EntryRecord>,
}

impl FolderAggregate {
    fn empty(name: &str, path: CatalogPath) -> Self {
        Self {
            name: name.to_string(),
            path,
            entry_count: 0,
            total_size_bytes: 0,
            children: Vec::new(),
            child_index: HashMap::new(),
            direct_entries: Vec::new(),
        }
    }

    /// Build the tree rooted at `""` in a single pass over `entries`.
    ///
    /// Each entry walks (creating as needed) the nodes along its parent path
    /// and bumps every node it passes, root included, so the totals are
    /// subtree-inclusive when the pass ends.
    pub fn build<I>(root_name: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = EntryRecord>,
    {
        let mut root = Self::empty(root_name, CatalogPath::root());
        let mut inserted = 0u64;
        for entry in entries {
            root.insert(entry);
            inserted += 1;
        }
        tracing::debug!(
            entries = inserted,
            total_size = root.total_size_bytes,
            "Built folder aggregate tree"
        );
        root
    }

    fn insert(&mut self, entry: EntryRecord) {
        let size = entry.size_bytes();
        let parent = entry.parent_path().to_string();

        let mut node = self;
        node.count(size);
        for segment in parent.split('/').filter(|s| !s.is_empty()) {
            node = node.child_or_insert(segment);
            node.count(size);
        }
        node.direct_entries.push(entry);
    }

    fn count(&mut self, size: u64) {
        self.entry_count += 1;
        self.total_size_bytes += size;
    }

    fn child_or_insert(&mut self, segment: &str) -> &mut FolderAggregate {
        let idx = match self.child_index.get(segment) {
            Some(&idx) => idx,
            None => {
                let idx = self.children.len();
                let child = Self::empty(segment, self.path.join(segment));
                self.children.push(child);
                self.child_index.insert(segment.to_string(), idx);
                idx
            }
        };
        &mut self.children[idx]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &CatalogPath {
        &self.path
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.total_size_bytes
    }

    /// Immediate child folders in insertion order.
    pub fn children(&self) -> &[FolderAggregate] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&FolderAggregate> {
        self.child_index.get(name).map(|&idx| &self.children[idx])
    }

    /// Child folder names in insertion order.
    pub fn child_folder_names(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|c| c.name.as_str())
    }

    /// Files directly in this folder.
    pub fn direct_entries(&self) -> &[EntryRecord] {
        &self.direct_entries
    }

    pub fn summary(&self) -> FolderSummary {
        FolderSummary {
            name: self.name.clone(),
            path: self.path.clone(),
            entry_count: self.entry_count,
            total_size_bytes: self.total_size_bytes,
        }
    }

    /// Find a folder by walking path segments from this node.
    pub fn find(&self, path: &CatalogPath) -> Option<&FolderAggregate> {
        let mut node = self;
        for segment in path.segments() {
            node = node.child(segment)?;
        }
        Some(node)
    }

    /// Depth-first iterator over this folder and every descendant folder.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Every entry in the subtree, folder by folder.
    pub fn entries(&self) -> impl Iterator<Item = &EntryRecord> {
        self.descendants().flat_map(|f| f.direct_entries.iter())
    }

    /// Number of folders in the subtree, this one included.
    pub fn folder_count(&self) -> usize {
        self.descendants().count()
    }
}

/// Iterator returned by [`FolderAggregate::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a FolderAggregate>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a FolderAggregate;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, parent: &str, size: u64) -> EntryRecord {
        EntryRecord::from_file_name(name, size, 0, 0, parent).unwrap()
    }

    fn sample() -> FolderAggregate {
        FolderAggregate::build(
            "root",
            vec![
                entry("top.txt", "", 1),
                entry("a1.txt", "a", 10),
                entry("b1.txt", "a/b", 100),
                entry("b2.txt", "a/b", 200),
                entry("c1.txt", "c", 1000),
            ],
        )
    }

    #[test]
    fn test_root_totals() {
        let root = sample();
        assert_eq!(root.entry_count(), 5);
        assert_eq!(root.total_size_bytes(), 1311);
        assert_eq!(root.direct_entries().len(), 1);
    }

    #[test]
    fn test_subtree_totals() {
        let root = sample();
        let a = root.find(&CatalogPath::parse("a").unwrap()).unwrap();
        assert_eq!(a.entry_count(), 3);
        assert_eq!(a.total_size_bytes(), 310);

        let b = root.find(&CatalogPath::parse("a/b").unwrap()).unwrap();
        assert_eq!(b.entry_count(), 2);
        assert_eq!(b.path().as_str(), "a/b");
        assert_eq!(b.name(), "b");
    }

    #[test]
    fn test_subtree_invariant_every_folder() {
        let root = sample();
        for folder in root.descendants() {
            let children: u64 = folder.children().iter().map(|c| c.entry_count()).sum();
            assert_eq!(
                children + folder.direct_entries().len() as u64,
                folder.entry_count(),
                "folder {}",
                folder.path()
            );
        }
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let root = sample();
        let names: Vec<&str> = root.child_folder_names().collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_find_missing() {
        let root = sample();
        assert!(root.find(&CatalogPath::parse("a/zzz").unwrap()).is_none());
    }

    #[test]
    fn test_entries_and_folder_count() {
        let root = sample();
        assert_eq!(root.entries().count(), 5);
        assert_eq!(root.folder_count(), 4);
    }

    #[test]
    fn test_empty_tree() {
        let root = FolderAggregate::build("", Vec::new());
        assert_eq!(root.entry_count(), 0);
        assert_eq!(root.total_size_bytes(), 0);
        assert!(root.children().is_empty());
    }
}
