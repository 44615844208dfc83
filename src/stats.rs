//! Dataset-wide statistics computed from a full entry enumeration

use crate::config::StatsSettings;
use crate::entry::EntryRecord;
use crate::sort::FileItem;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Count and byte total for one extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionStat {
    pub extension: String,
    pub count: u64,
    pub total_size: u64,
}

/// Summary of a whole catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total_files: u64,
    pub total_size: u64,
    pub extension_count: usize,
    pub top_extensions_by_count: Vec<ExtensionStat>,
    pub top_extensions_by_size: Vec<ExtensionStat>,
    pub largest_files: Vec<FileItem>,
    pub recently_modified: Vec<FileItem>,
    pub recently_created: Vec<FileItem>,
    pub oldest_modified: Option<FileItem>,
    pub newest_modified: Option<FileItem>,
}

/// Group entries by extension, most common first.
pub fn extension_stats(entries: &[EntryRecord]) -> Vec<ExtensionStat> {
    let mut by_ext: HashMap<&str, (u64, u64)> = HashMap::new();
    for entry in entries {
        let slot = by_ext.entry(entry.extension()).or_insert((0, 0));
        slot.0 += 1;
        slot.1 += entry.size_bytes();
    }

    let mut stats: Vec<ExtensionStat> = by_ext
        .into_iter()
        .map(|(extension, (count, total_size))| ExtensionStat {
            extension: extension.to_string(),
            count,
            total_size,
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.extension.cmp(&b.extension)));
    stats
}

impl CatalogStats {
    pub fn compute(entries: &[EntryRecord], settings: &StatsSettings) -> Self {
        let total_size = entries.iter().map(|e| e.size_bytes()).sum();
        Self::from_parts(
            entries,
            extension_stats(entries),
            entries.len() as u64,
            total_size,
            settings,
        )
    }

    /// Stats from extension groups and totals a store already recorded.
    /// `by_count` must be ordered as [`extension_stats`] orders it.
    pub fn from_parts(
        entries: &[EntryRecord],
        by_count: Vec<ExtensionStat>,
        total_files: u64,
        total_size: u64,
        settings: &StatsSettings,
    ) -> Self {
        let extension_count = by_count.len();

        let mut by_size = by_count.clone();
        by_size.sort_by(|a, b| {
            b.total_size
                .cmp(&a.total_size)
                .then_with(|| a.extension.cmp(&b.extension))
        });

        let top = |mut v: Vec<&EntryRecord>, limit: usize| -> Vec<FileItem> {
            v.truncate(limit);
            v.into_iter().cloned().map(FileItem::from).collect()
        };

        let mut largest: Vec<&EntryRecord> = entries.iter().collect();
        largest.sort_by_key(|e| Reverse(e.size_bytes()));

        let mut modified: Vec<&EntryRecord> = entries.iter().collect();
        modified.sort_by_key(|e| Reverse(e.modified()));

        let mut created: Vec<&EntryRecord> = entries.iter().collect();
        created.sort_by_key(|e| Reverse(e.created()));

        let oldest_modified = modified.last().map(|e| FileItem::from((*e).clone()));
        let newest_modified = modified.first().map(|e| FileItem::from((*e).clone()));

        Self {
            total_files,
            total_size,
            extension_count,
            top_extensions_by_count: by_count.into_iter().take(settings.top_extensions).collect(),
            top_extensions_by_size: by_size.into_iter().take(settings.top_extensions).collect(),
            largest_files: top(largest, settings.largest_files),
            recently_modified: top(modified, settings.recent_files),
            recently_created: top(created, settings.recent_files),
            oldest_modified,
            newest_modified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(name: &str, size: u64, modified: i64) -> EntryRecord {
        EntryRecord::from_file_name(name, size, modified, modified - 5, "").unwrap()
    }

    #[test]
    fn test_extension_stats() {
        let entries = vec![e("a.txt", 1, 1), e("b.TXT", 2, 1), e("c.jpg", 100, 1), e("README", 3, 1)];
        let stats = extension_stats(&entries);
        assert_eq!(stats[0].extension, ".txt");
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].total_size, 3);
        assert_eq!(stats.len(), 3);
    }

    #[test]
    fn test_compute() {
        let entries = vec![e("a.txt", 1, 10), e("b.txt", 50, 30), e("c.jpg", 100, 20)];
        let settings = StatsSettings {
            top_extensions: 1,
            largest_files: 2,
            recent_files: 1,
        };
        let stats = CatalogStats::compute(&entries, &settings);
        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.total_size, 151);
        assert_eq!(stats.extension_count, 2);
        assert_eq!(stats.top_extensions_by_count[0].extension, ".txt");
        assert_eq!(stats.top_extensions_by_size[0].extension, ".jpg");
        assert_eq!(stats.largest_files.len(), 2);
        assert_eq!(stats.largest_files[0].entry.name(), "c.jpg");
        assert_eq!(stats.recently_modified[0].entry.name(), "b.txt");
        assert_eq!(stats.oldest_modified.unwrap().entry.name(), "a.txt");
    }

    #[test]
    fn test_compute_empty() {
        let stats = CatalogStats::compute(&[], &StatsSettings::default());
        assert_eq!(stats.total_files, 0);
        assert!(stats.newest_modified.is_none());
        assert!(stats.top_extensions_by_count.is_empty());
    }
}
