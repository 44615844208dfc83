//! Directory scanner - walks a root once and produces the entry list a catalog is built from

use crate::entry::EntryRecord;
use crate::progress;
use anyhow::{bail, Context, Result};
use globset::GlobSet;
use jwalk::WalkDir;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const PROGRESS_EVERY: u64 = 1000;

/// Walk options.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Patterns matched against the root-relative path and the bare name.
    /// A matching directory is pruned with everything below it.
    pub exclude: GlobSet,
    pub show_progress: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude: GlobSet::empty(),
            show_progress: false,
        }
    }
}

/// What a walk produced.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Canonical scan root.
    pub root_path: PathBuf,
    pub entries: Vec<EntryRecord>,
    pub total_size: u64,
    /// Unreadable directories, files whose metadata failed, unrepresentable names.
    pub errors: usize,
    pub duration: Duration,
}

/// Scan every regular file under `root`. Symlinks are not followed.
pub fn scan_directory(root: &Path, options: &ScanOptions) -> Result<ScanOutcome> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve scan root: {}", root.display()))?;
    if !root.is_dir() {
        bail!("Scan root is not a directory: {}", root.display());
    }

    tracing::info!(root = %root.display(), "Scanning directory");
    let start = Instant::now();

    let pb = if options.show_progress {
        progress::create_spinner("Scanning")
    } else {
        progress::hidden()
    };

    let filter_root = root.clone();
    let exclude = options.exclude.clone();

    let mut entries = Vec::new();
    let mut total_size = 0u64;
    let mut errors = 0usize;

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort(true)
        .process_read_dir(move |_depth, _path, _state, children| {
            children.retain(|entry| match entry {
                Ok(e) => {
                    if e.file_type().is_symlink() {
                        return false;
                    }
                    !is_excluded(&exclude, &filter_root, &e.path())
                }
                Err(_) => true,
            });
        });

    for entry in walker {
        let e = match entry {
            Ok(e) => e,
            Err(err) => {
                errors += 1;
                tracing::debug!(error = %err, "Skipping unreadable path");
                continue;
            }
        };
        if !e.file_type().is_file() {
            continue;
        }

        let path = e.path();
        match record_for(&root, &path, &e) {
            Ok(record) => {
                total_size += record.size_bytes();
                entries.push(record);
                if entries.len() as u64 % PROGRESS_EVERY == 0 {
                    pb.set_position(entries.len() as u64);
                }
            }
            Err(err) => {
                errors += 1;
                tracing::debug!(path = %path.display(), error = %err, "Skipping file");
            }
        }
    }

    pb.set_position(entries.len() as u64);
    progress::finish_with_message(&pb, "Scan complete");

    if errors > 0 {
        tracing::warn!(errors, "Some paths could not be read; catalog may be incomplete");
    }

    let duration = start.elapsed();
    tracing::info!(
        files = entries.len(),
        bytes = total_size,
        elapsed_ms = duration.as_millis() as u64,
        "Scan finished"
    );

    Ok(ScanOutcome {
        root_path: root,
        entries,
        total_size,
        errors,
        duration,
    })
}

fn is_excluded(exclude: &GlobSet, root: &Path, path: &Path) -> bool {
    if exclude.is_empty() {
        return false;
    }
    if let Some(name) = path.file_name() {
        if exclude.is_match(name) {
            return true;
        }
    }
    path.strip_prefix(root)
        .map(|rel| exclude.is_match(rel))
        .unwrap_or(false)
}

fn record_for(
    root: &Path,
    path: &Path,
    entry: &jwalk::DirEntry<((), ())>,
) -> Result<EntryRecord> {
    let metadata = entry
        .metadata()
        .with_context(|| format!("Failed to read metadata: {}", path.display()))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = path
        .parent()
        .and_then(|p| p.strip_prefix(root).ok())
        .map(relative_catalog_path)
        .unwrap_or_default();

    let modified = metadata.modified().map(unix_secs).unwrap_or(0);
    let created = metadata.created().map(unix_secs).unwrap_or(modified);

    Ok(EntryRecord::from_file_name(
        name,
        metadata.len(),
        modified,
        created,
        &parent,
    )?)
}

/// Root-relative directory as a `/`-separated catalog path.
fn relative_catalog_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn unix_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use globset::{Glob, GlobSetBuilder};
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("top.txt"), "12345").unwrap();
        fs::write(root.join("a/one.md"), "1").unwrap();
        fs::write(root.join("a/b/two.PDF"), "22").unwrap();
        fs::write(root.join("a/b/skip.tmp"), "x").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "zzz").unwrap();
        temp_dir
    }

    #[test]
    fn test_scan_collects_files() {
        let temp_dir = fixture();
        let outcome = scan_directory(temp_dir.path(), &ScanOptions::default()).unwrap();
        assert_eq!(outcome.entries.len(), 5);
        assert_eq!(outcome.total_size, 12);
        assert_eq!(outcome.errors, 0);

        let two = outcome
            .entries
            .iter()
            .find(|e| e.name() == "two.PDF")
            .unwrap();
        assert_eq!(two.parent_path(), "a/b");
        assert_eq!(two.extension(), ".pdf");
        assert!(two.modified() > 0);
    }

    #[test]
    fn test_scan_exclusions() {
        let temp_dir = fixture();
        let mut builder = GlobSetBuilder::new();
        builder.add(Glob::new("node_modules").unwrap());
        builder.add(Glob::new("*.tmp").unwrap());
        let options = ScanOptions {
            exclude: builder.build().unwrap(),
            show_progress: false,
        };
        let outcome = scan_directory(temp_dir.path(), &options).unwrap();
        let mut names: Vec<&str> = outcome.entries.iter().map(|e| e.name()).collect();
        names.sort();
        assert_eq!(names, vec!["one.md", "top.txt", "two.PDF"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_keeps_colon_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("c:backup")).unwrap();
        fs::write(root.join("c:backup/x.txt"), "abc").unwrap();
        fs::write(root.join("ok.txt"), "1").unwrap();

        let outcome = scan_directory(root, &ScanOptions::default()).unwrap();
        assert_eq!(outcome.errors, 0);
        assert_eq!(outcome.entries.len(), 2);
        let x = outcome.entries.iter().find(|e| e.name() == "x.txt").unwrap();
        assert_eq!(x.parent_path(), "c:backup");
    }

    #[test]
    fn test_scan_missing_root() {
        assert!(scan_directory(Path::new("/no/such/dir/here"), &ScanOptions::default()).is_err());
    }

    #[test]
    fn test_relative_catalog_path() {
        assert_eq!(relative_catalog_path(Path::new("")), "");
        assert_eq!(relative_catalog_path(Path::new("a/b")), "a/b");
    }
}
