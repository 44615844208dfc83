//! Catalog-relative folder paths
//!
//! Paths inside a catalog are `/`-joined segments relative to the scanned
//! root, with `""` naming the root itself. They are validated once at the
//! API boundary and never corrected: `a//b`, `/a` or `a/../b` are rejected.

use crate::error::{CatalogError, Result};
use serde::Serialize;
use std::fmt;

/// A validated catalog-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct CatalogPath(String);

impl CatalogPath {
    /// The catalog root (`""`).
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Validate `raw` as a catalog path.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Ok(Self::root());
        }
        if raw.starts_with('/') || raw.starts_with('\\') {
            return Err(CatalogError::invalid_path(raw, "absolute paths are not allowed"));
        }
        if has_drive_prefix(raw) {
            return Err(CatalogError::invalid_path(raw, "drive-qualified paths are not allowed"));
        }
        for segment in raw.split('/') {
            match segment {
                "" => return Err(CatalogError::invalid_path(raw, "empty path segment")),
                "." | ".." => {
                    return Err(CatalogError::invalid_path(raw, "relative segments are not allowed"))
                }
                _ => {}
            }
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path segments from the root; empty for the root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Last segment, or `""` for the root.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Path of an immediate child folder.
    pub fn join(&self, segment: &str) -> Self {
        if self.is_root() {
            Self(segment.to_string())
        } else {
            Self(format!("{}/{}", self.0, segment))
        }
    }

    /// Prefix that every strict descendant path starts with (`"a/"`),
    /// or `""` for the root.
    pub fn descendant_prefix(&self) -> String {
        if self.is_root() {
            String::new()
        } else {
            format!("{}/", self.0)
        }
    }

    /// Every ancestor path from the root down to (and including) `self`.
    pub fn lineage(&self) -> Vec<CatalogPath> {
        let mut out = vec![Self::root()];
        let mut current = Self::root();
        for segment in self.segments() {
            current = current.join(segment);
            out.push(current.clone());
        }
        out
    }
}

impl fmt::Display for CatalogPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("/")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// `C:` only names a drive on Windows; elsewhere `c:backup` is an ordinary name.
fn has_drive_prefix(raw: &str) -> bool {
    if !cfg!(windows) {
        return false;
    }
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_root() {
        let p = CatalogPath::parse("").unwrap();
        assert!(p.is_root());
        assert_eq!(p.segments().count(), 0);
        assert_eq!(p.name(), "");
    }

    #[test]
    fn test_parse_nested() {
        let p = CatalogPath::parse("a/b/c").unwrap();
        assert_eq!(p.segments().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(p.name(), "c");
        assert_eq!(p.descendant_prefix(), "a/b/c/");
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["/a", "a//b", "a/", "a/../b", "./a", "\\share"] {
            let err = CatalogPath::parse(bad).unwrap_err();
            assert!(matches!(err, CatalogError::InvalidPath { .. }), "{bad}");
        }
    }

    #[cfg(windows)]
    #[test]
    fn test_rejects_drive_prefix() {
        let err = CatalogPath::parse("C:/data").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPath { .. }));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_colon_names_are_plain_segments() {
        let p = CatalogPath::parse("c:backup/x:files").unwrap();
        assert_eq!(p.segments().collect::<Vec<_>>(), vec!["c:backup", "x:files"]);
    }

    #[test]
    fn test_lineage() {
        let p = CatalogPath::parse("a/b").unwrap();
        let lineage: Vec<String> = p.lineage().iter().map(|p| p.as_str().to_string()).collect();
        assert_eq!(lineage, vec!["", "a", "a/b"]);
    }

    #[test]
    fn test_join() {
        assert_eq!(CatalogPath::root().join("x").as_str(), "x");
        assert_eq!(CatalogPath::parse("x").unwrap().join("y").as_str(), "x/y");
    }
}
