//! Entry records - one scanned file in the catalog

use crate::error::{CatalogError, Result};
use crate::path::CatalogPath;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Extension marker for files without one.
pub const NO_EXTENSION: &str = "(none)";

/// Icon used when an extension has no dedicated mapping.
pub const DEFAULT_ICON: &str = "📎";

/// Folder icon used by renderers.
pub const FOLDER_ICON: &str = "📁";

/// Immutable description of one file.
///
/// Records are validated on construction (and on deserialization) so that
/// every record in a catalog has a non-empty name and a well-formed parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEntry")]
pub struct EntryRecord {
    name: String,
    extension: String,
    size_bytes: u64,
    modified: i64,
    created: i64,
    parent_path: String,
}

#[derive(Deserialize)]
struct RawEntry {
    name: String,
    extension: String,
    size_bytes: u64,
    modified: i64,
    created: i64,
    parent_path: String,
}

impl TryFrom<RawEntry> for EntryRecord {
    type Error = CatalogError;

    fn try_from(raw: RawEntry) -> Result<Self> {
        EntryRecord::new(
            raw.name,
            &raw.extension,
            raw.size_bytes,
            raw.modified,
            raw.created,
            &raw.parent_path,
        )
    }
}

impl EntryRecord {
    /// Build a record. `extension` is normalized (lowercase, leading dot);
    /// an empty extension becomes [`NO_EXTENSION`].
    pub fn new(
        name: impl Into<String>,
        extension: &str,
        size_bytes: u64,
        modified: i64,
        created: i64,
        parent_path: &str,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CatalogError::invalid_entry("file name must not be empty"));
        }
        if name.contains('/') {
            return Err(CatalogError::invalid_entry(format!(
                "file name '{}' contains a path separator",
                name
            )));
        }
        let parent = CatalogPath::parse(parent_path)
            .map_err(|e| CatalogError::invalid_entry(format!("{}: {}", name, e)))?;

        Ok(Self {
            name,
            extension: normalize_extension(extension),
            size_bytes,
            modified,
            created,
            parent_path: parent.as_str().to_string(),
        })
    }

    /// Build a record deriving the extension from the file name.
    pub fn from_file_name(
        name: impl Into<String>,
        size_bytes: u64,
        modified: i64,
        created: i64,
        parent_path: &str,
    ) -> Result<Self> {
        let name = name.into();
        let extension = extension_of(&name);
        Self::new(name, &extension, size_bytes, modified, created, parent_path)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn has_extension(&self) -> bool {
        self.extension != NO_EXTENSION
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Last modification time (Unix seconds).
    pub fn modified(&self) -> i64 {
        self.modified
    }

    /// Creation time (Unix seconds).
    pub fn created(&self) -> i64 {
        self.created
    }

    pub fn parent_path(&self) -> &str {
        &self.parent_path
    }

    /// Catalog-relative path of the file itself.
    pub fn relative_path(&self) -> String {
        if self.parent_path.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.parent_path, self.name)
        }
    }

    pub fn icon(&self) -> &'static str {
        icon_for_extension(&self.extension)
    }
}

/// Normalize an extension to lowercase with a leading dot.
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim();
    if trimmed.is_empty() || trimmed == NO_EXTENSION {
        return NO_EXTENSION.to_string();
    }
    let lower = trimmed.to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

/// Extension of a file name: the text after the last dot, unless the dot
/// leads the name (`.bashrc` has none).
pub fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(0) | None => NO_EXTENSION.to_string(),
        Some(i) if i + 1 == name.len() => NO_EXTENSION.to_string(),
        Some(i) => name[i..].to_lowercase(),
    }
}

/// Display icon for a normalized extension.
pub fn icon_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        // Documents
        ".pdf" => "📄",
        ".doc" | ".docx" | ".txt" | ".rtf" | ".md" | ".odt" => "📝",
        // Spreadsheets and presentations
        ".xls" | ".xlsx" | ".csv" | ".ods" | ".ppt" | ".pptx" | ".key" | ".odp" => "📊",
        // Images
        ".jpg" | ".jpeg" | ".png" | ".gif" | ".bmp" | ".svg" | ".webp" | ".ico" | ".heic"
        | ".raw" | ".tiff" | ".tif" => "🖼️",
        // Video
        ".mp4" | ".avi" | ".mov" | ".mkv" | ".wmv" | ".flv" | ".webm" | ".m4v" | ".mxf"
        | ".r3d" => "🎬",
        // Audio
        ".mp3" | ".wav" | ".flac" | ".aac" | ".ogg" | ".m4a" | ".wma" => "🎵",
        // Archives
        ".zip" | ".rar" | ".7z" | ".tar" | ".gz" | ".bz2" | ".xz" => "📦",
        // Code
        ".py" | ".js" | ".html" | ".css" | ".java" | ".cpp" | ".c" | ".h" | ".php" | ".rb"
        | ".go" | ".rs" | ".swift" | ".kt" | ".ts" | ".jsx" | ".tsx" | ".vue" | ".json"
        | ".xml" | ".yaml" | ".yml" | ".sh" | ".bat" => "💻",
        // Executables and installers
        ".exe" | ".app" | ".dmg" | ".pkg" | ".deb" | ".rpm" => "⚙️",
        // Databases
        ".db" | ".sqlite" | ".sql" => "🗄️",
        // Fonts
        ".ttf" | ".otf" | ".woff" | ".woff2" => "🔤",
        _ => DEFAULT_ICON,
    }
}

/// Format a Unix timestamp the way listings display it.
pub fn format_timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|utc| {
            utc.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
}
