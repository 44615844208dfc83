use crate::sort::{SortColumn, SortSpec};
use crate::window::Viewport;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV: &str = "DIRINDEX_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogSettings,

    #[serde(default)]
    pub browse: BrowseSettings,

    #[serde(default)]
    pub window: WindowSettings,

    #[serde(default)]
    pub scan: ScanSettings,

    #[serde(default)]
    pub stats: StatsSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Catalogs with more entries than this are written as SQLite stores.
    #[serde(default = "default_db_threshold")]
    pub db_threshold: usize,

    #[serde(default = "default_insert_batch_size")]
    pub insert_batch_size: usize,

    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseSettings {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default)]
    pub sort: SortColumn,

    #[serde(default = "default_true")]
    pub ascending: bool,

    #[serde(default = "default_true")]
    pub folders_first: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSettings {
    #[serde(default = "default_row_height")]
    pub row_height_px: f64,

    #[serde(default = "default_viewport_height")]
    pub viewport_height_px: f64,

    #[serde(default = "default_buffer_rows")]
    pub buffer_rows: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Glob patterns matched against catalog-relative paths and bare names.
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSettings {
    #[serde(default = "default_top_extensions")]
    pub top_extensions: usize,

    #[serde(default = "default_list_len")]
    pub largest_files: usize,

    #[serde(default = "default_list_len")]
    pub recent_files: usize,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            db_threshold: default_db_threshold(),
            insert_batch_size: default_insert_batch_size(),
            search_limit: default_search_limit(),
        }
    }
}

impl Default for BrowseSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            sort: SortColumn::default(),
            ascending: true,
            folders_first: true,
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            row_height_px: default_row_height(),
            viewport_height_px: default_viewport_height(),
            buffer_rows: default_buffer_rows(),
        }
    }
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            top_extensions: default_top_extensions(),
            largest_files: default_list_len(),
            recent_files: default_list_len(),
        }
    }
}

fn default_db_threshold() -> usize { 200_000 }
fn default_insert_batch_size() -> usize { 5000 }
fn default_search_limit() -> usize { crate::engine::SEARCH_LIMIT }
fn default_page_size() -> usize { 100 }
fn default_true() -> bool { true }
fn default_row_height() -> f64 { 40.0 }
fn default_viewport_height() -> f64 { 800.0 }
fn default_buffer_rows() -> usize { 5 }
fn default_top_extensions() -> usize { 10 }
fn default_list_len() -> usize { 50 }

impl BrowseSettings {
    pub fn sort_spec(&self) -> SortSpec {
        SortSpec::new(self.sort, self.ascending, self.folders_first)
    }
}

impl WindowSettings {
    pub fn viewport(&self) -> Viewport {
        Viewport {
            row_height_px: self.row_height_px,
            viewport_height_px: self.viewport_height_px,
            buffer_rows: self.buffer_rows,
        }
    }
}

impl Config {
    /// Get the config file path: `$DIRINDEX_CONFIG`, or `config.toml` in the
    /// platform config directory
    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        let dirs = ProjectDirs::from("", "", "dirindex")
            .context("Could not determine a home directory for the config file")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load config from file or return defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Ok(path) if path.exists() => match fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml = self.to_toml()?;
        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Apply CLI option overrides
    pub fn apply_cli_overrides(
        &mut self,
        sort: Option<SortColumn>,
        descending: bool,
        no_folders_first: bool,
        exclude: &[String],
    ) {
        if let Some(column) = sort {
            self.browse.sort = column;
        }
        if descending {
            self.browse.ascending = false;
        }
        if no_folders_first {
            self.browse.folders_first = false;
        }
        self.scan.exclude.extend(exclude.iter().cloned());
    }

    /// Compile the scan exclusion patterns
    pub fn exclusion_set(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.scan.exclude {
            let glob = Glob::new(pattern)
                .with_context(|| format!("Invalid exclude pattern: {}", pattern))?;
            builder.add(glob);
        }
        builder.build().context("Failed to compile exclude patterns")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.catalog.db_threshold, 200_000);
        assert_eq!(config.catalog.insert_batch_size, 5000);
        assert_eq!(config.catalog.search_limit, 1000);
        assert_eq!(config.browse.page_size, 100);
        assert_eq!(config.browse.sort_spec(), SortSpec::default());
        assert_eq!(config.window.viewport(), Viewport::default());
        assert_eq!(config.stats.top_extensions, 10);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [browse]
            sort = "size"
            ascending = false

            [scan]
            exclude = ["node_modules", "*.tmp"]
            "#,
        )
        .unwrap();
        assert_eq!(config.browse.sort, SortColumn::Size);
        assert!(!config.browse.ascending);
        assert!(config.browse.folders_first);
        assert_eq!(config.browse.page_size, 100);
        assert_eq!(config.window.buffer_rows, 5);
        assert_eq!(config.scan.exclude.len(), 2);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.window.row_height_px = 24.0;
        let text = config.to_toml().unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.window.row_height_px, 24.0);
        assert_eq!(back.catalog.db_threshold, 200_000);
    }

    #[test]
    fn test_config_apply_cli_overrides() {
        let mut config = Config::default();
        config.apply_cli_overrides(Some(SortColumn::Modified), true, true, &["*.log".to_string()]);

        let spec = config.browse.sort_spec();
        assert_eq!(spec.column, SortColumn::Modified);
        assert!(!spec.ascending);
        assert!(!spec.folders_first);
        assert_eq!(config.scan.exclude, vec!["*.log".to_string()]);
    }

    #[test]
    fn test_config_partial_overrides() {
        let mut config = Config::default();
        config.apply_cli_overrides(None, false, false, &[]);
        assert_eq!(config.browse.sort_spec(), SortSpec::default());
    }

    #[test]
    fn test_exclusion_set() {
        let mut config = Config::default();
        config.scan.exclude = vec!["*.tmp".to_string(), "build/**".to_string()];
        let set = config.exclusion_set().unwrap();
        assert!(set.is_match("a/b/x.tmp"));
        assert!(set.is_match("build/out/bin"));
        assert!(!set.is_match("src/main.rs"));

        config.scan.exclude = vec!["[".to_string()];
        assert!(config.exclusion_set().is_err());
    }
}
