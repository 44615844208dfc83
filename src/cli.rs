use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::engine::{BrowseEngine, Catalog, Page};
use crate::logging::{self, LogConfig};
use crate::output::{self, OutputMode};
use crate::progress;
use crate::scanner::{self, ScanOptions};
use crate::snapshot::CatalogSnapshot;
use crate::sort::SortColumn;
use crate::store::{self, StoreOptions};
use crate::view::ViewState;

#[derive(Parser)]
#[command(name = "dirindex")]
#[command(version)]
#[command(about = "Catalog a directory tree once, then browse and search it without rescanning")]
#[command(
    long_about = "dirindex scans a directory tree into a catalog file and answers folder \
    listings, global searches and statistics from that catalog.\n\n\
    Small trees are stored as a JSON snapshot and browsed in memory; large trees \
    go to a SQLite store that is queried on demand.\n\n\
    Examples:\n  \
    dirindex index ~/Photos -o photos.db       # Scan and write a SQLite catalog\n  \
    dirindex ls photos.db 2023/raw --sort size --desc\n  \
    dirindex ls photos.db 2023 --scroll 4000   # Rows visible at a scroll offset\n  \
    dirindex search photos.db holiday\n  \
    dirindex stats photos.db --json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity (-v, -vv for more)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a directory and write a catalog
    #[command(visible_alias = "i")]
    Index {
        /// Directory to scan
        root: PathBuf,

        /// Catalog file to write (default: <root name>.db or <root name>.json)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Always write a SQLite store
        #[arg(long, conflicts_with = "json")]
        db: bool,

        /// Always write a JSON snapshot
        #[arg(long)]
        json: bool,

        /// Exclude paths matching a glob (repeatable)
        #[arg(long = "exclude", value_name = "PATTERN")]
        exclude: Vec<String>,
    },

    /// List the contents of one folder
    Ls {
        /// Catalog file (.db or .json)
        catalog: PathBuf,

        /// Catalog-relative folder path (default: root)
        #[arg(default_value = "")]
        path: String,

        /// Sort column: name, extension, size, modified, created
        #[arg(short = 's', long)]
        sort: Option<SortColumn>,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Mix folders and files instead of listing folders first
        #[arg(long)]
        no_folders_first: bool,

        /// Only show items whose name (or extension) contains this text
        #[arg(short = 'f', long)]
        filter: Option<String>,

        /// Index of the first item to show
        #[arg(long, default_value_t = 0, conflicts_with = "scroll")]
        offset: usize,

        /// Number of items to show (default: browse.page_size)
        #[arg(short = 'n', long, conflicts_with = "scroll")]
        limit: Option<usize>,

        /// Show the rows materialized at this scroll offset (pixels)
        #[arg(long, value_name = "PX")]
        scroll: Option<f64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search every folder and file in a catalog
    #[command(visible_alias = "find")]
    Search {
        /// Catalog file (.db or .json)
        catalog: PathBuf,

        /// Text to look for in names, extensions and folder paths
        text: String,

        /// Sort column: name, extension, size, modified, created
        #[arg(short = 's', long)]
        sort: Option<SortColumn>,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show totals and subfolders of one folder
    Info {
        /// Catalog file (.db or .json)
        catalog: PathBuf,

        /// Catalog-relative folder path (default: root)
        #[arg(default_value = "")]
        path: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dataset-wide statistics
    Stats {
        /// Catalog file (.db or .json)
        catalog: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or reset the configuration file
    Config {
        /// Print the effective configuration
        #[arg(long, conflicts_with = "reset")]
        show: bool,

        /// Overwrite the configuration file with defaults
        #[arg(long)]
        reset: bool,
    },
}

/// On-disk catalog format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Sqlite,
    Json,
}

impl CatalogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogFormat::Sqlite => "sqlite",
            CatalogFormat::Json => "json",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            CatalogFormat::Sqlite => "db",
            CatalogFormat::Json => "json",
        }
    }

    /// Explicit flags win, then the output file extension, then the entry
    /// count against `db_threshold`.
    pub fn choose(
        force_db: bool,
        force_json: bool,
        output: Option<&Path>,
        entries: usize,
        db_threshold: usize,
    ) -> Self {
        if force_db {
            return CatalogFormat::Sqlite;
        }
        if force_json {
            return CatalogFormat::Json;
        }
        if let Some(ext) = output.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
            match ext.to_ascii_lowercase().as_str() {
                "json" => return CatalogFormat::Json,
                "db" | "sqlite" | "sqlite3" => return CatalogFormat::Sqlite,
                _ => {}
            }
        }
        if entries > db_threshold {
            CatalogFormat::Sqlite
        } else {
            CatalogFormat::Json
        }
    }
}

fn default_output(root: &Path, format: CatalogFormat) -> PathBuf {
    let stem = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalog".to_string());
    PathBuf::from(format!("{}.{}", stem, format.extension()))
}

fn open_catalog(path: &Path) -> anyhow::Result<Catalog> {
    let catalog = Catalog::open(path)
        .with_context(|| format!("Failed to open catalog: {}", path.display()))?;
    tracing::debug!(path = %path.display(), backend = catalog.backend_name(), "Catalog opened");
    Ok(catalog)
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        logging::init_logging(LogConfig {
            verbose: self.verbose,
            quiet: self.quiet,
        })?;

        let output_mode = OutputMode::from_flags(self.quiet, self.verbose);
        let mut config = Config::load();

        match self.command {
            Commands::Index {
                root,
                output,
                db,
                json,
                exclude,
            } => {
                config.apply_cli_overrides(None, false, false, &exclude);
                let options = ScanOptions {
                    exclude: config.exclusion_set()?,
                    show_progress: output_mode != OutputMode::Quiet,
                };

                let outcome = scanner::scan_directory(&root, &options)?;
                let file_count = outcome.entries.len();
                let format = CatalogFormat::choose(
                    db,
                    json,
                    output.as_deref(),
                    file_count,
                    config.catalog.db_threshold,
                );
                let output = output.unwrap_or_else(|| default_output(&outcome.root_path, format));
                tracing::info!(format = format.as_str(), output = %output.display(), "Writing catalog");

                match format {
                    CatalogFormat::Sqlite => {
                        let pb = if output_mode != OutputMode::Quiet {
                            progress::create_progress_bar(file_count as u64, "Writing store")
                        } else {
                            progress::hidden()
                        };
                        let store_options = StoreOptions {
                            batch_size: config.catalog.insert_batch_size,
                        };
                        store::build_store(
                            &output,
                            &outcome.root_path,
                            &outcome.entries,
                            &store_options,
                            Some(&pb),
                        )?;
                        progress::finish_with_message(&pb, "Store written");
                    }
                    CatalogFormat::Json => {
                        CatalogSnapshot::new(&outcome.root_path, outcome.entries)
                            .save(&output)
                            .with_context(|| {
                                format!("Failed to write snapshot: {}", output.display())
                            })?;
                    }
                }

                if output_mode != OutputMode::Quiet {
                    output::print_index_summary(
                        &output,
                        format.as_str(),
                        file_count,
                        outcome.total_size,
                        outcome.errors,
                        outcome.duration,
                    );
                }
                Ok(())
            }

            Commands::Ls {
                catalog,
                path,
                sort,
                desc,
                no_folders_first,
                filter,
                offset,
                limit,
                scroll,
                json,
            } => {
                config.apply_cli_overrides(sort, desc, no_folders_first, &[]);
                let sort = config.browse.sort_spec();
                let filter = filter.unwrap_or_default();
                let engine = open_catalog(&catalog)?;

                if let Some(scroll) = scroll {
                    let mut view = ViewState::new(config.window.viewport(), sort);
                    view.navigate(&path)?;
                    view.set_search(&filter);
                    view.scroll_to(scroll);
                    let listing = view.fetch(&engine)?;
                    let window = view.fetched().unwrap_or_default();
                    if json {
                        #[derive(serde::Serialize)]
                        struct WindowedListing<'a> {
                            window: crate::window::WindowRange,
                            listing: &'a crate::engine::Listing,
                        }
                        output::print_json(
                            "ls",
                            &WindowedListing {
                                window,
                                listing: &listing,
                            },
                        )?;
                    } else {
                        output::print_window(&path, &listing, window, output_mode);
                    }
                    return Ok(());
                }

                let page = Page::new(offset, limit.unwrap_or(config.browse.page_size));
                let listing = engine.list_folder_contents(&path, &sort, &filter, page)?;
                if json {
                    output::print_json("ls", &listing)?;
                } else {
                    output::print_listing(&path, &listing, offset, output_mode);
                }
                Ok(())
            }

            Commands::Search {
                catalog,
                text,
                sort,
                desc,
                json,
            } => {
                config.apply_cli_overrides(sort, desc, false, &[]);
                let engine = open_catalog(&catalog)?;
                let limit = config.catalog.search_limit;
                let results =
                    engine.search_global_with(&text, &config.browse.sort_spec(), limit)?;
                if json {
                    output::print_json("search", &results)?;
                } else {
                    output::print_search(&text, &results, limit, output_mode);
                }
                Ok(())
            }

            Commands::Info {
                catalog,
                path,
                json,
            } => {
                let engine = open_catalog(&catalog)?;
                let Some(view) = engine.get_folder(&path)? else {
                    bail!("Folder not found in catalog: /{}", path);
                };
                if json {
                    output::print_json("info", &view)?;
                } else {
                    output::print_folder_view(&view, output_mode);
                }
                Ok(())
            }

            Commands::Stats { catalog, json } => {
                let engine = open_catalog(&catalog)?;
                let stats = engine.stats(&config.stats)?;
                if json {
                    output::print_json("stats", &stats)?;
                } else {
                    output::print_stats(&stats, output_mode);
                }
                Ok(())
            }

            Commands::Config { show, reset } => {
                if reset {
                    let path = Config::default().save()?;
                    println!("Configuration reset: {}", path.display());
                } else if show {
                    print!("{}", config.to_toml()?);
                } else {
                    println!("{}", Config::config_path()?.display());
                }
                Ok(())
            }
        }
    }
}
