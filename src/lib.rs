//! dirindex library crate
//!
//! This crate provides both a CLI binary and a library API for programmatic use:
//! build a catalog from a directory walk, then browse it through [`engine::BrowseEngine`]
//! against either the in-memory tree or a SQLite store.

pub mod cli;
pub mod config;
pub mod engine;
pub mod entry;
pub mod error;
pub mod logging;
pub mod output;
pub mod path;
pub mod progress;
pub mod scanner;
pub mod snapshot;
pub mod sort;
pub mod stats;
pub mod store;
pub mod tree;
pub mod view;
pub mod window;

pub use engine::{BrowseEngine, Catalog, FolderView, Listing, MemoryCatalog, Page, SqliteCatalog};
pub use error::{CatalogError, Result};
