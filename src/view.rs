//! Caller-owned view state
//!
//! The engine keeps no session state. Whatever the user is currently looking
//! at (folder, ordering, filter, scroll position, last fetched window) lives
//! here and is threaded into each engine call explicitly.

use crate::engine::{BrowseEngine, Listing};
use crate::error::Result;
use crate::path::CatalogPath;
use crate::sort::SortSpec;
use crate::window::{Viewport, WindowRange};

#[derive(Debug, Clone)]
pub struct ViewState {
    path: CatalogPath,
    sort: SortSpec,
    search: String,
    viewport: Viewport,
    scroll_offset_px: f64,
    /// Filtered item count reported by the last fetch.
    total: Option<usize>,
    /// Window materialized by the last fetch.
    fetched: Option<WindowRange>,
}

impl ViewState {
    pub fn new(viewport: Viewport, sort: SortSpec) -> Self {
        Self {
            path: CatalogPath::root(),
            sort,
            search: String::new(),
            viewport,
            scroll_offset_px: 0.0,
            total: None,
            fetched: None,
        }
    }

    pub fn path(&self) -> &CatalogPath {
        &self.path
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn scroll_offset_px(&self) -> f64 {
        self.scroll_offset_px
    }

    pub fn total(&self) -> Option<usize> {
        self.total
    }

    pub fn fetched(&self) -> Option<WindowRange> {
        self.fetched
    }

    /// Open another folder. Scroll position and fetched data are reset.
    pub fn navigate(&mut self, path: &str) -> Result<()> {
        self.path = CatalogPath::parse(path)?;
        self.reset(true);
        Ok(())
    }

    /// Change ordering. The scroll position is kept.
    pub fn set_sort(&mut self, sort: SortSpec) {
        if sort != self.sort {
            self.sort = sort;
            self.reset(false);
        }
    }

    /// Change the filter text. Filtering changes the item count, so the
    /// list scrolls back to the top.
    pub fn set_search(&mut self, text: &str) {
        if text != self.search {
            self.search = text.to_string();
            self.reset(true);
        }
    }

    /// Window for the current scroll position. Before the first fetch the
    /// total is unknown and the window is left unclamped.
    pub fn current_window(&self) -> WindowRange {
        self.viewport
            .window(self.scroll_offset_px, self.total.unwrap_or(usize::MAX))
    }

    /// Record a scroll event. Returns the new window when it differs from
    /// the one last fetched.
    pub fn scroll_to(&mut self, scroll_offset_px: f64) -> Option<WindowRange> {
        self.scroll_offset_px = scroll_offset_px.max(0.0);
        let window = self.current_window();
        if self.fetched == Some(window) {
            None
        } else {
            Some(window)
        }
    }

    pub fn needs_fetch(&self) -> bool {
        self.fetched != Some(self.current_window())
    }

    /// Pull the current window from `engine` and remember what was fetched.
    pub fn fetch<E: BrowseEngine + ?Sized>(&mut self, engine: &E) -> Result<Listing> {
        let requested = self.current_window();
        let listing = engine.list_folder_contents(
            self.path.as_str(),
            &self.sort,
            &self.search,
            requested.to_page(),
        )?;

        self.total = Some(listing.total);
        let window = self.current_window();
        tracing::debug!(
            path = %self.path,
            start = window.start_index,
            end = window.end_index,
            total = listing.total,
            "Fetched window"
        );
        self.fetched = Some(window);
        Ok(listing)
    }

    fn reset(&mut self, scroll_to_top: bool) {
        if scroll_to_top {
            self.scroll_offset_px = 0.0;
        }
        self.total = None;
        self.fetched = None;
    }
}
