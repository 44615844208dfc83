use crate::engine::{FolderView, Listing};
use crate::entry::{format_timestamp, FOLDER_ICON};
use crate::sort::ResultItem;
use crate::stats::{CatalogStats, ExtensionStat};
use crate::window::WindowRange;
use serde::Serialize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Quiet,       // Rows only, no headers or summaries
    Normal,      // Standard output
    Verbose,     // Extra columns
    VeryVerbose, // Full paths as well
}

impl OutputMode {
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            OutputMode::Quiet
        } else {
            match verbose {
                0 => OutputMode::Normal,
                1 => OutputMode::Verbose,
                _ => OutputMode::VeryVerbose,
            }
        }
    }

    fn decorated(self) -> bool {
        self != OutputMode::Quiet
    }
}

/// Human-readable byte size.
pub fn format_size(bytes: u64) -> String {
    bytesize::to_string(bytes, false)
}

/// Truncate a string to a maximum display width (adds ellipsis if needed).
fn truncate_to_width(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }

    let ellipsis = "…";
    let ellipsis_w = UnicodeWidthStr::width(ellipsis);
    let target = max_width.saturating_sub(ellipsis_w);

    let mut out = String::new();
    let mut w = 0usize;
    for ch in s.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if w + cw > target {
            break;
        }
        out.push(ch);
        w += cw;
    }
    out.push_str(ellipsis);
    out
}

/// Pad/truncate content to a specific display width (Unicode-aware).
fn pad_right_to_width(s: &str, width: usize) -> String {
    let truncated = truncate_to_width(s, width);
    let w = UnicodeWidthStr::width(truncated.as_str());
    format!("{}{}", truncated, " ".repeat(width.saturating_sub(w)))
}

/// Table row with borders and 1-space cell padding.
fn table_row(cols: &[(String, usize)]) -> String {
    let mut row = String::from("│");
    for (content, width) in cols {
        row.push(' ');
        row.push_str(&pad_right_to_width(content, *width));
        row.push(' ');
        row.push('│');
    }
    row
}

/// Horizontal separator line (Unicode box drawing).
/// Widths are content widths (excluding the 1-space left/right padding).
fn table_separator(widths: &[usize], left: &str, mid: &str, right: &str) -> String {
    let mut sep = left.to_string();
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            sep.push_str(mid);
        }
        // +2 for the 1-space padding on each side of the cell
        sep.push_str(&"─".repeat(width + 2));
    }
    sep.push_str(right);
    sep
}

fn print_table(headers: &[&str], widths: &[usize], rows: &[Vec<String>], mode: OutputMode) {
    if mode.decorated() {
        println!("{}", table_separator(widths, "┌", "┬", "┐"));
        let header: Vec<(String, usize)> = headers
            .iter()
            .zip(widths)
            .map(|(h, w)| (h.to_string(), *w))
            .collect();
        println!("{}", table_row(&header));
        println!("{}", table_separator(widths, "├", "┼", "┤"));
    }
    for row in rows {
        let cols: Vec<(String, usize)> = row.iter().cloned().zip(widths.iter().copied()).collect();
        println!("{}", table_row(&cols));
    }
    if mode.decorated() {
        println!("{}", table_separator(widths, "└", "┴", "┘"));
    }
}

/// Catalog-relative location of a listing item.
pub fn item_location(item: &ResultItem) -> String {
    match item {
        ResultItem::Folder(f) => f.path.to_string(),
        ResultItem::File(f) => f.entry.relative_path(),
    }
}

fn item_row(item: &ResultItem, mode: OutputMode, with_location: bool) -> Vec<String> {
    let (icon, kind, modified, created) = match item {
        ResultItem::Folder(f) => (
            FOLDER_ICON,
            format!("{} items", f.entry_count),
            "-".to_string(),
            "-".to_string(),
        ),
        ResultItem::File(f) => (
            f.icon,
            f.entry.extension().to_string(),
            format_timestamp(f.entry.modified()),
            format_timestamp(f.entry.created()),
        ),
    };

    let label = if with_location || mode == OutputMode::VeryVerbose {
        item_location(item)
    } else {
        item.name().to_string()
    };

    let mut row = vec![
        format!("{} {}", icon, label),
        kind,
        format_size(item.size_bytes()),
        modified,
    ];
    if mode == OutputMode::Verbose || mode == OutputMode::VeryVerbose {
        row.push(created);
    }
    row
}

fn item_columns(mode: OutputMode, name_width: usize) -> (Vec<&'static str>, Vec<usize>) {
    let mut headers = vec!["Name", "Type", "Size", "Modified"];
    let mut widths = vec![name_width, 12, 10, 19];
    if mode == OutputMode::Verbose || mode == OutputMode::VeryVerbose {
        headers.push("Created");
        widths.push(19);
    }
    (headers, widths)
}

/// Print one page of a folder listing.
pub fn print_listing(path: &str, listing: &Listing, offset: usize, mode: OutputMode) {
    if mode.decorated() {
        println!();
        println!("📂 /{}", path);
        println!();
    }

    let (headers, widths) = item_columns(mode, 40);
    let rows: Vec<Vec<String>> = listing
        .items
        .iter()
        .map(|item| item_row(item, mode, false))
        .collect();
    print_table(&headers, &widths, &rows, mode);

    if mode.decorated() {
        println!("{}", page_summary(offset, listing.items.len(), listing.total));
    }
}

/// Print a listing materialized for a scroll window.
pub fn print_window(path: &str, listing: &Listing, window: WindowRange, mode: OutputMode) {
    print_listing(path, listing, window.start_index, mode);
    if mode.decorated() {
        println!(
            "Window rows {}..{} (spacers: {} above, {} below)",
            window.start_index,
            window.end_index,
            window.start_index,
            listing.total.saturating_sub(window.end_index)
        );
    }
}

fn page_summary(offset: usize, shown: usize, total: usize) -> String {
    if shown == 0 {
        format!("No items shown ({} total)", total)
    } else {
        format!("Showing {}-{} of {}", offset + 1, offset + shown, total)
    }
}

/// Print global search results.
pub fn print_search(text: &str, items: &[ResultItem], limit: usize, mode: OutputMode) {
    if mode.decorated() {
        println!();
        println!("🔍 Results for \"{}\"", text);
        println!();
    }

    let (headers, widths) = item_columns(mode, 56);
    let rows: Vec<Vec<String>> = items.iter().map(|item| item_row(item, mode, true)).collect();
    print_table(&headers, &widths, &rows, mode);

    if mode.decorated() {
        let folders = items.iter().filter(|i| i.is_folder()).count();
        println!(
            "{} matches ({} folders, {} files)",
            items.len(),
            folders,
            items.len() - folders
        );
        if items.len() >= limit {
            println!("Results capped at {}; refine the search to see more.", limit);
        }
    }
}

/// Print a folder summary with its child folders.
pub fn print_folder_view(view: &FolderView, mode: OutputMode) {
    if mode.decorated() {
        println!();
        println!("{} {}", FOLDER_ICON, view.name);
        println!("  Path:        /{}", view.path.as_str());
        println!("  Entries:     {}", view.entry_count);
        println!("  Total size:  {}", format_size(view.total_size_bytes));
        println!("  Direct files: {}", view.direct_entries.len());
        println!("  Subfolders:  {}", view.child_folders.len());
        println!();
    }

    if view.child_folders.is_empty() {
        return;
    }
    let widths = [40, 10, 10];
    let rows: Vec<Vec<String>> = view
        .child_folders
        .iter()
        .map(|c| {
            vec![
                format!("{} {}", FOLDER_ICON, c.name),
                c.entry_count.to_string(),
                format_size(c.total_size_bytes),
            ]
        })
        .collect();
    print_table(&["Folder", "Entries", "Size"], &widths, &rows, mode);
}

fn extension_rows(stats: &[ExtensionStat]) -> Vec<Vec<String>> {
    stats
        .iter()
        .map(|s| vec![s.extension.clone(), s.count.to_string(), format_size(s.total_size)])
        .collect()
}

/// Print dataset-wide statistics.
pub fn print_stats(stats: &CatalogStats, mode: OutputMode) {
    println!();
    println!("📊 Catalog statistics");
    println!("  Files:       {}", stats.total_files);
    println!("  Total size:  {}", format_size(stats.total_size));
    println!("  Extensions:  {}", stats.extension_count);
    if let (Some(oldest), Some(newest)) = (&stats.oldest_modified, &stats.newest_modified) {
        println!(
            "  Modified:    {} .. {}",
            format_timestamp(oldest.entry.modified()),
            format_timestamp(newest.entry.modified())
        );
    }
    println!();

    let ext_widths = [16, 10, 10];
    let ext_headers = ["Extension", "Files", "Size"];
    println!("Top extensions by count");
    print_table(&ext_headers, &ext_widths, &extension_rows(&stats.top_extensions_by_count), mode);
    println!("Top extensions by size");
    print_table(&ext_headers, &ext_widths, &extension_rows(&stats.top_extensions_by_size), mode);

    let (headers, widths) = item_columns(mode, 56);
    let file_rows = |files: &[crate::sort::FileItem]| -> Vec<Vec<String>> {
        files
            .iter()
            .map(|f| item_row(&ResultItem::File(f.clone()), mode, true))
            .collect()
    };
    println!("Largest files");
    print_table(&headers, &widths, &file_rows(&stats.largest_files), mode);
    println!("Recently modified");
    print_table(&headers, &widths, &file_rows(&stats.recently_modified), mode);
    if mode != OutputMode::Normal && mode != OutputMode::Quiet {
        println!("Recently created");
        print_table(&headers, &widths, &file_rows(&stats.recently_created), mode);
    }
}

/// Summary printed after `index`.
pub fn print_index_summary(
    output: &std::path::Path,
    format: &str,
    files: usize,
    total_size: u64,
    errors: usize,
    elapsed: std::time::Duration,
) {
    println!();
    println!("✅ Indexed {} files ({})", files, format_size(total_size));
    println!("   Catalog: {} [{}]", output.display(), format);
    println!("   Time:    {:.2}s", elapsed.as_secs_f64());
    if errors > 0 {
        println!("   Skipped: {} unreadable paths", errors);
    }
}

#[derive(Serialize)]
struct JsonEnvelope<'a, T: Serialize> {
    version: &'static str,
    timestamp: String,
    command: &'a str,
    data: &'a T,
}

/// Print any result as the standard JSON envelope.
pub fn print_json<T: Serialize>(command: &str, data: &T) -> anyhow::Result<()> {
    println!("{}", to_json(command, data)?);
    Ok(())
}

fn to_json<T: Serialize>(command: &str, data: &T) -> anyhow::Result<String> {
    let envelope = JsonEnvelope {
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        command,
        data,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryRecord;
    use crate::path::CatalogPath;
    use crate::sort::FolderSummary;

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        // wide chars count double
        assert_eq!(UnicodeWidthStr::width(truncate_to_width("日本語のファイル", 7).as_str()), 7);
    }

    #[test]
    fn test_table_row_padding() {
        let row = table_row(&[("ab".to_string(), 4), ("c".to_string(), 2)]);
        assert_eq!(row, "│ ab   │ c  │");
        assert_eq!(table_separator(&[1, 2], "┌", "┬", "┐"), "┌───┬────┐");
    }

    #[test]
    fn test_output_mode_from_flags() {
        assert_eq!(OutputMode::from_flags(true, 2), OutputMode::Quiet);
        assert_eq!(OutputMode::from_flags(false, 0), OutputMode::Normal);
        assert_eq!(OutputMode::from_flags(false, 1), OutputMode::Verbose);
        assert_eq!(OutputMode::from_flags(false, 5), OutputMode::VeryVerbose);
    }

    #[test]
    fn test_item_location() {
        let file = ResultItem::file(EntryRecord::from_file_name("x.txt", 1, 0, 0, "a/b").unwrap());
        assert_eq!(item_location(&file), "a/b/x.txt");
        let folder = ResultItem::Folder(FolderSummary {
            name: "b".to_string(),
            path: CatalogPath::parse("a/b").unwrap(),
            entry_count: 1,
            total_size_bytes: 1,
        });
        assert_eq!(item_location(&folder), "a/b");
    }

    #[test]
    fn test_page_summary() {
        assert_eq!(page_summary(0, 0, 0), "No items shown (0 total)");
        assert_eq!(page_summary(100, 50, 1000), "Showing 101-150 of 1000");
    }

    #[test]
    fn test_json_envelope() {
        let listing = Listing {
            items: vec![ResultItem::file(
                EntryRecord::from_file_name("x.txt", 3, 0, 0, "").unwrap(),
            )],
            total: 1,
        };
        let json = to_json("ls", &listing).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["command"], "ls");
        assert_eq!(value["data"]["total"], 1);
        assert_eq!(value["data"]["items"][0]["kind"], "file");
        assert_eq!(value["data"]["items"][0]["name"], "x.txt");
        assert_eq!(value["data"]["items"][0]["icon"], "📝");
    }
}
