use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Braille spinner frames.
pub const SPINNER_FRAMES: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create a spinner for the directory walk, where the file count is unknown
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg} ({pos} files, {elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_FRAMES);
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Create a progress bar for writing a known number of entries
///
/// Shows: spinner, progress bar, position/total, rows per second, ETA, and message
pub fn create_progress_bar(total: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) ETA: {eta} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
        .tick_chars(SPINNER_FRAMES);
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Progress bar that draws nothing, for quiet and JSON modes
pub fn hidden() -> ProgressBar {
    ProgressBar::hidden()
}

/// Finish progress bar with a success message
pub fn finish_with_message(pb: &ProgressBar, msg: &str) {
    pb.finish_with_message(msg.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_frames() {
        assert_eq!(SPINNER_FRAMES.chars().count(), 10);
    }

    #[test]
    fn test_create_spinner() {
        let pb = create_spinner("Scanning");
        assert!(!pb.is_finished());
        pb.inc(3);
        assert_eq!(pb.position(), 3);
        pb.finish();
        assert!(pb.is_finished());
    }

    #[test]
    fn test_create_progress_bar() {
        let pb = create_progress_bar(100, "Writing");
        assert_eq!(pb.length(), Some(100));
        assert_eq!(pb.position(), 0);
        pb.set_position(50);
        assert_eq!(pb.position(), 50);
        finish_with_message(&pb, "done");
        assert!(pb.is_finished());
    }

    #[test]
    fn test_hidden() {
        let pb = hidden();
        pb.inc(1);
        assert!(pb.is_hidden());
    }
}
