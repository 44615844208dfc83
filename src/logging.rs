//! Tracing setup for the `dirindex` binary.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "dirindex=info";

/// Verbosity requested on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogConfig {
    /// Number of `-v` flags.
    pub verbose: u8,
    pub quiet: bool,
}

impl LogConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub fn default_filter(&self) -> &'static str {
        if self.quiet {
            "dirindex=warn"
        } else {
            match self.verbose {
                0 => DEFAULT_LOG_FILTER,
                1 => "dirindex=debug",
                _ => "dirindex=trace",
            }
        }
    }
}

/// Install a stderr subscriber. `RUST_LOG` takes precedence over the flags.
pub fn init_logging(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_filter()));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.verbose > 0)
                .with_filter(filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
