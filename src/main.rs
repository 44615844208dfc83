use anyhow::Result;
use clap::Parser;
use dirindex::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
