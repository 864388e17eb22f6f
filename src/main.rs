use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod assets;
mod config;
mod convert;

use config::ConvertConfig;
use convert::Batch;

/// Convert every Markdown file in a directory into a standalone HTML page.
///
/// Existing `*.html` files in the directory are deleted first.
#[derive(Parser)]
#[command(name = "md2html", version, about)]
struct Args {
    /// The directory to convert (defaults to the current directory)
    directory: Option<PathBuf>,

    /// Maximum number of files converted at once (default: all at once)
    #[arg(short, long)]
    jobs: Option<NonZeroUsize>,

    /// Use this template file instead of the built-in one
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Print debug diagnostics
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    // --verbose enables DEBUG level, otherwise use RUST_LOG or default to WARN
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ConvertConfig::resolve(
        args.directory.as_deref(),
        args.jobs,
        args.template.as_deref(),
    )?;

    let batch = Batch::new(config)?;
    batch.run().await?;

    Ok(())
}
