//! file-copier - copy every file with a matching extension into a
//! mirrored, timestamped tree.
//!
//! Usage:
//!   file-copier --sourcedir SRC --outputdir OUT --filetypes rs,toml [--workers N]
//!   file-copier --help

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use filecopier_core::{CopyConfig, LocalFs, MAX_WORKERS, MIN_WORKERS};
use filecopier_explore::{ExploreSummary, copy_files_with};

#[derive(Parser)]
#[command(
    name = "file-copier",
    version,
    about = "Copy files with matching extensions into a mirrored tree",
    long_about = "file-copier crawls a source directory and copies every file whose \
                  extension is in --filetypes into <outputdir>/copied_files_<unix seconds>, \
                  keeping the directory structure."
)]
struct Cli {
    /// Source directory to crawl
    #[arg(long = "sourcedir")]
    source_dir: PathBuf,

    /// Directory the timestamped output root is created in
    #[arg(long = "outputdir")]
    output_dir: PathBuf,

    /// Comma-separated extensions to copy (e.g. "rs,toml")
    #[arg(long = "filetypes")]
    file_types: String,

    /// Number of directories explored concurrently (1-20)
    #[arg(
        long,
        default_value_t = MIN_WORKERS as u8,
        value_parser = clap::value_parser!(u8).range(MIN_WORKERS as i64..=MAX_WORKERS as i64)
    )]
    workers: u8,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = CopyConfig::from_raw_types(
        &cli.source_dir,
        &cli.output_dir,
        &cli.file_types,
        usize::from(cli.workers),
    )
    .context("Invalid arguments")?;

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    let summary = copy_files_with(config, Arc::new(LocalFs), cancel)
        .await
        .context("Copy failed")?;

    match cli.format {
        OutputFormat::Text => print_summary(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}

/// Install the tracing subscriber; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("file_copier=debug,filecopier_explore=debug,warn")
        } else {
            EnvFilter::new("file_copier=info,filecopier_explore=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Cancel the run on the first Ctrl-C.
fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, waiting for running copies to finish");
            cancel.cancel();
        }
    });
}

/// Print a drained run's totals.
fn print_summary(summary: &ExploreSummary) {
    eprintln!(
        "{} files ({}) from {} directories copied to {} in {:.2}s",
        summary.files_copied,
        humansize::format_size(summary.bytes_copied, humansize::BINARY),
        summary.dirs_explored,
        summary.output_root.display(),
        summary.elapsed.as_secs_f64()
    );
    println!("Completed successfully");
}
