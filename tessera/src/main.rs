//! Command line front end for inspecting and live reloading content directories
//!
//! Usage:
//!   tessera scan content/      # List every package manifest and whether it parses
//!   tessera order content/     # Print the dependency ordered load sequence
//!   tessera stats content/     # Load everything and report memory usage per asset type
//!   tessera watch content/     # Reload packages as their manifests change

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Inspect and hot reload content packages")]
struct Cli {
    /// Increase log verbosity, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// File name of package manifests
    #[arg(long, default_value = tessera_packages::source::DEFAULT_MANIFEST_NAME, global = true)]
    manifest_name: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every manifest below a directory and whether it parses
    Scan { directory: PathBuf },
    /// Print the order packages would be loaded in
    Order { directory: PathBuf },
    /// Load every package and asset, then report memory usage
    Stats { directory: PathBuf },
    /// Load a directory and reload packages whenever their manifest changes
    Watch {
        directory: PathBuf,
        /// Stage reloads on a worker thread
        #[arg(long)]
        background: bool,
        /// Milliseconds between frames
        #[arg(long, default_value_t = 250)]
        interval_ms: u64,
        /// Stop after this many frames, runs until interrupted otherwise
        #[arg(long)]
        frames: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let source = commands::source(&cli.manifest_name);
    match cli.command {
        Commands::Scan { directory } => commands::scan(source, &directory),
        Commands::Order { directory } => commands::order(source, &directory),
        Commands::Stats { directory } => commands::stats(source, &directory),
        Commands::Watch {
            directory,
            background,
            interval_ms,
            frames,
        } => commands::watch(source, &directory, background, interval_ms, frames),
    }
}
