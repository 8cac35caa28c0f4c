pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "magpie")]
#[command(about = "Search for images and download them as a zip archive", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/magpie/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search, download and zip images for a query
    Grab {
        /// Search term, e.g. "cute cats"
        query: String,

        /// Number of images to fetch
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Directory the archive is written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Maximum concurrent downloads
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Per-image timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Read image URLs from this file (one per line) instead of searching
        #[arg(long)]
        urls: Option<PathBuf>,
    },
    /// Print the image URLs a query resolves to, without downloading
    Search {
        /// Search term
        query: String,

        /// Number of URLs to list
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show the config file location and effective settings
    Config,
}
