//! # Magpie
//!
//! Search for images, download them concurrently, and hand back a single
//! zip archive.
//!
//! ## Architecture
//!
//! One batch runs as a pipeline:
//!
//! ```text
//! Resolver → ParallelFetcher → StagingScope → Archiver → <query>_images.zip
//! ```
//!
//! - [`resolver`]: turns a query into image URLs (DuckDuckGo, or a URL list)
//! - [`fetcher`]: HTTP download with a per-image timeout, fanned out under a
//!   concurrency bound
//! - [`staging`]: per-batch temporary directory, removed on every exit path
//! - [`archiver`]: zips the staged files in sorted order
//! - [`harvester`]: wires the above into `scrape_and_zip`
//!
//! ## Quick Start
//!
//! ```bash
//! # Download 50 images of cats into ./cute_cats_images.zip
//! magpie grab "cute cats" -n 50
//!
//! # Only list what the search returns
//! magpie search "cute cats" -n 20
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the fetcher,
/// the resolver and configuration.
pub mod app;

/// Zip assembly for a finished staging directory.
pub mod archiver;

/// Command-line interface using clap.
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/magpie/config.toml`.
pub mod config;

/// Core domain models: requests, fetched items, locators.
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for single-image retrieval
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelFetcher`](fetcher::parallel::ParallelFetcher): Concurrent fetching with semaphore
pub mod fetcher;

/// The end-to-end batch.
pub mod harvester;

/// Query to image URL lookup.
pub mod resolver;

/// Per-batch temporary storage.
pub mod staging;
