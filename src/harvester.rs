//! End-to-end batch: resolve, fetch, stage, archive, clean up.

use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::app::{MagpieError, Result};
use crate::archiver::{archive_path, Archive, Archiver};
use crate::domain::{RetrievalRequest, DEFAULT_MAX_LIMIT, DEFAULT_MIN_LIMIT};
use crate::fetcher::parallel::{ParallelFetcher, DEFAULT_WORKERS};
use crate::fetcher::Fetcher;
use crate::resolver::LocatorResolver;
use crate::staging::StagingScope;

#[derive(Debug, Clone)]
pub struct HarvestOptions {
    /// Directory archives are written to
    pub output_dir: PathBuf,
    /// Parent directory for per-batch staging scopes
    pub staging_parent: PathBuf,
    /// Upper bound on concurrent fetches for any batch
    pub max_concurrency: usize,
    /// Accepted range for the per-batch image limit
    pub limit_range: RangeInclusive<usize>,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            staging_parent: std::env::temp_dir(),
            max_concurrency: DEFAULT_WORKERS,
            limit_range: DEFAULT_MIN_LIMIT..=DEFAULT_MAX_LIMIT,
        }
    }
}

pub struct Harvester {
    resolver: Arc<dyn LocatorResolver + Send + Sync>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    options: HarvestOptions,
}

impl Harvester {
    pub fn new(
        resolver: Arc<dyn LocatorResolver + Send + Sync>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        options: HarvestOptions,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            options,
        }
    }

    pub fn options(&self) -> &HarvestOptions {
        &self.options
    }

    /// Run one batch for `query` and return the archive it produced.
    ///
    /// The staging scope is removed before this returns, whatever the
    /// outcome. The archive stays on disk.
    pub async fn scrape_and_zip(&self, query: &str, limit: usize) -> Result<Archive> {
        let request = RetrievalRequest::new(query, limit, self.options.limit_range.clone())?;

        let scope = StagingScope::create_in(&self.options.staging_parent)?;
        info!(
            "Downloading images for '{}' to '{}'...",
            request.query(),
            scope.root().display()
        );

        let outcome = self.run_batch(&request, &scope).await;

        if let Err(e) = scope.close() {
            warn!("Failed to remove staging scope: {}", e);
        }

        if let Err(e) = &outcome {
            tracing::error!("Batch for '{}' failed: {}", request.query(), e);
        }
        outcome
    }

    async fn run_batch(&self, request: &RetrievalRequest, scope: &StagingScope) -> Result<Archive> {
        let mut locators = self
            .resolver
            .resolve(request.query(), request.limit())
            .await?;
        locators.truncate(request.limit());

        info!("Found {} image URLs for '{}'", locators.len(), request.query());
        if locators.is_empty() {
            return Err(MagpieError::EmptyBatch {
                query: request.query().to_string(),
            });
        }

        let workers = request.limit().min(self.options.max_concurrency);
        let parallel = ParallelFetcher::with_workers(self.fetcher.clone(), workers);
        let report = parallel.fetch_all(locators, scope.writer()).await?;

        info!(
            "Downloaded {} images, {} failed",
            report.staged.len(),
            report.failed.len()
        );
        if report.is_empty() {
            return Err(MagpieError::EmptyBatch {
                query: request.query().to_string(),
            });
        }

        let staging_root = scope.root().to_path_buf();
        let target = archive_path(&self.options.output_dir, request.query());
        let archive = tokio::task::spawn_blocking(move || Archiver::build(&staging_root, &target))
            .await
            .map_err(|e| MagpieError::Internal(format!("Archive task failed: {}", e)))??;

        Ok(archive)
    }
}
