use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::app::{MagpieError, Result};
use crate::domain::{Locator, RetrievedItem};
use crate::fetcher::{FetchError, Fetcher};
use crate::staging::StagingWriter;

pub const DEFAULT_WORKERS: usize = 20;

/// An item written into the staging area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedItem {
    pub index: usize,
    pub path: PathBuf,
}

/// A locator that could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedLocator {
    pub index: usize,
    pub locator: Locator,
    pub error: FetchError,
}

/// Outcome of one batch of fetches, both lists in locator order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub staged: Vec<StagedItem>,
    pub failed: Vec<FailedLocator>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}

enum ItemOutcome {
    Staged(StagedItem),
    Failed(FailedLocator),
}

pub struct ParallelFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    semaphore: Arc<Semaphore>,
    workers: usize,
}

impl ParallelFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_workers(fetcher, DEFAULT_WORKERS)
    }

    pub fn with_workers(fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Fetch every locator and stage the successes.
    ///
    /// Each locator keeps its position in `locators` as its index. All tasks
    /// run to completion; a failed fetch is recorded and never stops the
    /// others. A staging write failure or a panicked task is returned as an
    /// error once every task has finished. Dropping the returned future
    /// aborts any fetches still running.
    pub async fn fetch_all(
        &self,
        locators: Vec<Locator>,
        writer: StagingWriter,
    ) -> Result<BatchReport> {
        let mut tasks = JoinSet::new();

        for (index, locator) in locators.into_iter().enumerate() {
            let fetcher = self.fetcher.clone();
            let semaphore = self.semaphore.clone();
            let writer = writer.clone();

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| MagpieError::Internal(format!("Semaphore closed: {}", e)))?;

                fetch_single_image(&fetcher, index, locator, &writer).await
            });
        }

        let mut report = BatchReport::default();
        let mut first_error = None;

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Task join error: {}", e);
                    Err(MagpieError::Internal(format!("Fetch task failed: {}", e)))
                }
            };

            match outcome {
                Ok(ItemOutcome::Staged(item)) => report.staged.push(item),
                Ok(ItemOutcome::Failed(failure)) => report.failed.push(failure),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        // Completion order is arbitrary; report in locator order.
        report.staged.sort_by_key(|item| item.index);
        report.failed.sort_by_key(|failure| failure.index);

        if let Some(e) = first_error {
            return Err(e);
        }

        Ok(report)
    }
}

async fn fetch_single_image(
    fetcher: &Arc<dyn Fetcher + Send + Sync>,
    index: usize,
    locator: Locator,
    writer: &StagingWriter,
) -> Result<ItemOutcome> {
    match fetcher.fetch(&locator).await {
        Ok(image) => {
            let item = RetrievedItem::new(index, image);
            let path = writer.write(&item).await?;
            tracing::debug!("Staged {} ({} bytes)", path.display(), item.bytes.len());
            Ok(ItemOutcome::Staged(StagedItem { index, path }))
        }
        Err(error) => {
            tracing::warn!("Could not download image {}: {}", locator, error);
            Ok(ItemOutcome::Failed(FailedLocator {
                index,
                locator,
                error,
            }))
        }
    }
}
