pub mod http_fetcher;
pub mod parallel;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::FetchedImage;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a single locator could not be retrieved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The attempt did not finish within the per-request timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Non-2xx status or any transport-level failure
    #[error("{0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Transport,
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Timeout(_) => FetchErrorKind::Timeout,
            FetchError::Transport(_) => FetchErrorKind::Transport,
        }
    }
}

/// Retrieves one image. Implementations must not touch the staging area.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, locator: &str) -> Result<FetchedImage, FetchError>;
}
