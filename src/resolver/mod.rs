pub mod duckduckgo;
pub mod file;

pub use duckduckgo::{DuckDuckGoResolver, SafeSearch};
pub use file::FileResolver;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Locator;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search returned HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("could not find a search token in the response")]
    MissingToken,

    #[error("malformed search response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid search URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to read locator list {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// Turns a query into image locators, in ranked order.
///
/// Implementations return at most `limit` locators and may return fewer.
/// An empty result is not an error; a failing lookup is.
#[async_trait]
pub trait LocatorResolver {
    async fn resolve(&self, query: &str, limit: usize) -> Result<Vec<Locator>, ResolveError>;
}
