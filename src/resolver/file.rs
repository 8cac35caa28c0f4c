use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::Locator;
use crate::resolver::{LocatorResolver, ResolveError};

/// Reads locators from a text file, one per line.
///
/// Blank lines and lines starting with `#` are skipped. The query is
/// ignored; it only names the archive.
pub struct FileResolver {
    path: PathBuf,
}

impl FileResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LocatorResolver for FileResolver {
    async fn resolve(&self, _query: &str, limit: usize) -> Result<Vec<Locator>, ResolveError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ResolveError::Io {
                path: self.path.clone(),
                source,
            })?;

        Ok(parse_locator_list(&content, limit))
    }
}

fn parse_locator_list(content: &str, limit: usize) -> Vec<Locator> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .take(limit)
        .map(String::from)
        .collect()
}
