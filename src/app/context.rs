use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{MagpieError, Result};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::harvester::{HarvestOptions, Harvester};
use crate::resolver::{DuckDuckGoResolver, FileResolver, LocatorResolver};

pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub resolver: Arc<dyn LocatorResolver + Send + Sync>,
}

impl AppContext {
    /// Wire up the HTTP fetcher and DuckDuckGo image search from `config`.
    pub fn new(config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| MagpieError::Config(e.to_string()))?;

        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::with_options(
            config.fetch.timeout(),
            &config.fetch.user_agent,
        )?);

        let resolver = DuckDuckGoResolver::new(&config.fetch.user_agent)
            .map_err(|e| MagpieError::Internal(format!("Failed to build search client: {}", e)))?
            .with_region(config.search.region.clone())
            .with_safesearch(config.search.safesearch);

        Ok(Self {
            config,
            fetcher,
            resolver: Arc::new(resolver),
        })
    }

    /// Take locators from a file instead of the image search.
    pub fn with_locator_file(self, path: impl Into<PathBuf>) -> Self {
        Self {
            resolver: Arc::new(FileResolver::new(path)),
            ..self
        }
    }

    pub fn harvester(&self) -> Harvester {
        let options = HarvestOptions {
            output_dir: self.config.output_dir(),
            staging_parent: self.config.staging_dir(),
            max_concurrency: self.config.fetch.max_concurrency,
            limit_range: self.config.search.min_limit..=self.config.search.max_limit,
        };

        Harvester::new(self.resolver.clone(), self.fetcher.clone(), options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harvester_uses_config() {
        let mut config = Config::default();
        config.output.dir = Some(PathBuf::from("/srv/zips"));
        config.fetch.max_concurrency = 7;
        config.search.min_limit = 1;
        config.search.max_limit = 30;

        let ctx = AppContext::new(config).unwrap();
        let harvester = ctx.harvester();
        let options = harvester.options();

        assert_eq!(options.output_dir, PathBuf::from("/srv/zips"));
        assert_eq!(options.max_concurrency, 7);
        assert_eq!(options.limit_range, 1..=30);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.fetch.max_concurrency = 0;

        let err = AppContext::new(config).err().unwrap();
        assert_eq!(err.kind(), crate::app::ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_locator_file_replaces_search() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        std::fs::write(&path, "https://a.example/1.jpg\n").unwrap();

        let ctx = AppContext::new(Config::default())
            .unwrap()
            .with_locator_file(&path);
        let locators = ctx.resolver.resolve("anything", 10).await.unwrap();

        assert_eq!(locators, vec!["https://a.example/1.jpg"]);
    }
}
