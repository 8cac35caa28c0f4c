use std::path::PathBuf;

use crate::app::{AppContext, Result};
use crate::config::Config;
use crate::domain::RetrievalRequest;
use crate::resolver::LocatorResolver;

/// Flags of `magpie grab` that override the config file.
#[derive(Debug, Default)]
pub struct GrabOverrides {
    pub output_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub urls: Option<PathBuf>,
}

impl GrabOverrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output.dir = Some(dir.clone());
        }
        if let Some(concurrency) = self.concurrency {
            config.fetch.max_concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout_secs {
            config.fetch.timeout_secs = timeout;
        }
    }
}

pub async fn grab(
    mut config: Config,
    query: &str,
    limit: Option<usize>,
    overrides: GrabOverrides,
) -> Result<()> {
    overrides.apply(&mut config);
    let limit = limit.unwrap_or(config.search.default_limit);

    let mut ctx = AppContext::new(config)?;
    if let Some(path) = overrides.urls {
        ctx = ctx.with_locator_file(path);
    }

    let archive = ctx.harvester().scrape_and_zip(query, limit).await?;

    println!(
        "Saved {} images to {}",
        archive.len(),
        archive.path.display()
    );
    Ok(())
}

pub async fn search(config: Config, query: &str, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(config.search.default_limit);
    let request = RetrievalRequest::new(
        query,
        limit,
        config.search.min_limit..=config.search.max_limit,
    )?;
    let ctx = AppContext::new(config)?;

    let locators = ctx
        .resolver
        .resolve(request.query(), request.limit())
        .await?;

    if locators.is_empty() {
        println!("No images found for '{}'", query);
        return Ok(());
    }

    for locator in locators {
        println!("{}", locator);
    }
    Ok(())
}

pub fn show_config(config: &Config, path: Option<PathBuf>) {
    match path.or_else(|| Config::default_config_path().ok()) {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none)"),
    }

    println!("  timeout:         {}s", config.fetch.timeout_secs);
    println!("  max concurrency: {}", config.fetch.max_concurrency);
    println!("  user agent:      {}", config.fetch.user_agent);
    println!("  region:          {}", config.search.region);
    println!("  safesearch:      {:?}", config.search.safesearch);
    println!(
        "  limit:           {} (range {}..={})",
        config.search.default_limit, config.search.min_limit, config.search.max_limit
    );
    println!("  output dir:      {}", config.output_dir().display());
    println!("  staging dir:     {}", config.staging_dir().display());
}
