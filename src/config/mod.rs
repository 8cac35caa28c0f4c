//! Configuration management for magpie.
//!
//! Configuration is read from `~/.config/magpie/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{DEFAULT_MAX_LIMIT, DEFAULT_MIN_LIMIT};
use crate::fetcher::http_fetcher::DEFAULT_USER_AGENT;
use crate::fetcher::parallel::DEFAULT_WORKERS;
use crate::fetcher::DEFAULT_TIMEOUT;
use crate::resolver::duckduckgo::DEFAULT_REGION;
use crate::resolver::SafeSearch;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub search: SearchConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-image timeout in seconds (default: 5)
    pub timeout_secs: u64,
    /// Maximum concurrent downloads per batch (default: 20)
    pub max_concurrency: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_concurrency: DEFAULT_WORKERS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub region: String,
    pub safesearch: SafeSearch,
    /// Number of images when none is given on the command line
    pub default_limit: usize,
    pub min_limit: usize,
    pub max_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            safesearch: SafeSearch::Off,
            default_limit: 50,
            min_limit: DEFAULT_MIN_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where archives are written (default: current directory)
    pub dir: Option<PathBuf>,
    /// Parent of per-batch staging directories (default: system temp)
    pub staging_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path: `~/.config/magpie/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("magpie").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid("fetch.timeout_secs must be > 0".into()));
        }
        if self.fetch.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "fetch.max_concurrency must be > 0".into(),
            ));
        }
        if self.search.min_limit > self.search.max_limit {
            return Err(ConfigError::Invalid(format!(
                "search.min_limit ({}) is greater than search.max_limit ({})",
                self.search.min_limit, self.search.max_limit
            )));
        }
        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output.dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.output
            .staging_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# magpie configuration

[fetch]
# Seconds to wait for a single image before giving up on it
timeout_secs = 5

# Maximum number of images downloaded at the same time
max_concurrency = 20

user_agent = "magpie/0.1.0"

[search]
# DuckDuckGo region code
region = "wt-wt"

# off | moderate | on
safesearch = "off"

# Images per archive when --limit is not given
default_limit = 50

# Accepted range for --limit
min_limit = 10
max_limit = 200

[output]
# Directory archives are written to (default: current directory)
# dir = "."

# Parent directory for temporary staging (default: system temp directory)
# staging_dir = "/tmp"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
