//! Run configuration
//!
//! [`AppConfig`] holds persisted defaults read from the user's config directory.
//! [`RunConfig`] is the validated configuration for one invocation, assembled
//! from command line flags on top of those defaults.

use crate::crawl::links::normalize;
use crate::index::SearchMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

const APP_NAME: &str = "crawldex";
const CONFIG_FILE: &str = "config.json";

/// Errors that make a run impossible to start
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker thread count must be at least 1, got {0}")]
    InvalidThreads(usize),

    #[error("input path does not exist: {}", .0.display())]
    MissingPath(PathBuf),

    #[error("invalid seed URL {url:?}: {reason}")]
    InvalidSeed { url: String, reason: String },
}

/// Defaults stored in the platform config directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Worker threads used when `--threads` is given without a value
    #[serde(default = "default_threads")]
    pub default_threads: usize,

    /// Redirects a page fetch may follow before giving up
    #[serde(default = "default_fetch_retries")]
    pub fetch_retries: usize,

    /// User agent sent with every page request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_threads() -> usize {
    5
}

fn default_fetch_retries() -> usize {
    3
}

fn default_user_agent() -> String {
    format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_threads: default_threads(),
            fetch_retries: default_fetch_retries(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load config from the user's config directory, or return defaults if not found
    pub fn load() -> Result<Self> {
        match get_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file, or return defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

/// Path of the persisted config file, if the platform has a config directory
pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
}

/// Where to write each optional output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outputs {
    pub index: Option<PathBuf>,
    pub counts: Option<PathBuf>,
    pub results: Option<PathBuf>,
}

/// Validated configuration for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// File or directory of text files to index
    pub input: Option<PathBuf>,
    /// Normalized seed URL to crawl from
    pub seed: Option<Url>,
    /// Crawl budget: maximum number of distinct URLs to visit
    pub max_urls: usize,
    /// Worker count; `None` runs the sequential pipeline
    pub threads: Option<usize>,
    /// Query file, one query per line
    pub queries: Option<PathBuf>,
    pub mode: SearchMode,
    pub outputs: Outputs,
    pub app: AppConfig,
}

/// Unchecked values as they arrive from the command line
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub input: Option<PathBuf>,
    pub seed: Option<String>,
    pub max_urls: usize,
    /// `Some(None)` means the flag was given without a value
    pub threads: Option<Option<usize>>,
    pub queries: Option<PathBuf>,
    pub exact: bool,
    pub outputs: Outputs,
}

impl RunConfig {
    /// Check arguments against each other and fill in defaults
    pub fn resolve(args: RunArgs, app: AppConfig) -> Result<Self, ConfigError> {
        for path in [&args.input, &args.queries].into_iter().flatten() {
            if !path.exists() {
                return Err(ConfigError::MissingPath(path.clone()));
            }
        }

        let seed = args.seed.as_deref().map(parse_seed).transpose()?;

        // Crawling always runs on the worker pool
        let threads = match args.threads {
            Some(count) => Some(count.unwrap_or(app.default_threads)),
            None if seed.is_some() => Some(app.default_threads),
            None => None,
        };
        if let Some(count) = threads {
            if count == 0 {
                return Err(ConfigError::InvalidThreads(count));
            }
        }

        Ok(Self {
            input: args.input,
            seed,
            max_urls: args.max_urls,
            threads,
            queries: args.queries,
            mode: SearchMode::from_exact_flag(args.exact),
            outputs: args.outputs,
            app,
        })
    }

    pub fn is_threaded(&self) -> bool {
        self.threads.is_some()
    }
}

fn parse_seed(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidSeed {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    Ok(normalize(url))
}
