use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{info, warn};
use utils::errors::{
    CONFIG_OVERRIDE_INVALID, CONFIG_PARSE_FAILED, CONFIG_READ_FAILED, READER_CONFIG_NOT_FOUND,
};

pub const DEFAULT_CONFIG_PATH: &str = "configs/reader.json";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ReaderConfig {
    /// Category name -> source identifiers written to that category's file.
    pub categories: BTreeMap<String, Vec<String>>,
    /// Finished category files are copied here after a run, when set.
    pub copy_destination: Option<PathBuf>,
    pub api: ApiConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_agent: String,
    pub page_size: u32,
    pub request_delay_ms: u64,
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            user_agent: "DSTK-MultiRedditReader/0.1".to_string(),
            page_size: 100,
            request_delay_ms: 100,
            max_retries: 0,
            initial_backoff_ms: 2_000,
        }
    }
}

impl ApiConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub datasets_dir: PathBuf,
    pub checkpoints_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            datasets_dir: PathBuf::from("datasets"),
            checkpoints_dir: PathBuf::from("checkpoints"),
        }
    }
}

impl PathsConfig {
    pub fn category_file(&self, category: &str) -> PathBuf {
        self.datasets_dir.join(format!("{category}.txt"))
    }
}

/// Loads the config named by `READER_CONFIG_PATH`, or the default path.
pub fn load() -> Result<ReaderConfig> {
    let path = env::var("READER_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_from(Path::new(&path))
}

pub fn load_from(path: &Path) -> Result<ReaderConfig> {
    let mut config = match fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str::<ReaderConfig>(&contents)
            .with_context(|| format!("{CONFIG_PARSE_FAILED}: {}", path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "{}", READER_CONFIG_NOT_FOUND);
            ReaderConfig::default()
        }
        Err(err) => {
            return Err(err).with_context(|| format!("{CONFIG_READ_FAILED}: {}", path.display()));
        }
    };

    apply_env_overrides(&mut config);

    if config.categories.is_empty() {
        warn!(path = %path.display(), "No categories configured, nothing will be fetched");
    }

    info!(
        categories = config.categories.len(),
        sources = config.categories.values().map(Vec::len).sum::<usize>(),
        base_url = %config.api.base_url,
        page_size = config.api.page_size,
        "Reader config loaded"
    );

    Ok(config)
}

fn apply_env_overrides(config: &mut ReaderConfig) {
    if let Ok(value) = env::var("READER_BASE_URL") {
        config.api.base_url = value.trim_end_matches('/').to_string();
    }

    if let Ok(value) = env::var("READER_DATASETS_DIR") {
        config.paths.datasets_dir = PathBuf::from(value);
    }

    if let Ok(value) = env::var("READER_PAGE_SIZE") {
        match value.parse::<u32>() {
            Ok(page_size) if page_size > 0 => config.api.page_size = page_size,
            Ok(_) => warn!(value = %value, "{}: READER_PAGE_SIZE must be positive", CONFIG_OVERRIDE_INVALID),
            Err(err) => warn!(error = %err, "{}: READER_PAGE_SIZE", CONFIG_OVERRIDE_INVALID),
        }
    }
}
