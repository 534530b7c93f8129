use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};
use utils::errors::{CONFIG_OVERRIDE_INVALID, CONFIG_PARSE_FAILED, LABELLER_CONFIG_NOT_FOUND};

pub const DEFAULT_CONFIG_PATH: &str = "configs/config.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LabellerConfig {
    /// Tokens per emitted record.
    pub max_sentence_length: usize,
    /// Label names, addressed by index on the command line.
    pub output_labels: Vec<String>,
    pub datasets_dir: PathBuf,
}

impl Default for LabellerConfig {
    fn default() -> Self {
        Self {
            max_sentence_length: 59,
            output_labels: Vec::new(),
            datasets_dir: PathBuf::from("datasets"),
        }
    }
}

pub fn load() -> Result<LabellerConfig> {
    let path =
        env::var("LABELLER_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_from(Path::new(&path))
}

pub fn load_from(path: &Path) -> Result<LabellerConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("{LABELLER_CONFIG_NOT_FOUND}: {}", path.display()))?;
    let mut config: LabellerConfig = serde_json::from_str(&contents)
        .with_context(|| format!("{CONFIG_PARSE_FAILED}: {}", path.display()))?;

    apply_env_overrides(&mut config);

    info!(
        max_sentence_length = config.max_sentence_length,
        output_labels = ?config.output_labels,
        "Labeller config loaded"
    );

    Ok(config)
}

fn apply_env_overrides(config: &mut LabellerConfig) {
    if let Ok(value) = env::var("LABELLER_MAX_SENTENCE_LENGTH") {
        match value.parse::<usize>() {
            Ok(length) if length > 0 => config.max_sentence_length = length,
            Ok(_) => warn!(
                value = %value,
                "{}: LABELLER_MAX_SENTENCE_LENGTH must be positive",
                CONFIG_OVERRIDE_INVALID
            ),
            Err(err) => warn!(
                error = %err,
                "{}: LABELLER_MAX_SENTENCE_LENGTH",
                CONFIG_OVERRIDE_INVALID
            ),
        }
    }

    if let Ok(value) = env::var("LABELLER_DATASETS_DIR") {
        config.datasets_dir = PathBuf::from(value);
    }
}
