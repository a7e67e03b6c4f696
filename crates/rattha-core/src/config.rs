//! Pipeline configuration shared by every stage.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Bounded exponential backoff settings for one class of model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl RetrySettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root holding one page-image folder per edition.
    pub image_dir: PathBuf,
    /// Legacy transcription collection (JSON array of editions).
    pub legacy_json: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub clean_dir: PathBuf,
    pub final_dir: PathBuf,
    pub images_per_batch: usize,
    /// Batches extracted concurrently. Checkpoints are still written one at a time.
    pub extract_concurrency: usize,
    /// Substitute legacy wording at the batch stage (0.80 threshold).
    pub substitute_legacy: bool,
    pub extract_model: String,
    pub mapping_model: String,
    pub summary_model: String,
    pub extract_retry: RetrySettings,
    pub analysis_retry: RetrySettings,
    /// Upper bound on a single model HTTP call, connect to last byte.
    pub request_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("images_raw"),
            legacy_json: PathBuf::from("legacy_json").join("constitutions.json"),
            checkpoint_dir: PathBuf::from("."),
            clean_dir: PathBuf::from("json_output").join("clean"),
            final_dir: PathBuf::from("json_output").join("final"),
            images_per_batch: 3,
            extract_concurrency: 1,
            substitute_legacy: false,
            extract_model: "gemini-2.5-flash".to_string(),
            mapping_model: "gemma-3-27b-it".to_string(),
            summary_model: "gemini-2.5-flash".to_string(),
            extract_retry: RetrySettings {
                max_attempts: 5,
                base_delay_ms: 10_000,
            },
            analysis_retry: RetrySettings {
                max_attempts: 3,
                base_delay_ms: 2_000,
            },
            request_timeout_ms: 300_000,
        }
    }
}

impl PipelineConfig {
    /// Load a serialized config; absent fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images_per_batch == 0 {
            return Err(ConfigError::Invalid("images_per_batch must be at least 1".into()));
        }
        if self.extract_concurrency == 0 {
            return Err(ConfigError::Invalid("extract_concurrency must be at least 1".into()));
        }
        if self.extract_retry.max_attempts == 0 || self.analysis_retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("request_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// File locations for one edition.
    pub fn edition(&self, edition_id: &str) -> EditionPaths {
        EditionPaths {
            edition_id: edition_id.to_string(),
            image_dir: self.image_dir.join(edition_id),
            checkpoint: self.checkpoint_dir.join(format!("{edition_id}_checkpoint.json")),
            clean: self.clean_dir.join(format!("{edition_id}_clean.json")),
            final_sections: self.final_dir.join(format!("{edition_id}_final.json")),
            summary: self.final_dir.join(format!("{edition_id}_full_summary.json")),
        }
    }
}

/// Per-edition inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditionPaths {
    pub edition_id: String,
    pub image_dir: PathBuf,
    pub checkpoint: PathBuf,
    pub clean: PathBuf,
    pub final_sections: PathBuf,
    pub summary: PathBuf,
}

impl EditionPaths {
    /// Year encoded in the edition id (`con2560` → 2560), 0 if there are no digits.
    pub fn year(&self) -> u32 {
        edition_year(&self.edition_id)
    }
}

/// Integer formed by all digits of the edition id.
pub fn edition_year(edition_id: &str) -> u32 {
    let digits: String = edition_id.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
