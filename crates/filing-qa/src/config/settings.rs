use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::utils::error::QaError;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub edgar: EdgarConfig,
    pub qa: QaConfig,
    pub embedding: EmbeddingConfig,
    pub context: ContextConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct EdgarConfig {
    /// SEC rejects anonymous clients; this must carry contact details.
    pub user_agent: String,
    pub tickers_url: String,
    pub submissions_url: String,
    pub archives_url: String,
    pub primary_form: String,
    pub fallback_form: String,
    pub min_request_interval_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for EdgarConfig {
    fn default() -> Self {
        Self {
            user_agent: "FilingQa/0.1 (contact@example.com)".to_string(),
            tickers_url: "https://www.sec.gov/files/company_tickers.json".to_string(),
            submissions_url: "https://data.sec.gov/submissions".to_string(),
            archives_url: "https://www.sec.gov/Archives/edgar/data".to_string(),
            primary_form: "10-K".to_string(),
            fallback_form: "10-Q".to_string(),
            min_request_interval_ms: 150,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct QaConfig {
    pub base_url: String,
    pub model: String,
    pub api_token: Option<String>,
    pub timeout_seconds: u64,
    /// Character-window size handed to the QA model.
    pub window_size: usize,
    /// Distance between consecutive window starts.
    pub stride: usize,
    pub confidence_threshold: f32,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8090".to_string(),
            model: "distilbert-base-uncased-distilled-squad".to_string(),
            api_token: None,
            timeout_seconds: 60,
            window_size: 1000,
            stride: 500,
            confidence_threshold: 0.1,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub dimension: usize, // 384 for all-MiniLM-L6-v2
    pub timeout_seconds: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8081".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            dimension: 384,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ContextConfig {
    pub word_window: usize,
    pub word_overlap: usize,
    pub max_fallback_chars: usize,
    /// Attach the embedding client so routed context is narrowed to its
    /// best-matching word window before QA.
    pub semantic_ranking: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            word_window: 200,
            word_overlap: 50,
            max_fallback_chars: 50_000,
            semantic_ranking: false,
        }
    }
}

impl Settings {
    /// Loads `config/settings.{toml,yaml,json}` if present, then `APP_*` environment overrides.
    pub fn load() -> Result<Self, QaError> {
        Self::load_from(Path::new("config/settings"))
    }

    pub fn load_from(path: &Path) -> Result<Self, QaError> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name(&path.to_string_lossy()).required(false))
            // Example: APP_QA__CONFIDENCE_THRESHOLD=0.2
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), QaError> {
        if self.qa.window_size == 0 {
            return Err(QaError::ConfigError("qa.window_size must be positive".into()));
        }
        if self.qa.stride == 0 || self.qa.stride > self.qa.window_size {
            return Err(QaError::ConfigError(format!(
                "qa.stride must be within 1..={} (got {})",
                self.qa.window_size, self.qa.stride
            )));
        }
        if !(0.0..=1.0).contains(&self.qa.confidence_threshold) {
            return Err(QaError::ConfigError(format!(
                "qa.confidence_threshold must be within [0, 1] (got {})",
                self.qa.confidence_threshold
            )));
        }
        if self.context.word_window == 0 {
            return Err(QaError::ConfigError("context.word_window must be positive".into()));
        }
        if self.context.word_overlap >= self.context.word_window {
            return Err(QaError::ConfigError(format!(
                "context.word_overlap ({}) must be smaller than context.word_window ({})",
                self.context.word_overlap, self.context.word_window
            )));
        }
        if self.embedding.dimension == 0 {
            return Err(QaError::ConfigError("embedding.dimension must be positive".into()));
        }
        if self.edgar.user_agent.trim().is_empty() {
            return Err(QaError::ConfigError("edgar.user_agent must not be empty".into()));
        }

        Ok(())
    }
}
