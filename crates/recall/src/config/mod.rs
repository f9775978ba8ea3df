use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{RecallError, Result};

/// Main configuration structure for Recall
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Where run logs live
    #[serde(default)]
    pub storage: StorageConfig,
    /// Hint retrieval policy
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Feedback score propagation
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Per-cycle agent driver
    #[serde(default)]
    pub agent: AgentConfig,
    /// Diff summarization collaborator
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl Config {
    /// Load configuration from `path`, or from the first default location
    /// that exists, falling back to built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            tracing::info!("Loading config from: {}", path.display());
            return Self::from_file(path);
        }

        let default_paths = [
            dirs::home_dir().map(|h| h.join(".recall").join("config.toml")),
            dirs::config_dir().map(|c| c.join("recall").join("config.toml")),
            Some(PathBuf::from("config.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RecallError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content)
            .map_err(|e| RecallError::Config(format!("Failed to parse config: {e}")))
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for all run logs
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Persist runs to disk (false keeps everything in memory)
    #[serde(default = "default_persist")]
    pub persist: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            persist: default_persist(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".recall"))
        .unwrap_or_else(|| PathBuf::from(".recall"))
}

fn default_persist() -> bool {
    true
}

/// Retrieval policy configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Most similar past contexts considered per hint
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    /// Added to the rank before taking the reciprocal, so rank 0 vs 1 weighs
    /// 1/5 vs 1/6 instead of 1/1 vs 1/2
    #[serde(default = "default_recip_mitigator")]
    pub recip_mitigator: f64,
    /// How far (in contexts) to look around a candidate for advice
    #[serde(default = "default_advice_radius")]
    pub advice_radius: usize,
    /// Width of the symmetric jitter added to weighted scores
    #[serde(default = "default_tightness")]
    pub tightness: f64,
    /// Probability of trying the advice path before the action path
    #[serde(default = "default_advice_probability")]
    pub advice_probability: f64,
    /// Minimum weighted advice score for a pick to be used
    #[serde(default)]
    pub min_advice_score: Option<f64>,
    /// Minimum weighted action score for a pick to be used
    #[serde(default)]
    pub min_action_score: Option<f64>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_candidates: default_max_candidates(),
            recip_mitigator: default_recip_mitigator(),
            advice_radius: default_advice_radius(),
            tightness: default_tightness(),
            advice_probability: default_advice_probability(),
            min_advice_score: None,
            min_action_score: None,
        }
    }
}

fn default_max_candidates() -> usize {
    10
}

fn default_recip_mitigator() -> f64 {
    5.0
}

fn default_advice_radius() -> usize {
    5
}

fn default_tightness() -> f64 {
    0.1
}

fn default_advice_probability() -> f64 {
    0.5
}

/// Feedback scoring configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScoringConfig {
    /// Multiplier applied to the score after each written slot
    #[serde(default = "default_decay")]
    pub decay: f64,
    /// Actions reached by a plain score command
    #[serde(default = "default_feedback_window")]
    pub feedback_window: usize,
    /// Lowest accepted human score
    #[serde(default = "default_min_score")]
    pub min_score: i64,
    /// Highest accepted human score
    #[serde(default = "default_max_score")]
    pub max_score: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            decay: default_decay(),
            feedback_window: default_feedback_window(),
            min_score: default_min_score(),
            max_score: default_max_score(),
        }
    }
}

fn default_decay() -> f64 {
    0.8
}

fn default_feedback_window() -> usize {
    10
}

fn default_min_score() -> i64 {
    -10
}

fn default_max_score() -> i64 {
    10
}

/// Agent cycle configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// Contexts that must exist before hints are produced
    #[serde(default = "default_min_contexts_for_hint")]
    pub min_contexts_for_hint: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            min_contexts_for_hint: default_min_contexts_for_hint(),
        }
    }
}

fn default_min_contexts_for_hint() -> usize {
    4
}

/// Remote diff summarizer configuration (OpenAI-compatible API)
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizerConfig {
    /// API base URL, e.g. "https://api.openai.com/v1"
    #[serde(default)]
    pub api_url: String,
    /// Environment variable name for API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Model identifier for remote API
    #[serde(default = "default_summarizer_model")]
    pub model: String,
    /// Request timeout in seconds
    #[serde(default = "default_summarizer_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key_env: default_api_key_env(),
            model: default_summarizer_model(),
            timeout_secs: default_summarizer_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "RECALL_API_KEY".to_string()
}

fn default_summarizer_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_summarizer_timeout_secs() -> u64 {
    30
}

/// Embedding model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// fastembed model name
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
        }
    }
}

fn default_embedding_model() -> String {
    "multilingual-e5-small".to_string()
}
