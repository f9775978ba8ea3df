//! Diff summarizer trait
//!
//! Abstracts the text-generation backend that turns two line-diff buffers
//! into a short natural-language explanation.

use async_trait::async_trait;

use crate::error::RecallError;

/// Errors from a summarizer backend
#[derive(Debug, thiserror::Error)]
pub enum SummarizerError {
    /// Remote call failed or returned a non-success status
    #[error("API error: {0}")]
    ApiError(String),

    /// Reply could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<SummarizerError> for RecallError {
    fn from(e: SummarizerError) -> Self {
        RecallError::Summarizer(e.to_string())
    }
}

#[async_trait]
pub trait DiffSummarizer: Send + Sync {
    /// Send one system/user prompt pair and return the reply text
    async fn summarize_diff(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, SummarizerError>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
