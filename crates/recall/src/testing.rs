//! Test utilities for recall - deterministic collaborators
//!
//! Everything here is cheap and reproducible:
//! - `MockEmbeddingModel` hashes text into a fixed-size vector
//! - `StaticSummarizer` answers every diff request with the same text
//! - `FailingSummarizer` always errors, exercising the fallback phrase

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::embedding::{EMBEDDING_DIMENSION, Embedder};
use crate::error::Result;
use crate::summarizer::{DiffSummarizer, SummarizerError};

/// Mock embedding model for tests that don't need real ML.
/// Produces deterministic 384-dimensional vectors based on input text hash.
#[derive(Debug, Clone, Default)]
pub struct MockEmbeddingModel;

impl MockEmbeddingModel {
    pub fn new() -> Self {
        Self
    }

    /// Deterministic pseudo-embedding in [-1, 1]
    pub fn vector(text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();

        (0..EMBEDDING_DIMENSION)
            .map(|i| {
                let x = seed
                    .wrapping_mul(i as u64 + 1)
                    .wrapping_add(0x9e3779b97f4a7c15);
                let normalized = (x as f32) / (u64::MAX as f32);
                (normalized * 2.0) - 1.0
            })
            .collect()
    }
}

impl Embedder for MockEmbeddingModel {
    fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector(text))
    }
}

/// Replies to every diff request with the same text and records the last
/// user prompt it saw
#[derive(Debug, Default)]
pub struct StaticSummarizer {
    reply: String,
    calls: AtomicUsize,
    last_user_prompt: Mutex<Option<String>>,
}

impl StaticSummarizer {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_user_prompt(&self) -> Option<String> {
        self.last_user_prompt
            .lock()
            .ok()
            .and_then(|prompt| prompt.clone())
    }
}

#[async_trait]
impl DiffSummarizer for StaticSummarizer {
    async fn summarize_diff(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
    ) -> std::result::Result<String, SummarizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_user_prompt.lock() {
            *last = Some(user_prompt.to_string());
        }
        Ok(self.reply.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Always fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSummarizer;

#[async_trait]
impl DiffSummarizer for FailingSummarizer {
    async fn summarize_diff(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
    ) -> std::result::Result<String, SummarizerError> {
        Err(SummarizerError::ApiError("summarizer unavailable".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}
