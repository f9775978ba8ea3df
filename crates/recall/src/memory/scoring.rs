//! Feedback score propagation
//!
//! A single feedback score is spread backward across a trailing window of
//! action records with geometric decay. Scores are sticky: a slot that
//! already carries a score is left untouched (and does not consume a decay
//! step) unless the caller forces the write.

use tracing::debug;

use crate::config::ScoringConfig;
use crate::error::Result;
use crate::memory::table::MemoryTable;
use crate::memory::types::{RecordId, Value};
use crate::memory::values::ValueStore;

/// Tables and stores a score application reads and writes
pub struct ScoringTables<'a> {
    pub actions: &'a MemoryTable,
    pub contexts: &'a MemoryTable,
    pub action_scores: &'a mut ValueStore,
    pub advice_refs: &'a ValueStore,
    pub advice_scores: &'a mut ValueStore,
}

/// Which slots one `apply_scores` call wrote
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreReport {
    /// Actions that received a score, most recent first
    pub actions: Vec<(RecordId, f64)>,
    /// Actions skipped because they were already scored
    pub skipped: Vec<RecordId>,
    /// Advice whose score was set to the raw input, if any
    pub advice: Option<RecordId>,
}

#[derive(Debug, Clone)]
pub struct ScoreOrchestrator {
    decay: f64,
}

impl Default for ScoreOrchestrator {
    fn default() -> Self {
        Self::new(&ScoringConfig::default())
    }
}

impl ScoreOrchestrator {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            decay: config.decay,
        }
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    /// Apply `score` to the `num_back` actions preceding the `start_back`
    /// most recent ones, then set the score of the newest advice attached to
    /// a context in the same window.
    pub fn apply_scores(
        &self,
        tables: ScoringTables<'_>,
        start_back: usize,
        num_back: usize,
        score: f64,
        force: bool,
    ) -> Result<ScoreReport> {
        let mut report = ScoreReport::default();

        let mut current = score;
        for action_id in tables.actions.in_sequence_window(num_back, start_back) {
            if tables
                .action_scores
                .write(action_id, Value::Float(current), force)?
            {
                report.actions.push((action_id, current));
                current *= self.decay;
            } else {
                report.skipped.push(action_id);
            }
        }

        for context_id in tables.contexts.in_sequence_window(num_back, start_back) {
            if let Some(advice_id) = tables.advice_refs.get_val(context_id).as_reference() {
                tables
                    .advice_scores
                    .set_val(advice_id, Value::Float(score))?;
                report.advice = Some(advice_id);
                break;
            }
        }

        debug!(
            "Applied score {} (force={}): {} actions scored, {} skipped, advice {:?}",
            score,
            force,
            report.actions.len(),
            report.skipped.len(),
            report.advice
        );

        Ok(report)
    }
}
