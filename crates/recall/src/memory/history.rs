//! Read-only reconstruction of past cycles for display

use std::fmt;

use serde::Serialize;

use crate::memory::types::RecordId;

/// Everything recorded around one context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub context_id: RecordId,
    pub context: String,
    pub action: Option<String>,
    pub advice: Option<String>,
    pub hint: Option<String>,
    pub score: Option<f64>,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Context:\n{}", self.context)?;
        if let Some(action) = &self.action {
            writeln!(f, "LLM response:\n{action}")?;
        }
        if let Some(advice) = &self.advice {
            writeln!(f, "Advice applied:\n{advice}")?;
        }
        if let Some(hint) = &self.hint {
            writeln!(f, "Helpful hint added:\n{hint}")?;
        }
        if let Some(score) = self.score {
            write!(f, "Score for action:\n{score}")?;
        }
        Ok(())
    }
}
