//! Per-run memory session
//!
//! A `MemorySession` owns every table and store of one run and is passed
//! explicitly to whoever needs it. All stores share the session's [`RunId`].

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::error::{RecallError, Result};
use crate::memory::history::HistoryEntry;
use crate::memory::scoring::{ScoreOrchestrator, ScoreReport, ScoringTables};
use crate::memory::table::MemoryTable;
use crate::memory::types::{RecordId, RunId, Value, ValueKind};
use crate::memory::values::ValueStore;
use crate::storage::{RUNS_DIR, run_dir};

const CONTEXTS: &str = "contexts";
const ACTIONS: &str = "actions";
const ADVICE: &str = "advice";
const RESPONSE_REFS: &str = "response_refs";
const ACTION_SCORES: &str = "action_scores";
const ADVICE_REFS: &str = "advice_refs";
const ADVICE_SCORES: &str = "advice_scores";
const ADVICE_SOURCE: &str = "advice_source";
const HELPFUL_HINTS: &str = "helpful_hints";
const HINT_REFS: &str = "hint_refs";

/// Source tag for advice re-stored by retrieval
pub const RETRIEVED_ADVICE_SOURCE: &str = "_retrieved";

/// Source tag for advice typed by the user
pub const USER_ADVICE_SOURCE: &str = "user";

/// Record counts for one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub run: RunId,
    pub contexts: usize,
    pub actions: usize,
    pub advice: usize,
    pub scored_actions: usize,
    pub hints: usize,
}

#[derive(Debug)]
pub struct MemorySession {
    run: RunId,
    contexts: MemoryTable,
    actions: MemoryTable,
    advice: MemoryTable,
    /// context -> action answering it
    response_refs: ValueStore,
    action_scores: ValueStore,
    /// context -> advice received while it was current
    advice_refs: ValueStore,
    advice_scores: ValueStore,
    advice_source: ValueStore,
    /// context -> hint text injected for it
    helpful_hints: ValueStore,
    /// context -> action the hint was built from
    hint_refs: ValueStore,
    orchestrator: ScoreOrchestrator,
}

impl MemorySession {
    /// Create a session that keeps everything in memory
    pub fn in_memory(run: RunId) -> Self {
        Self {
            run,
            contexts: MemoryTable::in_memory(run, CONTEXTS),
            actions: MemoryTable::in_memory(run, ACTIONS),
            advice: MemoryTable::in_memory(run, ADVICE),
            response_refs: ValueStore::in_memory(run, RESPONSE_REFS, ValueKind::Reference),
            action_scores: ValueStore::in_memory(run, ACTION_SCORES, ValueKind::Float),
            advice_refs: ValueStore::in_memory(run, ADVICE_REFS, ValueKind::Reference),
            advice_scores: ValueStore::in_memory(run, ADVICE_SCORES, ValueKind::Float),
            advice_source: ValueStore::in_memory(run, ADVICE_SOURCE, ValueKind::String),
            helpful_hints: ValueStore::in_memory(run, HELPFUL_HINTS, ValueKind::String),
            hint_refs: ValueStore::in_memory(run, HINT_REFS, ValueKind::Reference),
            orchestrator: ScoreOrchestrator::default(),
        }
    }

    /// Open (or start) the persisted run `run` under `data_dir`
    pub fn open(data_dir: &Path, run: RunId) -> Result<Self> {
        let session = Self {
            run,
            contexts: MemoryTable::open(data_dir, run, CONTEXTS)?,
            actions: MemoryTable::open(data_dir, run, ACTIONS)?,
            advice: MemoryTable::open(data_dir, run, ADVICE)?,
            response_refs: ValueStore::open(data_dir, run, RESPONSE_REFS, ValueKind::Reference)?,
            action_scores: ValueStore::open(data_dir, run, ACTION_SCORES, ValueKind::Float)?,
            advice_refs: ValueStore::open(data_dir, run, ADVICE_REFS, ValueKind::Reference)?,
            advice_scores: ValueStore::open(data_dir, run, ADVICE_SCORES, ValueKind::Float)?,
            advice_source: ValueStore::open(data_dir, run, ADVICE_SOURCE, ValueKind::String)?,
            helpful_hints: ValueStore::open(data_dir, run, HELPFUL_HINTS, ValueKind::String)?,
            hint_refs: ValueStore::open(data_dir, run, HINT_REFS, ValueKind::Reference)?,
            orchestrator: ScoreOrchestrator::default(),
        };

        info!(
            "Opened run {} at {} ({} contexts, {} actions, {} advice)",
            run,
            run_dir(data_dir, run).display(),
            session.contexts.count(),
            session.actions.count(),
            session.advice.count()
        );

        Ok(session)
    }

    /// Session for `run` as the storage config asks: persisted under
    /// `data_dir`, or purely in memory when `persist` is off
    pub fn from_config(storage: &StorageConfig, run: RunId) -> Result<Self> {
        if storage.persist {
            Self::open(&storage.data_dir, run)
        } else {
            debug!("Run {} kept in memory only", run);
            Ok(Self::in_memory(run))
        }
    }

    /// Use a custom score orchestrator (e.g. a different decay)
    pub fn with_orchestrator(mut self, orchestrator: ScoreOrchestrator) -> Self {
        self.orchestrator = orchestrator;
        self
    }

    /// Runs persisted under `data_dir`, oldest first
    pub fn list_runs(data_dir: &Path) -> Result<Vec<RunId>> {
        let runs_dir = data_dir.join(RUNS_DIR);
        if !runs_dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in std::fs::read_dir(&runs_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(run) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<i64>().ok())
            {
                runs.push(RunId(run));
            }
        }
        runs.sort();
        Ok(runs)
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn contexts(&self) -> &MemoryTable {
        &self.contexts
    }

    pub fn actions(&self) -> &MemoryTable {
        &self.actions
    }

    pub fn advice(&self) -> &MemoryTable {
        &self.advice
    }

    fn last_context(&self) -> Result<RecordId> {
        self.contexts.last_id().ok_or_else(|| {
            RecallError::Precondition("no context has been recorded in this run".to_string())
        })
    }

    /// Append a freshly embedded context
    pub fn record_context(&mut self, text: &str, embedding: Vec<f32>) -> Result<RecordId> {
        let id = self.contexts.append(text, Some(embedding))?;
        debug!("Recorded context {}", id);
        Ok(id)
    }

    /// Append the agent's response to the last context; its score starts
    /// out Absent
    pub fn record_action(&mut self, text: &str) -> Result<RecordId> {
        let context_id = self.last_context()?;
        let action_id = self.actions.append(text, None)?;
        self.response_refs
            .add_at(context_id, Value::Reference(action_id))?;
        self.action_scores.add_at(action_id, Value::Absent)?;
        debug!("Recorded action {} for context {}", action_id, context_id);
        Ok(action_id)
    }

    /// Append advice against the last context; its score starts out at 0
    pub fn store_advice(&mut self, text: &str, source: &str) -> Result<RecordId> {
        let context_id = self.last_context()?;
        let advice_id = self.advice.append(text, None)?;
        self.advice_refs
            .add_at(context_id, Value::Reference(advice_id))?;
        self.advice_scores.add_at(advice_id, Value::Float(0.0))?;
        self.advice_source.add_at(advice_id, Value::from(source))?;
        debug!(
            "Stored advice {} from '{}' for context {}",
            advice_id, source, context_id
        );
        Ok(advice_id)
    }

    /// Persist the hint handed out for the last context together with the
    /// action it was built from
    pub fn record_helpful_hint(
        &mut self,
        action_id: RecordId,
        action_text: &str,
        diff_summary: &str,
    ) -> Result<RecordId> {
        let context_id = self.last_context()?;
        let hint = format!("Best action: {action_text}\n Diff summary: {diff_summary}");
        self.helpful_hints.add_at(context_id, Value::String(hint))?;
        self.hint_refs
            .add_at(context_id, Value::Reference(action_id))?;
        Ok(context_id)
    }

    /// Spread `score` over a trailing window of actions; see
    /// [`ScoreOrchestrator::apply_scores`]
    pub fn apply_scores(
        &mut self,
        start_back: usize,
        num_back: usize,
        score: f64,
        force: bool,
    ) -> Result<ScoreReport> {
        let tables = ScoringTables {
            actions: &self.actions,
            contexts: &self.contexts,
            action_scores: &mut self.action_scores,
            advice_refs: &self.advice_refs,
            advice_scores: &mut self.advice_scores,
        };
        self.orchestrator
            .apply_scores(tables, start_back, num_back, score, force)
    }

    pub fn action_for(&self, context_id: RecordId) -> Option<RecordId> {
        self.response_refs.get_val(context_id).as_reference()
    }

    pub fn advice_for(&self, context_id: RecordId) -> Option<RecordId> {
        self.advice_refs.get_val(context_id).as_reference()
    }

    pub fn action_score(&self, action_id: RecordId) -> Value {
        self.action_scores.get_val(action_id)
    }

    pub fn advice_score(&self, advice_id: RecordId) -> Value {
        self.advice_scores.get_val(advice_id)
    }

    pub fn advice_source(&self, advice_id: RecordId) -> Option<String> {
        self.advice_source
            .get_val(advice_id)
            .as_str()
            .map(str::to_string)
    }

    pub fn helpful_hint(&self, context_id: RecordId) -> Option<String> {
        self.helpful_hints
            .get_val(context_id)
            .as_str()
            .map(str::to_string)
    }

    pub fn hint_action(&self, context_id: RecordId) -> Option<RecordId> {
        self.hint_refs.get_val(context_id).as_reference()
    }

    /// What happened `num_back` cycles before the last context
    pub fn history(&self, num_back: usize) -> Option<HistoryEntry> {
        let context_id = self.contexts.in_sequence_window(1, num_back).first().copied()?;
        let context = self.contexts.get_text(context_id)?.to_string();

        let action_id = self.action_for(context_id);
        let action = action_id
            .and_then(|id| self.actions.get_text(id))
            .map(str::to_string);
        let score = action_id.and_then(|id| self.action_score(id).as_f64());
        let advice = self
            .advice_for(context_id)
            .and_then(|id| self.advice.get_text(id))
            .map(str::to_string);

        Some(HistoryEntry {
            context_id,
            context,
            action,
            advice,
            hint: self.helpful_hint(context_id),
            score,
        })
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            run: self.run,
            contexts: self.contexts.count(),
            actions: self.actions.count(),
            advice: self.advice.count(),
            scored_actions: self.action_scores.iter().count(),
            hints: self.helpful_hints.iter().count(),
        }
    }
}
