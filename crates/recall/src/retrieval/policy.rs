//! Hint selection over past contexts
//!
//! Candidates are the contexts most similar to the current one. Each
//! candidate contributes the score of the advice or action attached to it,
//! weighted by `1 / (mitigator + rank)` and jittered by a small symmetric
//! noise term. The best weighted score wins.
//!
//! Ranking (`rank_advice`, `rank_action`) is read-only. The `retrieve_*`
//! methods and `create_hint` write to the session: retrieved advice is
//! stored again under the `_retrieved` source, and the action path records
//! a helpful-hint entry for the current context.

use tracing::{debug, info};

use crate::config::RetrievalConfig;
use crate::error::{RecallError, Result};
use crate::memory::session::{MemorySession, RETRIEVED_ADVICE_SOURCE};
use crate::memory::types::RecordId;
use crate::retrieval::noise::NoiseSource;
use crate::retrieval::prompts::{action_hint, advice_hint, diff_phrase};
use crate::summarizer::{DiffSummarizer, summarize_context_diff};

/// Which store a hint was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintPath {
    Advice,
    Action,
}

/// Hint text ready to be injected into the agent's next prompt
#[derive(Debug, Clone, PartialEq)]
pub struct Hint {
    pub path: HintPath,
    pub text: String,
}

/// Winner of a ranking pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedPick {
    /// Candidate context the pick came from
    pub context: RecordId,
    /// Advice or action record that won
    pub target: RecordId,
    /// Weighted, jittered score
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RetrievalPolicy {
    config: RetrievalConfig,
}

impl RetrievalPolicy {
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Past contexts most similar to the just-recorded one, best first
    pub fn candidates(&self, session: &MemorySession, embedding: &[f32]) -> Result<Vec<RecordId>> {
        let contexts = session.contexts();
        if contexts.count() <= 1 {
            return Err(RecallError::Precondition(format!(
                "hint creation needs more than one context, found {}",
                contexts.count()
            )));
        }
        let k = self.config.max_candidates.min(contexts.count() - 1);
        contexts.top_k(embedding, k)
    }

    fn weigh(&self, score: f64, rank: usize, noise: &mut dyn NoiseSource) -> f64 {
        let weighted = score / (self.config.recip_mitigator + rank as f64);
        let jitter = (noise.unit() - 0.5) * self.config.tightness;
        weighted + jitter
    }

    /// Nearest advice attached to a neighbour of `context_id` within
    /// `advice_radius`. Backward and forward neighbours alternate, nearest
    /// first; the context's own advice is not considered.
    pub fn find_closest_advice_ref(
        &self,
        session: &MemorySession,
        context_id: RecordId,
    ) -> Option<RecordId> {
        let radius = self.config.advice_radius;
        let backward = session.contexts().backward_neighbors(context_id, radius);
        let forward = session.contexts().forward_neighbors(context_id, radius);

        for i in 0..radius {
            let found = backward
                .get(i)
                .and_then(|id| session.advice_for(*id))
                .or_else(|| forward.get(i).and_then(|id| session.advice_for(*id)));
            if found.is_some() {
                return found;
            }
        }
        None
    }

    /// Best advice reachable from `candidates`, without touching the session
    pub fn rank_advice(
        &self,
        session: &MemorySession,
        candidates: &[RecordId],
        noise: &mut dyn NoiseSource,
    ) -> Option<RankedPick> {
        let mut best: Option<RankedPick> = None;

        for (rank, &context) in candidates.iter().enumerate() {
            let Some(advice) = self.find_closest_advice_ref(session, context) else {
                continue;
            };
            let base = session.advice_score(advice).as_f64().unwrap_or(0.0);
            let score = self.weigh(base, rank, noise);
            if best.is_none_or(|b| score > b.score) {
                best = Some(RankedPick {
                    context,
                    target: advice,
                    score,
                });
            }
        }

        best
    }

    /// Best action answering one of `candidates`, without touching the
    /// session. Unscored actions rank as 0.
    pub fn rank_action(
        &self,
        session: &MemorySession,
        candidates: &[RecordId],
        noise: &mut dyn NoiseSource,
    ) -> Option<RankedPick> {
        let mut best: Option<RankedPick> = None;

        for (rank, &context) in candidates.iter().enumerate() {
            let Some(action) = session.action_for(context) else {
                continue;
            };
            let base = session.action_score(action).as_f64().unwrap_or(0.0);
            let score = self.weigh(base, rank, noise);
            if best.is_none_or(|b| score > b.score) {
                best = Some(RankedPick {
                    context,
                    target: action,
                    score,
                });
            }
        }

        best
    }

    fn passes_floor(floor: Option<f64>, pick: &RankedPick) -> bool {
        floor.is_none_or(|floor| pick.score >= floor)
    }

    /// Advice hint from the best candidate; the chosen advice is stored
    /// again against the current context with source `_retrieved`
    pub fn retrieve_advice(
        &self,
        session: &mut MemorySession,
        candidates: &[RecordId],
        noise: &mut dyn NoiseSource,
    ) -> Result<Option<String>> {
        let Some(pick) = self.rank_advice(session, candidates, noise) else {
            return Ok(None);
        };
        if !Self::passes_floor(self.config.min_advice_score, &pick) {
            debug!("Best advice {} scored {:.3}, below floor", pick.target, pick.score);
            return Ok(None);
        }
        let Some(text) = session.advice().get_text(pick.target).map(str::to_string) else {
            return Ok(None);
        };

        session.store_advice(&text, RETRIEVED_ADVICE_SOURCE)?;
        info!(
            "Retrieved advice {} via context {} (score {:.3})",
            pick.target, pick.context, pick.score
        );
        Ok(Some(advice_hint(&text)))
    }

    /// Action hint from the best candidate, annotated with how the winning
    /// context differs from the current one. Records a helpful-hint entry
    /// for the current context.
    pub async fn retrieve_action(
        &self,
        session: &mut MemorySession,
        context_text: &str,
        candidates: &[RecordId],
        summarizer: &dyn DiffSummarizer,
        noise: &mut dyn NoiseSource,
    ) -> Result<Option<String>> {
        let Some(pick) = self.rank_action(session, candidates, noise) else {
            return Ok(None);
        };
        if !Self::passes_floor(self.config.min_action_score, &pick) {
            debug!("Best action {} scored {:.3}, below floor", pick.target, pick.score);
            return Ok(None);
        }
        let Some(action) = session.actions().get_text(pick.target).map(str::to_string) else {
            return Ok(None);
        };
        let then = session.contexts().get_text(pick.context).map(str::to_string);

        let summary = match then {
            Some(then) => summarize_context_diff(summarizer, context_text, &then).await,
            None => None,
        };
        let phrase = diff_phrase(summary.as_deref());

        session.record_helpful_hint(pick.target, &action, &phrase)?;
        info!(
            "Retrieved action {} via context {} (score {:.3})",
            pick.target, pick.context, pick.score
        );
        Ok(Some(action_hint(&action, &phrase)))
    }

    /// Pick a hint for the context just recorded in `session`.
    ///
    /// The advice path is tried first with probability `advice_probability`;
    /// the action path is used otherwise or when no advice qualifies.
    pub async fn create_hint(
        &self,
        session: &mut MemorySession,
        context_text: &str,
        embedding: &[f32],
        summarizer: &dyn DiffSummarizer,
        noise: &mut dyn NoiseSource,
    ) -> Result<Option<Hint>> {
        let candidates = self.candidates(session, embedding)?;
        debug!("Ranking {} candidate contexts", candidates.len());

        if noise.unit() < self.config.advice_probability {
            if let Some(text) = self.retrieve_advice(session, &candidates, noise)? {
                return Ok(Some(Hint {
                    path: HintPath::Advice,
                    text,
                }));
            }
        }

        Ok(self
            .retrieve_action(session, context_text, &candidates, summarizer, noise)
            .await?
            .map(|text| Hint {
                path: HintPath::Action,
                text,
            }))
    }
}
