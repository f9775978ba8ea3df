//! Per-cycle driver for an agent with episodic memory
//!
//! One cycle: a context arrives and is embedded and recorded, any operator
//! feedback is applied, and a hint is produced for the agent's next prompt.
//! Once the agent answers, its action is recorded with
//! [`EpisodicAgent::process_action`].

use tracing::{debug, info};

use crate::config::{AgentConfig, Config, ScoringConfig};
use crate::embedding::{Embedder, EmbeddingModel};
use crate::error::Result;
use crate::feedback::Feedback;
use crate::memory::history::HistoryEntry;
use crate::memory::scoring::ScoreOrchestrator;
use crate::memory::session::{MemorySession, USER_ADVICE_SOURCE};
use crate::memory::types::{RecordId, RunId};
use crate::retrieval::noise::{NoiseSource, SeededNoise};
use crate::retrieval::policy::{Hint, RetrievalPolicy};
use crate::summarizer::{DiffSummarizer, RemoteSummarizer};

/// What the caller should do with the cycle's result
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Inject this hint into the agent's next prompt
    Hint(Hint),
    /// Advice was stored; tell the agent about it
    AdviceAck(String),
    /// Show `entry` to the operator; `hint` (if any) still goes to the agent
    History {
        entry: Option<HistoryEntry>,
        hint: Option<Hint>,
    },
    /// Forward the operator's free-form message to the agent
    UserMessage(String),
    Nothing,
}

pub struct EpisodicAgent {
    session: MemorySession,
    policy: RetrievalPolicy,
    embedder: Box<dyn Embedder>,
    summarizer: Box<dyn DiffSummarizer>,
    noise: Box<dyn NoiseSource>,
    scoring: ScoringConfig,
    agent: AgentConfig,
}

impl EpisodicAgent {
    pub fn new(
        session: MemorySession,
        config: &Config,
        embedder: Box<dyn Embedder>,
        summarizer: Box<dyn DiffSummarizer>,
        noise: Box<dyn NoiseSource>,
    ) -> Self {
        Self {
            session: session.with_orchestrator(ScoreOrchestrator::new(&config.scoring)),
            policy: RetrievalPolicy::new(config.retrieval.clone()),
            embedder,
            summarizer,
            noise,
            scoring: config.scoring.clone(),
            agent: config.agent.clone(),
        }
    }

    /// Agent for `run` with production collaborators: the remote
    /// summarizer and fastembed model named in `config`, entropy-seeded
    /// noise, and a session stored as `[storage]` asks.
    ///
    /// The summarizer is built first so a missing API key fails before the
    /// embedding model is loaded.
    pub fn from_config(config: &Config, run: RunId) -> Result<Self> {
        let summarizer = RemoteSummarizer::new(&config.summarizer)?;
        let session = MemorySession::from_config(&config.storage, run)?;
        let embedder = EmbeddingModel::from_config(&config.embedding)?;

        Ok(Self::new(
            session,
            config,
            Box::new(embedder),
            Box::new(summarizer),
            Box::new(SeededNoise::from_entropy()),
        ))
    }

    pub fn session(&self) -> &MemorySession {
        &self.session
    }

    pub fn into_session(self) -> MemorySession {
        self.session
    }

    /// Record `text` as the new context, apply `feedback`, and pick a hint
    pub async fn process_context(
        &mut self,
        text: &str,
        feedback: Option<Feedback>,
    ) -> Result<CycleOutcome> {
        let embedding = self.embedder.embed(text)?;
        let context_id = self.session.record_context(text, embedding.clone())?;
        debug!("Cycle started at context {}", context_id);

        match feedback {
            Some(Feedback::Score(score)) => {
                self.apply_feedback_score(self.scoring.feedback_window, score)?;
            }
            Some(Feedback::ScoreLast(score)) => {
                self.apply_feedback_score(1, score)?;
            }
            Some(Feedback::Advice(advice)) => {
                self.session.store_advice(&advice, USER_ADVICE_SOURCE)?;
                info!("Stored user advice for context {}", context_id);
                return Ok(CycleOutcome::AdviceAck(format!(
                    "Your user has requested that you use the following advice in deciding on your future responses: {advice}"
                )));
            }
            Some(Feedback::FreeForm(message)) => {
                return Ok(CycleOutcome::UserMessage(format!(
                    "Your user has sent you the following message: {message}\n\
Reply through your messaging command if you wish to respond."
                )));
            }
            Some(Feedback::History(num_back)) => {
                let entry = self.session.history(num_back);
                let hint = self.maybe_hint(text, &embedding).await?;
                return Ok(CycleOutcome::History { entry, hint });
            }
            None => {}
        }

        Ok(match self.maybe_hint(text, &embedding).await? {
            Some(hint) => CycleOutcome::Hint(hint),
            None => CycleOutcome::Nothing,
        })
    }

    /// Record the agent's response to the current context
    pub fn process_action(&mut self, text: &str) -> Result<RecordId> {
        self.session.record_action(text)
    }

    fn apply_feedback_score(&mut self, num_back: usize, score: i64) -> Result<()> {
        let score = score.clamp(self.scoring.min_score, self.scoring.max_score);
        let report = self.session.apply_scores(0, num_back, score as f64, false)?;
        info!(
            "Feedback score {} reached {} actions",
            score,
            report.actions.len()
        );
        Ok(())
    }

    async fn maybe_hint(&mut self, text: &str, embedding: &[f32]) -> Result<Option<Hint>> {
        let threshold = self.agent.min_contexts_for_hint.max(2);
        if self.session.contexts().count() < threshold {
            debug!(
                "Only {} contexts recorded, no hint yet",
                self.session.contexts().count()
            );
            return Ok(None);
        }

        self.policy
            .create_hint(
                &mut self.session,
                text,
                embedding,
                self.summarizer.as_ref(),
                self.noise.as_mut(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecallError;
    use crate::memory::types::Value;
    use crate::retrieval::noise::FixedNoise;
    use crate::retrieval::policy::HintPath;
    use crate::testing::{MockEmbeddingModel, StaticSummarizer};

    fn agent() -> EpisodicAgent {
        EpisodicAgent::new(
            MemorySession::in_memory(RunId(1)),
            &Config::default(),
            Box::new(MockEmbeddingModel::new()),
            Box::new(StaticSummarizer::new("the task moved on")),
            Box::new(FixedNoise::centered()),
        )
    }

    #[tokio::test]
    async fn test_no_hint_before_threshold() {
        let mut agent = agent();
        for i in 0..3 {
            let outcome = agent.process_context(&format!("ctx-{i}"), None).await.unwrap();
            assert_eq!(outcome, CycleOutcome::Nothing);
            agent.process_action(&format!("act-{i}")).unwrap();
        }

        let outcome = agent.process_context("ctx-3", None).await.unwrap();
        match outcome {
            CycleOutcome::Hint(hint) => assert_eq!(hint.path, HintPath::Action),
            other => panic!("expected a hint, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_score_feedback_reaches_window() {
        let mut agent = agent();
        for i in 0..3 {
            agent.process_context(&format!("ctx-{i}"), None).await.unwrap();
            agent.process_action(&format!("act-{i}")).unwrap();
        }

        agent
            .process_context("ctx-3", Some(Feedback::Score(5)))
            .await
            .unwrap();
        let session = agent.session();
        let scores: Vec<Value> = session
            .actions()
            .iter()
            .map(|r| session.action_score(r.id))
            .collect();
        assert_eq!(scores[2], Value::Float(5.0));
        assert_eq!(scores[1], Value::Float(4.0));
    }

    #[tokio::test]
    async fn test_score_last_only_touches_one_action() {
        let mut agent = agent();
        for i in 0..2 {
            agent.process_context(&format!("ctx-{i}"), None).await.unwrap();
            agent.process_action(&format!("act-{i}")).unwrap();
        }
        agent
            .process_context("ctx-2", Some(Feedback::ScoreLast(-3)))
            .await
            .unwrap();

        let session = agent.session();
        assert_eq!(session.action_score(RecordId::new(RunId(1), 1)), Value::Float(-3.0));
        assert!(session.action_score(RecordId::new(RunId(1), 0)).is_absent());
    }

    #[tokio::test]
    async fn test_advice_is_acknowledged_and_stored() {
        let mut agent = agent();
        let outcome = agent
            .process_context("ctx-0", Some(Feedback::Advice("go slower".to_string())))
            .await
            .unwrap();
        match outcome {
            CycleOutcome::AdviceAck(text) => assert!(text.ends_with("go slower")),
            other => panic!("expected an advice ack, got {other:?}"),
        }

        let advice = agent.session().advice_for(RecordId::new(RunId(1), 0)).unwrap();
        assert_eq!(agent.session().advice_source(advice).as_deref(), Some("user"));
    }

    #[tokio::test]
    async fn test_free_form_is_forwarded() {
        let mut agent = agent();
        let outcome = agent
            .process_context("ctx-0", Some(Feedback::FreeForm("hello there".to_string())))
            .await
            .unwrap();
        match outcome {
            CycleOutcome::UserMessage(text) => assert!(text.contains("hello there")),
            other => panic!("expected a user message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_history_request() {
        let mut agent = agent();
        agent.process_context("ctx-0", None).await.unwrap();
        agent.process_action("act-0").unwrap();

        let outcome = agent
            .process_context("ctx-1", Some(Feedback::History(1)))
            .await
            .unwrap();
        match outcome {
            CycleOutcome::History { entry, hint } => {
                let entry = entry.unwrap();
                assert_eq!(entry.context, "ctx-0");
                assert_eq!(entry.action.as_deref(), Some("act-0"));
                assert!(hint.is_none());
            }
            other => panic!("expected history, got {other:?}"),
        }
    }

    #[test]
    fn test_from_config_needs_summarizer_key() {
        let mut config = Config::default();
        config.storage.persist = false;
        config.summarizer.api_key_env = "RECALL_TEST_KEY_NEVER_SET".to_string();

        let result = EpisodicAgent::from_config(&config, RunId(1));
        assert!(matches!(result, Err(RecallError::Summarizer(_))));
    }
}
