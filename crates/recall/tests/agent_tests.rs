//! Integration tests for the agent cycle driver
//!
//! Runs several cycles end to end with operator feedback, a remote diff
//! summarizer behind a mock HTTP server, and an on-disk run.

use std::time::Duration;

use recall::config::{Config, RetrievalConfig, StorageConfig, SummarizerConfig};
use recall::retrieval::{FixedNoise, SeededNoise};
use recall::summarizer::RemoteSummarizer;
use recall::testing::{MockEmbeddingModel, StaticSummarizer};
use recall::{CycleOutcome, EpisodicAgent, Feedback, HintPath, MemorySession, RunId};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RUN: RunId = RunId(1_714_000_000);

fn action_only_config() -> Config {
    Config {
        retrieval: RetrievalConfig {
            advice_probability: 0.0,
            ..RetrievalConfig::default()
        },
        ..Config::default()
    }
}

mod cycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_feedback_then_hint_over_remote_summarizer() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "The current step is later in the task." } }]
            })))
            .mount(&mock_server)
            .await;

        let summarizer = RemoteSummarizer::with_api_key(
            &SummarizerConfig {
                api_url: mock_server.uri(),
                ..SummarizerConfig::default()
            },
            "test-key",
        )
        .unwrap()
        .with_backoff(Duration::from_millis(1));

        let dir = tempdir().unwrap();
        let config = Config {
            storage: StorageConfig {
                data_dir: dir.path().to_path_buf(),
                persist: true,
            },
            ..action_only_config()
        };
        let session = MemorySession::from_config(&config.storage, RUN).unwrap();
        let mut agent = EpisodicAgent::new(
            session,
            &config,
            Box::new(MockEmbeddingModel::new()),
            Box::new(summarizer),
            Box::new(SeededNoise::new(42)),
        );

        for i in 0..3 {
            let outcome = agent
                .process_context(&format!("goal: report\nstep: {i}"), None)
                .await
                .unwrap();
            assert_eq!(outcome, CycleOutcome::Nothing);
            agent.process_action(&format!("act-{i}")).unwrap();
        }

        let outcome = agent
            .process_context("goal: report\nstep: 3", Some(Feedback::parse("/score 8")))
            .await
            .unwrap();
        let hint = match outcome {
            CycleOutcome::Hint(hint) => hint,
            other => panic!("expected a hint, got {other:?}"),
        };
        assert_eq!(hint.path, HintPath::Action);
        assert!(hint.text.contains("The current step is later in the task."));

        let session = agent.into_session();
        assert_eq!(session.stats().scored_actions, 3);
        assert_eq!(session.stats().hints, 1);

        let reopened = MemorySession::open(dir.path(), RUN).unwrap();
        assert_eq!(reopened.stats(), session.stats());
    }

    #[tokio::test]
    async fn test_operator_commands_route_to_outcomes() {
        let mut agent = EpisodicAgent::new(
            MemorySession::in_memory(RUN),
            &Config::default(),
            Box::new(MockEmbeddingModel::new()),
            Box::new(StaticSummarizer::new("different")),
            Box::new(FixedNoise::centered()),
        );

        let outcome = agent
            .process_context("ctx-0", Some(Feedback::parse("/ADVICE keep answers short")))
            .await
            .unwrap();
        match outcome {
            CycleOutcome::AdviceAck(text) => assert!(text.contains("keep answers short")),
            other => panic!("expected an advice ack, got {other:?}"),
        }
        agent.process_action("act-0").unwrap();

        let outcome = agent
            .process_context("ctx-1", Some(Feedback::parse("/history 1")))
            .await
            .unwrap();
        match outcome {
            CycleOutcome::History { entry, .. } => {
                let entry = entry.unwrap();
                assert_eq!(entry.advice.as_deref(), Some("keep answers short"));
            }
            other => panic!("expected history, got {other:?}"),
        }

        let outcome = agent
            .process_context("ctx-2", Some(Feedback::parse("are you stuck?")))
            .await
            .unwrap();
        match outcome {
            CycleOutcome::UserMessage(text) => assert!(text.contains("are you stuck?")),
            other => panic!("expected a user message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_scores_are_clamped_by_config() {
        let mut config = Config::default();
        config.scoring.max_score = 3;

        let mut agent = EpisodicAgent::new(
            MemorySession::in_memory(RUN),
            &config,
            Box::new(MockEmbeddingModel::new()),
            Box::new(StaticSummarizer::new("different")),
            Box::new(FixedNoise::centered()),
        );
        agent.process_context("ctx-0", None).await.unwrap();
        let action = agent.process_action("act-0").unwrap();
        agent
            .process_context("ctx-1", Some(Feedback::ScoreLast(9)))
            .await
            .unwrap();

        assert_eq!(agent.session().action_score(action).as_f64(), Some(3.0));
    }
}
