//! Remote diff summarizer using OpenAI-compatible APIs
//!
//! Any chat-completions endpoint works; URL, model and the environment
//! variable holding the API key come from `[summarizer]` in the config.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SummarizerConfig;
use crate::summarizer::provider::{DiffSummarizer, SummarizerError};

const MAX_RETRIES: u32 = 3;

#[derive(Debug)]
pub struct RemoteSummarizer {
    client: Client,
    config: SummarizerConfig,
    api_key: String,
    initial_backoff: Duration,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl RemoteSummarizer {
    /// Create a summarizer, reading the API key from the environment
    /// variable named by `config.api_key_env`
    pub fn new(config: &SummarizerConfig) -> Result<Self, SummarizerError> {
        let api_key = env::var(&config.api_key_env).map_err(|_| {
            SummarizerError::ConfigError(format!(
                "API key env var '{}' not set",
                config.api_key_env
            ))
        })?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(
        config: &SummarizerConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, SummarizerError> {
        if config.api_url.is_empty() {
            return Err(SummarizerError::ConfigError(
                "summarizer api_url is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SummarizerError::ApiError(e.to_string()))?;

        info!(
            "RemoteSummarizer initialized with model: {}, api_url: {}",
            config.model, config.api_url
        );

        Ok(Self {
            client,
            config: config.clone(),
            api_key: api_key.into(),
            initial_backoff: Duration::from_secs(1),
        })
    }

    /// Delay before the first retry; doubled after every failed attempt
    pub fn with_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    async fn call_api(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, SummarizerError> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system_prompt,
                },
                Message {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: 0.2,
            max_tokens: 256,
        };

        let url = format!("{}/chat/completions", self.config.api_url.trim_end_matches('/'));
        debug!("Calling remote API at: {}", url);

        let mut backoff = Backoff::new(MAX_RETRIES, self.initial_backoff);
        loop {
            match self.send_once(&url, &request).await {
                Ok(reply) => return Ok(reply),
                Err(Attempt::Fatal(e)) => return Err(e),
                Err(Attempt::Retryable(reason)) => {
                    if !backoff.wait(&reason).await {
                        return Err(SummarizerError::ApiError(format!(
                            "Failed after {MAX_RETRIES} retries: {reason}"
                        )));
                    }
                }
            }
        }
    }

    /// One request; rate limits and transport errors are worth retrying,
    /// anything else the server says is final
    async fn send_once(
        &self,
        url: &str,
        request: &ChatCompletionRequest<'_>,
    ) -> Result<String, Attempt> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Attempt::Retryable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Attempt::Retryable(format!("rate limited ({status})")));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Attempt::Fatal(SummarizerError::ApiError(format!(
                "API returned {status}: {body}"
            ))));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Attempt::Fatal(SummarizerError::ParseError(e.to_string())))?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Attempt::Fatal(SummarizerError::ApiError("Empty response".to_string())))
    }
}

/// Outcome of a failed request
enum Attempt {
    Retryable(String),
    Fatal(SummarizerError),
}

/// Bounded retry budget with a doubling delay
#[derive(Debug)]
struct Backoff {
    attempts: u32,
    max_attempts: u32,
    delay: Duration,
}

impl Backoff {
    fn new(max_attempts: u32, initial: Duration) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            delay: initial,
        }
    }

    /// Count a failed attempt and sleep before the next one. False once the
    /// budget is spent; no sleep happens then.
    async fn wait(&mut self, reason: &str) -> bool {
        self.attempts += 1;
        if self.attempts >= self.max_attempts {
            return false;
        }
        warn!(
            "Attempt {}/{} failed ({}), retrying in {:?}",
            self.attempts, self.max_attempts, reason, self.delay
        );
        tokio::time::sleep(self.delay).await;
        self.delay *= 2;
        true
    }
}

#[async_trait]
impl DiffSummarizer for RemoteSummarizer {
    async fn summarize_diff(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, SummarizerError> {
        let reply = self.call_api(system_prompt, user_prompt).await?;
        debug!("Diff summary response: {}", reply);
        Ok(reply)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config(api_url: String) -> SummarizerConfig {
        SummarizerConfig {
            api_url,
            api_key_env: "RECALL_TEST_SUMMARIZER_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{
                "message": {
                    "content": content
                }
            }]
        })
    }

    #[test]
    fn test_new_missing_api_key() {
        let config = SummarizerConfig {
            api_key_env: "RECALL_TEST_UNSET_KEY".to_string(),
            ..create_test_config("https://api.example.com/v1".to_string())
        };
        unsafe { env::remove_var("RECALL_TEST_UNSET_KEY") };

        let err = RemoteSummarizer::new(&config).unwrap_err().to_string();
        assert!(err.contains("RECALL_TEST_UNSET_KEY"));
    }

    #[test]
    fn test_empty_api_url_rejected() {
        let config = create_test_config(String::new());
        let err = RemoteSummarizer::with_api_key(&config, "key").unwrap_err();
        assert!(matches!(err, SummarizerError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_summarize_diff_sends_both_prompts() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "usr" }
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion("The step counter moved on")),
            )
            .mount(&mock_server)
            .await;

        let summarizer =
            RemoteSummarizer::with_api_key(&create_test_config(mock_server.uri()), "test-key")
                .unwrap();

        let reply = summarizer.summarize_diff("sys", "usr").await.unwrap();
        assert_eq!(reply, "The step counter moved on");
    }

    #[tokio::test]
    async fn test_rate_limit_retry() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
            .mount(&mock_server)
            .await;

        let summarizer =
            RemoteSummarizer::with_api_key(&create_test_config(mock_server.uri()), "test-key")
                .unwrap()
                .with_backoff(Duration::from_millis(50));

        let start = std::time::Instant::now();
        let reply = summarizer.summarize_diff("sys", "usr").await.unwrap();
        assert_eq!(reply, "ok");
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_gives_up() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&mock_server)
            .await;

        let summarizer =
            RemoteSummarizer::with_api_key(&create_test_config(mock_server.uri()), "test-key")
                .unwrap()
                .with_backoff(Duration::from_millis(1));

        let err = summarizer.summarize_diff("sys", "usr").await.unwrap_err();
        assert!(err.to_string().contains("Failed after 3 retries"));
    }

    #[tokio::test]
    async fn test_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let summarizer =
            RemoteSummarizer::with_api_key(&create_test_config(mock_server.uri()), "test-key")
                .unwrap();

        let err = summarizer.summarize_diff("sys", "usr").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_malformed_reply_is_parse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let summarizer =
            RemoteSummarizer::with_api_key(&create_test_config(mock_server.uri()), "test-key")
                .unwrap();

        let err = summarizer.summarize_diff("sys", "usr").await.unwrap_err();
        assert!(matches!(err, SummarizerError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_backoff_doubles_until_budget_spent() {
        let mut backoff = Backoff::new(3, Duration::from_millis(1));
        assert!(backoff.wait("first").await);
        assert_eq!(backoff.delay, Duration::from_millis(2));
        assert!(backoff.wait("second").await);
        assert_eq!(backoff.delay, Duration::from_millis(4));
        assert!(!backoff.wait("third").await);
        assert_eq!(backoff.delay, Duration::from_millis(4));
    }

    #[test]
    fn test_name() {
        let summarizer = RemoteSummarizer::with_api_key(
            &create_test_config("https://api.example.com/v1".to_string()),
            "k",
        )
        .unwrap();
        assert_eq!(summarizer.name(), "remote");
    }
}
