// src/grading/llm.rs
//
// Free-text grading through an OpenAI-compatible chat-completions API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::GraderConfig;
use crate::grading::engine::TextGrader;
use crate::grading::error::GradingError;

const RETRY_BACKOFF_MS: u64 = 500;

fn system_prompt(max_marks: i32) -> String {
    format!(
        "You are an exam marker. Reply with a single whole number between 0 and {max_marks} \
         for how well the student's answer meets the mark scheme, and nothing else. \
         Answers not listed in the mark scheme can still be correct. \
         Where the mark scheme says BOD, give the benefit of the doubt."
    )
}

/// `TextGrader` backed by a chat-completions endpoint.
pub struct OpenAiGrader {
    api_key: String,
    base_url: String,
    model: String,
    timeout_secs: u64,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAiGrader {
    pub fn new(config: &GraderConfig) -> Result<Self, GradingError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GradingError::Unreachable(e.to_string()))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
            client,
        })
    }

    async fn request_once(&self, body: &ChatRequest<'_>) -> Result<i64, GradingError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.text().await.unwrap_or_default();
            return Err(GradingError::Api { status, message });
        }

        // The client timeout also covers reading the body.
        let reply: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GradingError::Timeout(self.timeout_secs)
            } else {
                GradingError::Malformed(format!("unreadable response body: {e}"))
            }
        })?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        parse_score(&content)
    }

    fn transport_error(&self, e: reqwest::Error) -> GradingError {
        if e.is_timeout() {
            GradingError::Timeout(self.timeout_secs)
        } else {
            GradingError::Unreachable(e.to_string())
        }
    }
}

/// The reply must be a bare integer, surrounding whitespace aside.
fn parse_score(content: &str) -> Result<i64, GradingError> {
    content
        .trim()
        .parse::<i64>()
        .map_err(|_| GradingError::Malformed(content.to_string()))
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl TextGrader for OpenAiGrader {
    #[instrument(skip(self, answer, answer_key))]
    async fn mark(&self, answer: &str, answer_key: &str, max_marks: i32) -> Result<i64, GradingError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            max_tokens: 8,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(max_marks),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Student answer: {answer}\nMark scheme: {answer_key}"),
                },
            ],
        };

        let mut attempt = 0;
        loop {
            match self.request_once(&body).await {
                Ok(score) => return Ok(score),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!("Grading attempt {} failed: {}; retrying", attempt, e);
                    tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * u64::from(attempt)))
                        .await;
                }
                Err(e) => {
                    tracing::error!("Grading failed: {}", e);
                    return Err(e);
                }
            }
        }
    }
}
