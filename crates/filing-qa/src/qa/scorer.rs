use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::QaConfig;
use crate::utils::error::QaError;

/// One extractive answer and the model's confidence in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAnswer {
    pub answer: String,
    pub score: f32,
}

/// An extractive question-answering model: given a question and a passage,
/// returns the best answer span with a score in [0, 1].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerScorer: Send + Sync {
    async fn score_answer(&self, question: &str, context: &str) -> Result<ScoredAnswer>;
}

#[derive(Debug, Serialize)]
struct QaRequest<'a> {
    inputs: QaInputs<'a>,
}

#[derive(Debug, Serialize)]
struct QaInputs<'a> {
    question: &'a str,
    context: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QaResponse {
    Single(ScoredAnswer),
    Ranked(Vec<ScoredAnswer>),
}

/// Question-answering pipeline served over HTTP in the Hugging Face inference format.
#[derive(Clone)]
pub struct HttpAnswerScorer {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpAnswerScorer {
    pub fn new(config: &QaConfig) -> Result<Self, QaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/models/{}",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_token: config.api_token.clone().filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnswerScorer for HttpAnswerScorer {
    async fn score_answer(&self, question: &str, context: &str) -> Result<ScoredAnswer> {
        debug!(context_chars = context.len(), "Requesting answer span");

        let mut request = self.client.post(&self.endpoint).json(&QaRequest {
            inputs: QaInputs { question, context },
        });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .context("Failed to connect to QA server")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(QaError::UpstreamStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let json: Value = response
            .json()
            .await
            .context("Failed to parse QA response as JSON")?;

        parse_qa_response(json)
    }
}

/// Takes the top answer from either a single object or a ranked list, with
/// the score clamped into [0, 1].
pub fn parse_qa_response(json: Value) -> Result<ScoredAnswer> {
    let top = match serde_json::from_value::<QaResponse>(json)
        .map_err(|e| anyhow!("Unrecognized QA response: {}", e))?
    {
        QaResponse::Single(answer) => answer,
        QaResponse::Ranked(answers) => answers
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("QA server returned no answers"))?,
    };

    if !top.score.is_finite() {
        anyhow::bail!("QA server returned a non-finite score");
    }

    Ok(ScoredAnswer {
        answer: top.answer,
        score: top.score.clamp(0.0, 1.0),
    })
}
