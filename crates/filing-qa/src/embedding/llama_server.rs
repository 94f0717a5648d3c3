use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;
use crate::utils::error::QaError;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct LlamaEmbeddingRequest<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

/// Client for a running llama.cpp server started with `--embedding`.
#[derive(Clone)]
pub struct LlamaEmbeddingClient {
    client: Client,
    base_url: String,
    model: Option<String>,
    dimension: usize,
}

impl LlamaEmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, QaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: Some(config.model.trim().to_string()).filter(|m| !m.is_empty()),
            dimension: config.dimension,
        })
    }

    fn request<'a>(&'a self, text: &'a str) -> LlamaEmbeddingRequest<'a> {
        LlamaEmbeddingRequest {
            content: text,
            model: self.model.as_deref(),
        }
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for {} chars", text.len());

        let response = self
            .client
            .post(format!("{}/embedding", self.base_url))
            .json(&self.request(text))
            .send()
            .await
            .context("Failed to connect to embedding server")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Embedding request failed: {} - {}", status, body);
        }

        let json: Value = response
            .json()
            .await
            .context("Failed to parse embedding response as JSON")?;

        let embedding = parse_embedding_response(&json)?;
        if embedding.len() != self.dimension {
            anyhow::bail!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimension,
                embedding.len()
            );
        }

        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for LlamaEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_text(text).await
    }
}

/// Accepts every response shape llama-server has shipped:
/// legacy `{"embedding": [...]}`, `[{"index": 0, "embedding": [...]}]` (optionally
/// nested `[[...]]`), OpenAI-style `{"data": [{"embedding": [...]}]}` and a bare float array.
pub fn parse_embedding_response(json: &Value) -> Result<Vec<f32>> {
    let values = match json {
        Value::Array(items) => {
            let first = items
                .first()
                .ok_or_else(|| anyhow!("Received empty array from embedding server"))?;
            match first.get("embedding") {
                Some(field) => field,
                None => json,
            }
        }
        Value::Object(map) => match (map.get("embedding"), map.get("data")) {
            (Some(field), _) => field,
            (None, Some(Value::Array(data))) => data
                .first()
                .and_then(|item| item.get("embedding"))
                .ok_or_else(|| anyhow!("Missing 'embedding' field in data response"))?,
            _ => anyhow::bail!("Unrecognized embedding response format: {}", json),
        },
        _ => anyhow::bail!("Unrecognized embedding response format: {}", json),
    };

    let values = values
        .as_array()
        .ok_or_else(|| anyhow!("Embedding field is not an array"))?;

    // Batch responses nest the vector one level deeper.
    let values = match values.first() {
        Some(Value::Array(inner)) => inner,
        _ => values,
    };

    let embedding: Vec<f32> = values
        .iter()
        .filter_map(|v| v.as_f64().map(|f| f as f32))
        .collect();

    if embedding.is_empty() {
        anyhow::bail!("Parsed embedding vector is empty");
    }

    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_legacy_format() {
        let parsed = parse_embedding_response(&json!({"embedding": [0.1, 0.2, 0.3]})).unwrap();
        assert_eq!(parsed, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_parses_indexed_array_format() {
        let parsed =
            parse_embedding_response(&json!([{"index": 0, "embedding": [1.0, 2.0]}])).unwrap();
        assert_eq!(parsed, vec![1.0, 2.0]);
    }

    #[test]
    fn test_parses_nested_batch_format() {
        let parsed =
            parse_embedding_response(&json!([{"index": 0, "embedding": [[0.5, 0.25]]}])).unwrap();
        assert_eq!(parsed, vec![0.5, 0.25]);
    }

    #[test]
    fn test_parses_openai_data_format() {
        let parsed =
            parse_embedding_response(&json!({"data": [{"embedding": [3.0, 4.0]}]})).unwrap();
        assert_eq!(parsed, vec![3.0, 4.0]);
    }

    #[test]
    fn test_parses_bare_float_array() {
        let parsed = parse_embedding_response(&json!([0.0, 1.0])).unwrap();
        assert_eq!(parsed, vec![0.0, 1.0]);
    }

    #[test]
    fn test_rejects_empty_and_unknown_shapes() {
        assert!(parse_embedding_response(&json!([])).is_err());
        assert!(parse_embedding_response(&json!({"embedding": []})).is_err());
        assert!(parse_embedding_response(&json!({"vector": [1.0]})).is_err());
        assert!(parse_embedding_response(&json!("nope")).is_err());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let config = EmbeddingConfig {
            base_url: "http://localhost:8081/".to_string(),
            ..EmbeddingConfig::default()
        };
        let client = LlamaEmbeddingClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8081");
        assert_eq!(client.dimension, 384);
    }

    #[test]
    fn test_request_carries_configured_model() {
        let client = LlamaEmbeddingClient::new(&EmbeddingConfig::default()).unwrap();
        let body = serde_json::to_value(client.request("cash position")).unwrap();
        assert_eq!(
            body,
            json!({"content": "cash position", "model": "all-MiniLM-L6-v2"})
        );

        let config = EmbeddingConfig {
            model: " ".to_string(),
            ..EmbeddingConfig::default()
        };
        let client = LlamaEmbeddingClient::new(&config).unwrap();
        let body = serde_json::to_value(client.request("cash position")).unwrap();
        assert_eq!(body, json!({"content": "cash position"}));
    }
}
