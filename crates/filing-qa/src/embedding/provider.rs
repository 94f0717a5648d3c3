use anyhow::Result;
use async_trait::async_trait;

/// Turns text into a fixed-dimension vector. Used to rank context chunks
/// against a question.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
