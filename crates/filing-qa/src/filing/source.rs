use anyhow::Result;
use async_trait::async_trait;

/// Supplies the raw text of a company's most recent annual (or quarterly) filing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FilingSource: Send + Sync {
    /// `Ok(None)` when the ticker or a suitable filing does not exist.
    async fn fetch_filing(&self, ticker: &str) -> Result<Option<String>>;
}
