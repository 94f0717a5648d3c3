//! SEC EDGAR retrieval: ticker to CIK, latest 10-K (or 10-Q) lookup, and
//! primary document download.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::source::FilingSource;
use crate::config::EdgarConfig;
use crate::utils::error::QaError;

#[derive(Debug, Clone, Deserialize)]
struct CompanyTicker {
    cik_str: u64,
    ticker: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Submissions {
    filings: FilingHistory,
}

#[derive(Debug, Clone, Deserialize)]
struct FilingHistory {
    recent: RecentFilings,
}

/// Parallel arrays, one index per filing, newest first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFilings {
    #[serde(default)]
    pub accession_number: Vec<String>,
    #[serde(default)]
    pub form: Vec<String>,
    #[serde(default)]
    pub filing_date: Vec<String>,
    #[serde(default)]
    pub primary_document: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingInfo {
    pub accession_number: String,
    pub form: String,
    pub filing_date: Option<NaiveDate>,
    pub primary_document: String,
}

impl FilingInfo {
    pub fn document_url(&self, archives_url: &str, cik: u64) -> String {
        format!(
            "{}/{}/{}/{}",
            archives_url.trim_end_matches('/'),
            cik,
            self.accession_number.replace('-', ""),
            self.primary_document
        )
    }
}

impl RecentFilings {
    /// Most recent filing of exactly `form` that has an accession number and document.
    pub fn latest(&self, form: &str) -> Option<FilingInfo> {
        self.form
            .iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.as_str() == form)
            .find_map(|(i, candidate)| {
                let accession_number = self.accession_number.get(i)?;
                let primary_document = self.primary_document.get(i)?;
                if accession_number.is_empty() || primary_document.is_empty() {
                    return None;
                }
                Some(FilingInfo {
                    accession_number: accession_number.clone(),
                    form: candidate.clone(),
                    filing_date: self
                        .filing_date
                        .get(i)
                        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()),
                    primary_document: primary_document.clone(),
                })
            })
    }

    pub fn select_filing(&self, primary_form: &str, fallback_form: &str) -> Option<FilingInfo> {
        self.latest(primary_form)
            .or_else(|| self.latest(fallback_form))
    }
}

/// Case-insensitive ticker match over the `company_tickers.json` map.
fn find_cik(tickers: &HashMap<String, CompanyTicker>, ticker: &str) -> Option<u64> {
    let wanted = ticker.trim();
    tickers
        .values()
        .find(|company| company.ticker.eq_ignore_ascii_case(wanted))
        .map(|company| company.cik_str)
}

pub fn pad_cik(cik: u64) -> String {
    format!("{:010}", cik)
}

pub struct EdgarClient {
    client: Client,
    config: EdgarConfig,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl EdgarClient {
    pub fn new(config: EdgarConfig) -> Result<Self, QaError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            min_interval: Duration::from_millis(config.min_request_interval_ms),
            config,
            last_request: Mutex::new(None),
        })
    }

    /// Sleeps until the configured interval has passed since the previous request.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, QaError> {
        self.throttle().await;
        debug!(url, "EDGAR request");
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, QaError> {
        Ok(self.get(url).await?.json::<T>().await?)
    }

    pub async fn lookup_cik(&self, ticker: &str) -> Result<Option<u64>> {
        let tickers: HashMap<String, CompanyTicker> = self
            .get_json(&self.config.tickers_url)
            .await
            .context("Failed to fetch company tickers")?;
        Ok(find_cik(&tickers, ticker))
    }

    pub async fn recent_filings(&self, cik: u64) -> Result<RecentFilings> {
        let url = format!(
            "{}/CIK{}.json",
            self.config.submissions_url.trim_end_matches('/'),
            pad_cik(cik)
        );
        let submissions: Submissions = self
            .get_json(&url)
            .await
            .with_context(|| format!("Failed to fetch submissions for CIK {}", cik))?;
        Ok(submissions.filings.recent)
    }
}

#[async_trait]
impl FilingSource for EdgarClient {
    async fn fetch_filing(&self, ticker: &str) -> Result<Option<String>> {
        let Some(cik) = self.lookup_cik(ticker).await? else {
            warn!(ticker, "Ticker not found in SEC company list");
            return Ok(None);
        };

        let recent = self.recent_filings(cik).await?;
        let Some(filing) =
            recent.select_filing(&self.config.primary_form, &self.config.fallback_form)
        else {
            warn!(
                ticker,
                cik,
                primary = %self.config.primary_form,
                fallback = %self.config.fallback_form,
                "No suitable filing found"
            );
            return Ok(None);
        };

        let url = filing.document_url(&self.config.archives_url, cik);
        info!(
            ticker,
            form = %filing.form,
            filing_date = ?filing.filing_date,
            %url,
            "Downloading filing document"
        );

        let body = self
            .get(&url)
            .await?
            .text()
            .await
            .context("Failed to read filing document")?;

        Ok(Some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recent() -> RecentFilings {
        serde_json::from_value(json!({
            "accessionNumber": ["0000320193-24-000125", "0000320193-24-000081", "0000320193-23-000106"],
            "form": ["8-K", "10-Q", "10-K"],
            "filingDate": ["2024-10-31", "2024-08-02", "2023-11-03"],
            "primaryDocument": ["aapl-8k.htm", "aapl-20240629.htm", "aapl-20230930.htm"],
            "reportDate": ["", "", ""]
        }))
        .unwrap()
    }

    #[test]
    fn test_pad_cik() {
        assert_eq!(pad_cik(320193), "0000320193");
    }

    #[test]
    fn test_find_cik_is_case_insensitive() {
        let tickers: HashMap<String, CompanyTicker> = serde_json::from_value(json!({
            "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
            "1": {"cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP"}
        }))
        .unwrap();

        assert_eq!(find_cik(&tickers, " aapl "), Some(320193));
        assert_eq!(find_cik(&tickers, "msft"), Some(789019));
        assert_eq!(find_cik(&tickers, "ZZZZ"), None);
    }

    #[test]
    fn test_selects_primary_form() {
        let filing = recent().select_filing("10-K", "10-Q").unwrap();
        assert_eq!(filing.form, "10-K");
        assert_eq!(filing.filing_date, NaiveDate::from_ymd_opt(2023, 11, 3));
        assert_eq!(
            filing.document_url("https://www.sec.gov/Archives/edgar/data/", 320193),
            "https://www.sec.gov/Archives/edgar/data/320193/000032019323000106/aapl-20230930.htm"
        );
    }

    #[test]
    fn test_falls_back_to_quarterly_form() {
        let mut filings = recent();
        filings.form[2] = "DEF 14A".to_string();
        let filing = filings.select_filing("10-K", "10-Q").unwrap();
        assert_eq!(filing.form, "10-Q");
        assert_eq!(filing.primary_document, "aapl-20240629.htm");
    }

    #[test]
    fn test_form_match_is_exact() {
        let filings: RecentFilings = serde_json::from_value(json!({
            "accessionNumber": ["a-1"],
            "form": ["10-K/A"],
            "filingDate": ["2024-01-01"],
            "primaryDocument": ["doc.htm"]
        }))
        .unwrap();
        assert!(filings.select_filing("10-K", "10-Q").is_none());
    }

    #[test]
    fn test_ragged_arrays_do_not_panic() {
        let filings: RecentFilings = serde_json::from_value(json!({
            "accessionNumber": [],
            "form": ["10-K"],
            "primaryDocument": ["doc.htm"]
        }))
        .unwrap();
        assert!(filings.latest("10-K").is_none());
    }

    #[tokio::test]
    async fn test_throttle_spaces_requests() {
        let config = EdgarConfig {
            min_request_interval_ms: 40,
            ..EdgarConfig::default()
        };
        let client = EdgarClient::new(config).unwrap();

        let start = Instant::now();
        client.throttle().await;
        client.throttle().await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
