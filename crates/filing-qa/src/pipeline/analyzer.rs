use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::session::FilingSession;
use crate::config::Settings;
use crate::document::{SectionExtractor, TextNormalizer};
use crate::embedding::EmbeddingProvider;
use crate::filing::FilingSource;
use crate::qa::{messages, AnswerResolver, AnswerScorer, ContextSelector};

/// Retrieval, preparation and question answering for SEC filings.
pub struct FilingAnalyzer {
    source: Arc<dyn FilingSource>,
    normalizer: TextNormalizer,
    extractor: SectionExtractor,
    selector: ContextSelector,
    resolver: AnswerResolver,
}

impl FilingAnalyzer {
    pub fn new(
        settings: &Settings,
        source: Arc<dyn FilingSource>,
        scorer: Arc<dyn AnswerScorer>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Self {
        let mut selector = ContextSelector::new(&settings.context);
        if let Some(embedder) = embedder {
            selector = selector.with_embedder(embedder);
        }

        Self {
            source,
            normalizer: TextNormalizer::new(),
            extractor: SectionExtractor::default(),
            selector,
            resolver: AnswerResolver::new(scorer, &settings.qa),
        }
    }

    pub fn with_extractor(mut self, extractor: SectionExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn process_filing(&self, raw: &str) -> FilingSession {
        FilingSession::from_raw(raw, &self.normalizer, &self.extractor)
    }

    /// `None` when the ticker is unknown, no suitable filing exists, or the fetch failed.
    #[instrument(skip(self))]
    pub async fn load(&self, ticker: &str) -> Option<FilingSession> {
        match self.source.fetch_filing(ticker).await {
            Ok(Some(raw)) => {
                info!(bytes = raw.len(), "Retrieved filing");
                Some(self.process_filing(&raw))
            }
            Ok(None) => {
                warn!("No filing available");
                None
            }
            Err(e) => {
                error!(error = %e, "Failed to retrieve filing");
                None
            }
        }
    }

    #[instrument(skip(self, session))]
    pub async fn ask(&self, session: &FilingSession, question: &str) -> String {
        if question.trim().is_empty() {
            return messages::NO_QUESTION.to_string();
        }

        let context = self
            .selector
            .select(session.sections(), session.text(), question)
            .await;

        self.resolver.answer(context.as_deref(), question).await
    }

    pub async fn answer_for_ticker(&self, ticker: &str, question: &str) -> String {
        match self.load(ticker).await {
            Some(session) => self.ask(&session, question).await,
            None => messages::retrieval_failed(ticker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filing::MockFilingSource;
    use crate::qa::scorer::{MockAnswerScorer, ScoredAnswer};
    use mockall::predicate::*;

    const FILING: &str = "<html><body>\
        <p>ITEM 1A. RISK FACTORS</p><p>We face intense competition.</p>\
        <p>ITEM 1B. UNRESOLVED STAFF COMMENTS</p><p>None.</p>\
        </body></html>";

    fn analyzer(source: MockFilingSource, scorer: MockAnswerScorer) -> FilingAnalyzer {
        FilingAnalyzer::new(&Settings::default(), Arc::new(source), Arc::new(scorer), None)
    }

    #[tokio::test]
    async fn test_answers_from_routed_section() {
        let mut source = MockFilingSource::new();
        source
            .expect_fetch_filing()
            .with(eq("AAPL"))
            .times(1)
            .returning(|_| Ok(Some(FILING.to_string())));

        let mut scorer = MockAnswerScorer::new();
        scorer
            .expect_score_answer()
            .with(always(), eq("We face intense competition."))
            .returning(|_, _| {
                Ok(ScoredAnswer {
                    answer: "intense competition".to_string(),
                    score: 0.8,
                })
            });

        let answer = analyzer(source, scorer)
            .answer_for_ticker("AAPL", "What are the main risk factors?")
            .await;
        assert_eq!(answer, "intense competition");
    }

    #[tokio::test]
    async fn test_unknown_ticker_reports_retrieval_failure() {
        let mut source = MockFilingSource::new();
        source.expect_fetch_filing().returning(|_| Ok(None));
        let mut scorer = MockAnswerScorer::new();
        scorer.expect_score_answer().never();

        let answer = analyzer(source, scorer)
            .answer_for_ticker("zzzz", "What is the debt?")
            .await;
        assert_eq!(
            answer,
            "Could not retrieve SEC filing for ZZZZ. Please check the ticker symbol and try again."
        );
    }

    #[tokio::test]
    async fn test_fetch_error_reports_retrieval_failure() {
        let mut source = MockFilingSource::new();
        source
            .expect_fetch_filing()
            .returning(|_| Err(anyhow::anyhow!("503 Service Unavailable")));

        let answer = analyzer(source, MockAnswerScorer::new())
            .answer_for_ticker("MSFT", "q?")
            .await;
        assert_eq!(answer, messages::retrieval_failed("MSFT"));
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected_before_context() {
        let mut scorer = MockAnswerScorer::new();
        scorer.expect_score_answer().never();
        let analyzer = analyzer(MockFilingSource::new(), scorer);

        let empty = analyzer.process_filing("");
        assert_eq!(analyzer.ask(&empty, "  ").await, messages::NO_QUESTION);
        assert_eq!(analyzer.ask(&empty, "What?").await, messages::NO_CONTEXT);
    }
}
