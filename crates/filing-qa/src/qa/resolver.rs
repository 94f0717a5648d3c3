use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::messages;
use super::scorer::AnswerScorer;
use crate::config::QaConfig;
use crate::document::{Chunk, TextChunker};

/// Best answer seen across the context windows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerCandidate {
    pub text: String,
    pub confidence: f32,
    pub chunk: Chunk,
}

/// Outcome of resolving one question against one context.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    MissingContext,
    MissingQuestion,
    /// Every window failed or produced an empty answer.
    NoAnswer,
    LowConfidence(AnswerCandidate),
    Answered(AnswerCandidate),
}

impl Resolution {
    /// The user-facing reply for this outcome.
    pub fn message(&self) -> String {
        match self {
            Resolution::MissingContext => messages::NO_CONTEXT.to_string(),
            Resolution::MissingQuestion => messages::NO_QUESTION.to_string(),
            Resolution::NoAnswer | Resolution::LowConfidence(_) => {
                messages::NO_CONFIDENT_ANSWER.to_string()
            }
            Resolution::Answered(candidate) => candidate.text.clone(),
        }
    }

    pub fn candidate(&self) -> Option<&AnswerCandidate> {
        match self {
            Resolution::LowConfidence(candidate) | Resolution::Answered(candidate) => {
                Some(candidate)
            }
            _ => None,
        }
    }
}

/// Runs the scorer over overlapping windows of the context and keeps the
/// single most confident answer.
pub struct AnswerResolver {
    scorer: Arc<dyn AnswerScorer>,
    chunker: TextChunker,
    confidence_threshold: f32,
}

impl AnswerResolver {
    pub fn new(scorer: Arc<dyn AnswerScorer>, config: &QaConfig) -> Self {
        Self {
            scorer,
            chunker: TextChunker::char_windows(config.window_size, config.stride),
            confidence_threshold: config.confidence_threshold,
        }
    }

    pub async fn resolve(&self, context: Option<&str>, question: &str) -> Resolution {
        let context = match context {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                debug!("No context available for question");
                return Resolution::MissingContext;
            }
        };
        if question.trim().is_empty() {
            return Resolution::MissingQuestion;
        }

        let chunks = self.chunker.chunk(context);
        let total = chunks.len();
        let mut best: Option<AnswerCandidate> = None;

        for chunk in chunks {
            let scored = match self.scorer.score_answer(question, &chunk.content).await {
                Ok(scored) => scored,
                Err(e) => {
                    warn!(chunk_index = chunk.index, error = %e, "QA model failed on chunk");
                    continue;
                }
            };

            let text = scored.answer.trim();
            if text.is_empty() || !scored.score.is_finite() {
                continue;
            }

            if best
                .as_ref()
                .map_or(true, |current| scored.score > current.confidence)
            {
                best = Some(AnswerCandidate {
                    text: text.to_string(),
                    confidence: scored.score,
                    chunk,
                });
            }
        }

        let Some(candidate) = best else {
            warn!(chunks = total, "No answer produced by any chunk");
            return Resolution::NoAnswer;
        };

        if candidate.confidence < self.confidence_threshold {
            info!(
                confidence = candidate.confidence,
                threshold = self.confidence_threshold,
                "Best answer below confidence threshold"
            );
            return Resolution::LowConfidence(candidate);
        }

        info!(
            confidence = candidate.confidence,
            chunk_index = candidate.chunk.index,
            chunks = total,
            "Resolved answer"
        );
        Resolution::Answered(candidate)
    }

    pub async fn answer(&self, context: Option<&str>, question: &str) -> String {
        self.resolve(context, question).await.message()
    }
}
