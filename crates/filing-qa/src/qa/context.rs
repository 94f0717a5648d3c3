//! Chooses the passage handed to the QA model for a question.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ContextConfig;
use crate::document::{Chunk, SectionKind, SectionMap, TextChunker};
use crate::embedding::EmbeddingProvider;
use crate::utils::similarity::dot_product;

/// Keyword routes, tried in order. A route fires when any keyword is a
/// substring of the lowercased question.
const KEYWORD_ROUTES: &[(SectionKind, &[&str])] = &[
    (
        SectionKind::RiskFactors,
        &["risk", "threat", "warning", "concern", "adverse"],
    ),
    (
        SectionKind::Liquidity,
        &["liquidity", "cash", "capital", "debt", "funding"],
    ),
    (
        SectionKind::Mda,
        &["management", "performance", "financial", "operation", "revenue"],
    ),
];

const SECTION_SEPARATOR: &str = "\n\n";

/// A chunk and its similarity to the question.
#[derive(Debug, Clone, Serialize)]
pub struct RankedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

pub struct ContextSelector {
    max_fallback_chars: usize,
    chunker: TextChunker,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
}

impl ContextSelector {
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            max_fallback_chars: config.max_fallback_chars,
            chunker: TextChunker::word_windows(config.word_window, config.word_overlap),
            embedder: None,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Section routing by keyword, then all sections joined, then the head of
    /// the raw text. `None` only when every source is empty.
    pub fn select_context(
        &self,
        sections: &SectionMap,
        raw_text: &str,
        question: &str,
    ) -> Option<String> {
        let question_lower = question.to_lowercase();

        for (kind, keywords) in KEYWORD_ROUTES {
            if !keywords.iter().any(|keyword| question_lower.contains(keyword)) {
                continue;
            }
            match sections.get(*kind) {
                Some(text) => {
                    debug!(section = %kind, "Routed question to section");
                    return Some(text.to_string());
                }
                None => debug!(section = %kind, "Routed section not available"),
            }
        }

        let joined = sections.joined(SECTION_SEPARATOR);
        if !joined.trim().is_empty() {
            debug!(sections = sections.len(), "Using all extracted sections as context");
            return Some(joined);
        }

        if raw_text.trim().is_empty() {
            return None;
        }

        warn!(
            max_chars = self.max_fallback_chars,
            "No sections extracted, falling back to raw filing text"
        );
        Some(raw_text.chars().take(self.max_fallback_chars).collect())
    }

    /// Highest dot-product chunk of `text` against the question embedding.
    /// Chunks that fail to embed are skipped; ties keep the earlier chunk.
    pub async fn rank_chunks(&self, text: &str, question: &str) -> Option<RankedChunk> {
        let embedder = self.embedder.as_ref()?;

        let question_embedding = match embedder.embed(question).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "Failed to embed question, skipping ranking");
                return None;
            }
        };

        let mut best: Option<RankedChunk> = None;
        for chunk in self.chunker.chunk(text) {
            let embedding = match embedder.embed(&chunk.content).await {
                Ok(embedding) => embedding,
                Err(e) => {
                    warn!(chunk_index = chunk.index, error = %e, "Failed to embed chunk");
                    continue;
                }
            };

            let score = match dot_product(&question_embedding, &embedding) {
                Ok(score) if score.is_finite() => score,
                Ok(_) => continue,
                Err(e) => {
                    warn!(chunk_index = chunk.index, error = %e, "Failed to score chunk");
                    continue;
                }
            };

            if best.as_ref().map_or(true, |current| score > current.score) {
                best = Some(RankedChunk { chunk, score });
            }
        }

        if let Some(ranked) = &best {
            debug!(
                chunk_index = ranked.chunk.index,
                score = ranked.score,
                "Selected best matching chunk"
            );
        }
        best
    }

    /// Routed context, narrowed to its best-matching chunk whenever an
    /// embedder is attached.
    pub async fn select(
        &self,
        sections: &SectionMap,
        raw_text: &str,
        question: &str,
    ) -> Option<String> {
        let context = self.select_context(sections, raw_text, question)?;

        if self.embedder.is_none() {
            return Some(context);
        }

        match self.rank_chunks(&context, question).await {
            Some(ranked) => {
                info!(score = ranked.score, "Narrowed context by semantic ranking");
                Some(ranked.chunk.content)
            }
            None => Some(context),
        }
    }
}
