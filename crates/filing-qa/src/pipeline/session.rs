use tracing::{debug, info};

use crate::document::{NormalizedText, SectionExtractor, SectionMap, TextNormalizer};

/// A filing normalized and split into sections once, then queried any number of times.
#[derive(Debug, Clone, Default)]
pub struct FilingSession {
    text: NormalizedText,
    sections: SectionMap,
}

impl FilingSession {
    pub fn from_raw(raw: &str, normalizer: &TextNormalizer, extractor: &SectionExtractor) -> Self {
        let text = normalizer.normalize(raw);
        let sections = extractor.extract_sections(&text);
        for (kind, body) in sections.iter() {
            debug!(section = %kind, chars = body.len(), "Session section");
        }

        info!(
            text_chars = text.len(),
            sections = sections.len(),
            "Prepared filing session"
        );

        Self { text, sections }
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    pub fn sections(&self) -> &SectionMap {
        &self.sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SectionKind;

    #[test]
    fn test_session_holds_text_and_sections() {
        let raw = "<html><body><p>ITEM 1A. RISK FACTORS</p><p>We face competition...</p><p>ITEM 1B. UNRESOLVED STAFF COMMENTS</p></body></html>";
        let session = FilingSession::from_raw(raw, &TextNormalizer::new(), &SectionExtractor::default());

        assert!(session.text().starts_with("ITEM 1A. RISK FACTORS\n"));
        assert_eq!(
            session.sections().get(SectionKind::RiskFactors),
            Some("We face competition...")
        );
    }

    #[test]
    fn test_empty_filing_gives_empty_session() {
        let session = FilingSession::from_raw("", &TextNormalizer::new(), &SectionExtractor::default());
        assert!(session.text().is_empty());
        assert!(session.sections().is_empty());
    }
}
