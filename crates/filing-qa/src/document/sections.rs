//! Named-section extraction from normalized filing text.
//!
//! Boundary detection sits behind [`SectionBoundaryStrategy`]. The default
//! [`PatternBoundaryStrategy`] tries an ordered pattern list per section,
//! takes the last occurrence of the first pattern that matches (tables of
//! contents repeat headings ahead of the real body), and ends the section
//! at the earliest generic `Item N` / `PART N` marker that follows.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::normalizer::collapse_whitespace;
use crate::utils::error::QaError;

/// Longest heading remainder (after the matched marker) dropped along with the marker.
const MAX_HEADING_TAIL_CHARS: usize = 120;

const RISK_FACTOR_PATTERNS: &[&str] = &[
    r"Item\s*1A\.?\s*Risk\s*Factors",
    r"ITEM\s*1A\s*[-–—:]\s*RISK\s*FACTORS",
    r"Risk\s*Factors",
];

const MDA_PATTERNS: &[&str] = &[
    r"Item\s*7\.?\s*Management['’]s\s*Discussion\s*and\s*Analysis",
    r"ITEM\s*7\s*[-–—:]\s*MANAGEMENT['’]S\s*DISCUSSION",
    r"Management['’]s\s*Discussion\s*and\s*Analysis",
];

const LIQUIDITY_PATTERNS: &[&str] = &[
    r"Liquidity\s*and\s*Capital\s*Resources",
    r"Item\s*7\.?\s*Liquidity",
    r"Capital\s*Resources\s*and\s*Liquidity",
];

const NEXT_SECTION_PATTERNS: &[&str] = &[
    r"\bItem\s*\d+[A-Z]?\b\.?",
    r"\bPART\s+[IVX]+\b",
];

static DEFAULT_STRATEGY: Lazy<PatternBoundaryStrategy> = Lazy::new(|| {
    PatternBoundaryStrategy::new(
        &[
            (SectionKind::RiskFactors, RISK_FACTOR_PATTERNS),
            (SectionKind::Mda, MDA_PATTERNS),
            (SectionKind::Liquidity, LIQUIDITY_PATTERNS),
        ],
        NEXT_SECTION_PATTERNS,
    )
    .expect("built-in section patterns compile")
});

/// The closed set of sections the extractor looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    RiskFactors,
    Mda,
    Liquidity,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [
        SectionKind::RiskFactors,
        SectionKind::Mda,
        SectionKind::Liquidity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::RiskFactors => "risk_factors",
            SectionKind::Mda => "mda",
            SectionKind::Liquidity => "liquidity",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = QaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "risk_factors" => Ok(SectionKind::RiskFactors),
            "mda" => Ok(SectionKind::Mda),
            "liquidity" => Ok(SectionKind::Liquidity),
            other => Err(QaError::InvalidInput(format!("unknown section '{}'", other))),
        }
    }
}

/// Section name to body text. Absent sections are simply missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionMap(BTreeMap<SectionKind, String>);

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: SectionKind, text: String) {
        self.0.insert(kind, text);
    }

    pub fn get(&self, kind: SectionKind) -> Option<&str> {
        self.0.get(&kind).map(String::as_str)
    }

    pub fn contains(&self, kind: SectionKind) -> bool {
        self.0.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sections in fixed `SectionKind` order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionKind, &str)> {
        self.0.iter().map(|(kind, text)| (*kind, text.as_str()))
    }

    pub fn joined(&self, separator: &str) -> String {
        self.0
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl FromIterator<(SectionKind, String)> for SectionMap {
    fn from_iter<T: IntoIterator<Item = (SectionKind, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Byte offsets of a located section within the searched text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan {
    /// Start of the heading marker.
    pub marker_start: usize,
    /// End of the heading marker; the body begins here.
    pub marker_end: usize,
    /// Exclusive end of the section body.
    pub end: usize,
}

/// Locates section boundaries. Swap implementations to change the heuristic
/// without touching the rest of the pipeline.
pub trait SectionBoundaryStrategy: Send + Sync {
    fn locate(&self, text: &str, kind: SectionKind) -> Result<Option<SectionSpan>, QaError>;
}

#[derive(Debug, Clone)]
pub struct PatternBoundaryStrategy {
    section_patterns: Vec<(SectionKind, Vec<Regex>)>,
    next_section_patterns: Vec<Regex>,
}

impl PatternBoundaryStrategy {
    /// Compiles the pattern lists case-insensitively. List order is priority order.
    pub fn new(
        section_patterns: &[(SectionKind, &[&str])],
        next_section_patterns: &[&str],
    ) -> Result<Self, QaError> {
        let section_patterns = section_patterns
            .iter()
            .map(|(kind, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|pattern| compile(pattern))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((*kind, compiled))
            })
            .collect::<Result<Vec<_>, QaError>>()?;

        let next_section_patterns = next_section_patterns
            .iter()
            .map(|pattern| compile(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            section_patterns,
            next_section_patterns,
        })
    }

    fn patterns_for(&self, kind: SectionKind) -> &[Regex] {
        self.section_patterns
            .iter()
            .find(|(candidate, _)| *candidate == kind)
            .map(|(_, patterns)| patterns.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for PatternBoundaryStrategy {
    fn default() -> Self {
        DEFAULT_STRATEGY.clone()
    }
}

impl SectionBoundaryStrategy for PatternBoundaryStrategy {
    fn locate(&self, text: &str, kind: SectionKind) -> Result<Option<SectionSpan>, QaError> {
        let Some(marker) = self
            .patterns_for(kind)
            .iter()
            .find_map(|pattern| pattern.find_iter(text).last())
        else {
            return Ok(None);
        };

        let end = self
            .next_section_patterns
            .iter()
            .filter_map(|pattern| pattern.find_at(text, marker.end()))
            .map(|next| next.start())
            .min()
            .unwrap_or(text.len());

        Ok(Some(SectionSpan {
            marker_start: marker.start(),
            marker_end: marker.end(),
            end,
        }))
    }
}

fn compile(pattern: &str) -> Result<Regex, QaError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .map_err(QaError::from)
}

pub struct SectionExtractor {
    strategy: Box<dyn SectionBoundaryStrategy>,
}

impl SectionExtractor {
    pub fn new(strategy: Box<dyn SectionBoundaryStrategy>) -> Self {
        Self { strategy }
    }

    /// Builds the section map for one document. A failure for one section
    /// only drops that section.
    pub fn extract_sections(&self, text: &str) -> SectionMap {
        let mut sections = SectionMap::new();

        if text.trim().is_empty() {
            warn!("No text provided for section extraction");
            return sections;
        }

        for kind in SectionKind::ALL {
            match self.extract_section(text, kind) {
                Ok(Some(body)) => {
                    info!(section = %kind, chars = body.len(), "Found section");
                    sections.insert(kind, body);
                }
                Ok(None) => {
                    warn!(section = %kind, "Could not find section");
                }
                Err(e) => {
                    warn!(section = %kind, error = %e, "Section extraction failed");
                }
            }
        }

        sections
    }

    pub fn extract_section(&self, text: &str, kind: SectionKind) -> Result<Option<String>, QaError> {
        let Some(span) = self.strategy.locate(text, kind)? else {
            return Ok(None);
        };

        if span.marker_start > span.marker_end || span.marker_end > span.end {
            return Err(QaError::ParsingError(format!(
                "inverted span {:?} for section {}",
                span, kind
            )));
        }
        let body = text.get(span.marker_end..span.end).ok_or_else(|| {
            QaError::ParsingError(format!(
                "span {:?} is out of bounds for section {}",
                span, kind
            ))
        })?;

        let heading_at_line_start = text
            .get(..span.marker_start)
            .unwrap_or_default()
            .chars()
            .rev()
            .take_while(|ch| *ch != '\n')
            .all(char::is_whitespace);
        let body = if heading_at_line_start {
            strip_heading_tail(body)
        } else {
            body
        };

        let cleaned = collapse_whitespace(body);
        if cleaned.is_empty() {
            debug!(section = %kind, "Extracted section is empty");
            return Ok(None);
        }

        Ok(Some(cleaned))
    }
}

impl Default for SectionExtractor {
    fn default() -> Self {
        Self::new(Box::new(PatternBoundaryStrategy::default()))
    }
}

/// Drops the remainder of the heading line, e.g. "of Financial Condition and
/// Results of Operations" after an `Item 7` marker.
fn strip_heading_tail(body: &str) -> &str {
    match body.find('\n') {
        Some(pos) if body[..pos].chars().count() <= MAX_HEADING_TAIL_CHARS => &body[pos + 1..],
        _ => body,
    }
}
