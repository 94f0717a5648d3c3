pub mod chunker;
pub mod normalizer;
pub mod sections;

pub use chunker::{Chunk, TextChunker};
pub use normalizer::{NormalizedText, ParseMode, TextNormalizer};
pub use sections::{
    PatternBoundaryStrategy, SectionBoundaryStrategy, SectionExtractor, SectionKind, SectionMap,
    SectionSpan,
};
