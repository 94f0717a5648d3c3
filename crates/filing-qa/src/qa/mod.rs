pub mod context;
pub mod messages;
pub mod resolver;
pub mod scorer;

pub use context::{ContextSelector, RankedChunk};
pub use resolver::{AnswerCandidate, AnswerResolver, Resolution};
pub use scorer::{AnswerScorer, HttpAnswerScorer, ScoredAnswer};
