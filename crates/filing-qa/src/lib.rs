pub mod config;
pub mod document;
pub mod embedding;
pub mod filing;
pub mod pipeline;
pub mod qa;
pub mod utils;

pub use config::Settings;
pub use pipeline::{FilingAnalyzer, FilingSession};
pub use utils::error::QaError;

/// Example questions offered by the CLI.
pub const PRESET_QUESTIONS: [&str; 6] = [
    "What is the company's debt situation?",
    "What are the main risk factors?",
    "How is their liquidity position?",
    "What are their major financial challenges?",
    "Are there any going concern issues?",
    "What is their cash flow situation?",
];
