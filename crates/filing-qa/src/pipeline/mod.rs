pub mod analyzer;
pub mod session;

pub use analyzer::FilingAnalyzer;
pub use session::FilingSession;
