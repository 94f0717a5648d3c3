pub mod edgar;
pub mod source;

pub use edgar::{EdgarClient, FilingInfo};
pub use source::FilingSource;

#[cfg(test)]
pub use source::MockFilingSource;
