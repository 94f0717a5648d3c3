pub mod error;
pub mod logger;
pub mod similarity;

pub use error::QaError;
pub use similarity::dot_product;
