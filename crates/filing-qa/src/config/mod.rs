pub mod settings;

pub use settings::{ContextConfig, EdgarConfig, EmbeddingConfig, QaConfig, Settings};
