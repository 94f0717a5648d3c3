pub mod llama_server;
pub mod provider;

pub use llama_server::LlamaEmbeddingClient;
pub use provider::EmbeddingProvider;

#[cfg(test)]
pub use provider::MockEmbeddingProvider;
