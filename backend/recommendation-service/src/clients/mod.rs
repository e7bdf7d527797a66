pub mod embedding;
pub mod qdrant;

pub use embedding::{EmbeddingClient, HttpEmbeddingClient};
pub use qdrant::{QdrantIndex, VectorIndex};
