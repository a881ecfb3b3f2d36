//! Shared foundation for the passage retrieval workspace: domain types,
//! the error taxonomy, collaborator traits, configuration and loading.
pub mod config;
pub mod error;
pub mod loader;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{Embedder, VectorBackend};
pub use types::{BackendHit, Chunk, ChunkId, Distance, Document, Embedding, Meta, ScoredChunk, SearchFilter, TieBreak, VectorRecord};
