use crate::error::Result;
use crate::types::{BackendHit, Embedding, SearchFilter, VectorRecord};

/// Text-to-vector collaborator injected into the search facade.
///
/// Implementations must return vectors of length `dim()` for every input,
/// including the empty string.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Narrow capability surface over a vector index.
///
/// `query` must apply `filter` before similarity ranking and return hits
/// best-first. Driver failures surface as `Error::BackendUnavailable`.
pub trait VectorBackend: Send + Sync {
    fn name(&self) -> &str;
    fn dim(&self) -> usize;
    fn upsert(&mut self, records: Vec<VectorRecord>) -> Result<()>;
    /// Swap the whole collection for `records`. On error the previous
    /// contents must still be in place.
    fn replace(&mut self, records: Vec<VectorRecord>) -> Result<()>;
    fn query(&self, vector: &Embedding, limit: usize, filter: &SearchFilter) -> Result<Vec<BackendHit>>;
    fn clear(&mut self) -> Result<()>;
    fn len(&self) -> Result<usize>;
}

impl<B: VectorBackend + ?Sized> VectorBackend for Box<B> {
    fn name(&self) -> &str { (**self).name() }
    fn dim(&self) -> usize { (**self).dim() }
    fn upsert(&mut self, records: Vec<VectorRecord>) -> Result<()> { (**self).upsert(records) }
    fn replace(&mut self, records: Vec<VectorRecord>) -> Result<()> { (**self).replace(records) }
    fn query(&self, vector: &Embedding, limit: usize, filter: &SearchFilter) -> Result<Vec<BackendHit>> {
        (**self).query(vector, limit, filter)
    }
    fn clear(&mut self) -> Result<()> { (**self).clear() }
    fn len(&self) -> Result<usize> { (**self).len() }
}
