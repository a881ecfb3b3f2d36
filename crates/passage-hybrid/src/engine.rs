//! Index/search facade over an injected backend and embedder.
//!
//! Writers (`index`, `reindex`, `clear`) take the collection's write lock;
//! searches share the read lock. Embedding always runs before a lock is taken.
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use parking_lot::RwLock;
use tracing::{debug, info};

use passage_core::config::SearchSettings;
use passage_core::{Chunk, Embedder, Embedding, Error, Result, ScoredChunk, SearchFilter, VectorBackend, VectorRecord};

use crate::rank::HybridRanker;

pub struct HybridIndex<B: VectorBackend> {
    backend: RwLock<B>,
    embedder: Arc<dyn Embedder>,
    ranker: HybridRanker,
    settings: SearchSettings,
}

impl<B: VectorBackend> HybridIndex<B> {
    pub fn new(backend: B, embedder: Arc<dyn Embedder>, settings: SearchSettings) -> Result<Self> {
        settings.validate()?;
        if embedder.dim() != backend.dim() {
            return Err(Error::InvalidConfig(format!(
                "embedder produces {}-dimensional vectors but collection '{}' holds {}",
                embedder.dim(),
                backend.name(),
                backend.dim()
            )));
        }
        let ranker = HybridRanker::from_settings(&settings)?;
        Ok(Self { backend: RwLock::new(backend), embedder, ranker, settings })
    }

    pub fn dim(&self) -> usize {
        self.embedder.dim()
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Make `pairs` searchable. Any bad vector rejects the whole call and
    /// leaves the collection untouched.
    pub fn index(&self, pairs: Vec<(Chunk, Vec<f32>)>) -> Result<()> {
        let records = self.records(pairs)?;
        let count = records.len();
        let started = Instant::now();
        let mut backend = self.backend.write();
        backend.upsert(records)?;
        debug!(collection = backend.name(), count, elapsed_ms = started.elapsed().as_millis() as u64, "indexed chunks");
        Ok(())
    }

    /// Embed chunk texts with the injected embedder, then [`index`](Self::index) them.
    pub fn index_chunks(&self, chunks: Vec<Chunk>) -> Result<()> {
        let pairs = self.embed_chunks(chunks)?;
        self.index(pairs)
    }

    pub fn embed_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<(Chunk, Vec<f32>)>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).map_err(Error::Embedding)?;
        if vectors.len() != chunks.len() {
            return Err(Error::embedding(anyhow!("embedder returned {} vectors for {} texts", vectors.len(), chunks.len())));
        }
        Ok(chunks.into_iter().zip(vectors).collect())
    }

    /// Replace the whole collection with `pairs` under one write lock.
    /// A failed rebuild leaves the previous collection searchable.
    pub fn reindex(&self, pairs: Vec<(Chunk, Vec<f32>)>) -> Result<()> {
        let records = self.records(pairs)?;
        let count = records.len();
        let mut backend = self.backend.write();
        backend.replace(records)?;
        info!(collection = backend.name(), count, "collection rebuilt");
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.backend.write().clear()
    }

    /// Embed `query` and run [`search_with_vector`](Self::search_with_vector).
    pub fn search(&self, query: &str, k: usize, filter: &SearchFilter) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(query).map_err(Error::Embedding)?;
        self.search_with_vector(query, &vector, k, filter)
    }

    /// Top-`k` chunks matching `filter`, best first. `query` drives the
    /// lexical signal, `vector` the semantic candidate pool.
    pub fn search_with_vector(&self, query: &str, vector: &[f32], k: usize, filter: &SearchFilter) -> Result<Vec<ScoredChunk>> {
        let vector = Embedding::new(vector.to_vec(), self.dim())?;
        if k == 0 {
            return Ok(Vec::new());
        }
        let pool = self.settings.candidate_pool(k);
        let started = Instant::now();
        let hits = self.backend.read().query(&vector, pool, filter)?;
        let candidates: Vec<(Chunk, f32)> = hits.into_iter().map(|h| (h.chunk, h.score)).collect();
        let candidate_count = candidates.len();
        let ranked = self.ranker.rank(candidates, query, k);
        debug!(
            k,
            pool,
            candidates = candidate_count,
            returned = ranked.len(),
            filters = filter.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "hybrid search"
        );
        Ok(ranked)
    }

    pub fn len(&self) -> Result<usize> {
        self.backend.read().len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn records(&self, pairs: Vec<(Chunk, Vec<f32>)>) -> Result<Vec<VectorRecord>> {
        let dim = self.dim();
        pairs
            .into_iter()
            .map(|(chunk, values)| Ok(VectorRecord { vector: Embedding::new(values, dim)?, chunk }))
            .collect()
    }
}
