//! Domain types shared by the segmenter, the backends and the hybrid ranker.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

pub type ChunkId = String;
pub type Meta = BTreeMap<String, String>;

/// Metadata key stamped on every chunk with its 0-based position in the document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// A source document as produced by a loader.
///
/// Documents are consumed only by the segmenter; nothing downstream keeps
/// a reference to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: Meta,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: Meta::new() }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A bounded slice of a document, the unit of indexing and retrieval.
///
/// - `id`: `<document_id>::chunk<index>`
/// - `text`: one or more paragraphs joined by a blank line
/// - `metadata`: the parent document's metadata plus `chunk_index`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub metadata: Meta,
}

impl Chunk {
    pub fn chunk_id(document_id: &str, index: usize) -> ChunkId {
        format!("{document_id}::chunk{index}")
    }

    /// Position of this chunk in its parent document, if stamped.
    pub fn index(&self) -> Option<usize> {
        self.metadata.get(CHUNK_INDEX_KEY).and_then(|v| v.parse().ok())
    }

    /// Parent document id recovered from the chunk id.
    pub fn document_id(&self) -> &str {
        self.id.rsplit_once("::chunk").map_or(self.id.as_str(), |(doc, _)| doc)
    }
}

/// A chunk paired with its fused relevance score. Query-time only.
///
/// `semantic` and `lexical` are the normalized component signals that
/// produced `score`; both lie in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
    pub semantic: f32,
    pub lexical: f32,
}

/// Exact-match conjunction over chunk metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchFilter(BTreeMap<String, String>);

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Every condition must hold; a missing key never matches.
    pub fn matches(&self, metadata: &Meta) -> bool {
        self.0.iter().all(|(k, v)| metadata.get(k) == Some(v))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SearchFilter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A dense vector whose length has been checked against a collection dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Validate `values` against the expected dimension and reject NaN/inf.
    pub fn new(values: Vec<f32>, dim: usize) -> Result<Self> {
        if values.len() != dim {
            return Err(Error::InvalidVector { expected: dim, actual: values.len() });
        }
        if let Some(position) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::NonFiniteVector { position });
        }
        Ok(Self(values))
    }

    pub fn zeros(dim: usize) -> Self {
        Self(vec![0.0; dim])
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

/// What a backend stores per chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub chunk: Chunk,
    pub vector: Embedding,
}

/// A raw candidate returned by a backend. `score` is backend-specific,
/// higher is better.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// Similarity used by backends that compute it themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    #[default]
    Cosine,
    Dot,
}

/// Secondary ordering for candidates whose fused scores are exactly equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep the order in which the backend returned the candidates.
    #[default]
    ArrivalOrder,
    /// Order ties by ascending chunk id.
    ChunkId,
}
