use std::collections::HashMap;
use std::sync::Arc;

use passage_core::config::SearchSettings;
use passage_core::{
    BackendHit, Chunk, Distance, Document, Embedder, Embedding, Error, Meta, ScoredChunk, SearchFilter, TieBreak, VectorBackend,
    VectorRecord,
};
use passage_embed::HashEmbedder;
use passage_hybrid::HybridIndex;
use passage_text::segment;
use passage_vector::MemoryBackend;

/// Fixed vectors keyed by exact text; anything else embeds to zeros.
struct StubEmbedder {
    dim: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl StubEmbedder {
    fn new(dim: usize, pairs: &[(&str, Vec<f32>)]) -> Self {
        Self { dim, vectors: pairs.iter().map(|(t, v)| (t.to_string(), v.clone())).collect() }
    }
}

impl Embedder for StubEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(self.vectors.get(text).cloned().unwrap_or_else(|| vec![0.0; self.dim]))
    }
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn dim(&self) -> usize {
        2
    }

    fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        anyhow::bail!("model offline")
    }
}

fn settings(alpha: f32) -> SearchSettings {
    SearchSettings { alpha, ..SearchSettings::default() }
}

fn memory(dim: usize) -> MemoryBackend {
    MemoryBackend::new("test", dim, Distance::Cosine).unwrap()
}

fn ids(hits: &[ScoredChunk]) -> Vec<&str> {
    hits.iter().map(|h| h.chunk.id.as_str()).collect()
}

fn chunk(id: &str, text: &str, source: &str) -> Chunk {
    let mut metadata = Meta::new();
    metadata.insert("source_type".into(), source.into());
    Chunk { id: id.into(), text: text.into(), metadata }
}

fn security_chunks() -> Vec<Chunk> {
    let doc = Document::new("doc", "Para A about security.\n\nPara B about database schema.");
    let chunks = segment(&doc, 30, 10);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].text, "Para A about security.");
    assert!(chunks[1].text.ends_with("Para B about database schema."));
    chunks
}

#[test]
fn keyword_match_wins_when_lexical_weight_dominates() {
    let chunks = security_chunks();
    // the second chunk is the semantically closer one
    let embedder = StubEmbedder::new(
        2,
        &[("security", vec![1.0, 0.0]), (chunks[0].text.as_str(), vec![0.5, 0.5]), (chunks[1].text.as_str(), vec![0.9, 0.1])],
    );
    let embedder: Arc<dyn Embedder> = Arc::new(embedder);

    for alpha in [0.0, 0.2, 0.4] {
        let index = HybridIndex::new(memory(2), embedder.clone(), settings(alpha)).unwrap();
        index.index_chunks(chunks.clone()).unwrap();
        let hits = index.search("security", 2, &SearchFilter::new()).unwrap();
        assert_eq!(ids(&hits), vec!["doc::chunk0", "doc::chunk1"], "alpha {alpha}");
    }

    let semantic = HybridIndex::new(memory(2), embedder, settings(1.0)).unwrap();
    semantic.index_chunks(chunks).unwrap();
    let hits = semantic.search("security", 2, &SearchFilter::new()).unwrap();
    assert_eq!(ids(&hits), vec!["doc::chunk1", "doc::chunk0"]);
}

#[test]
fn keyword_match_wins_with_hashing_embedder() {
    for alpha in [0.0, 0.25, 0.5] {
        let index = HybridIndex::new(memory(384), Arc::new(HashEmbedder::new(384)), settings(alpha)).unwrap();
        index.index_chunks(security_chunks()).unwrap();
        let hits = index.search("security", 5, &SearchFilter::new()).unwrap();
        assert_eq!(ids(&hits), vec!["doc::chunk0", "doc::chunk1"], "alpha {alpha}");
        assert!(hits[0].score > hits[1].score, "alpha {alpha}");
        assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.score)));
    }
}

#[test]
fn filter_restricts_candidates_before_ranking() {
    let index = HybridIndex::new(memory(2), Arc::new(StubEmbedder::new(2, &[])), settings(0.7)).unwrap();
    index
        .index(vec![
            (chunk("web-1", "rust tips", "web"), vec![1.0, 0.0]),
            (chunk("pdf-1", "rust manual", "pdf"), vec![0.0, 1.0]),
            (chunk("pdf-2", "cooking", "pdf"), vec![0.7, 0.7]),
        ])
        .unwrap();

    let pdf = SearchFilter::new().with("source_type", "pdf");
    let hits = index.search_with_vector("rust", &[1.0, 0.0], 1, &pdf).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk.metadata["source_type"], "pdf");

    let none = SearchFilter::new().with("source_type", "book");
    assert!(index.search_with_vector("rust", &[1.0, 0.0], 3, &none).unwrap().is_empty());
}

#[test]
fn empty_collection_and_zero_k_return_nothing() {
    let index = HybridIndex::new(memory(2), Arc::new(StubEmbedder::new(2, &[])), settings(0.7)).unwrap();
    assert!(index.is_empty().unwrap());
    assert!(index.search("anything", 5, &SearchFilter::new()).unwrap().is_empty());

    index.index(vec![(chunk("a", "text", "web"), vec![1.0, 0.0])]).unwrap();
    assert!(index.search("text", 0, &SearchFilter::new()).unwrap().is_empty());
}

#[test]
fn bad_vectors_fail_without_touching_the_collection() {
    let index = HybridIndex::new(memory(2), Arc::new(StubEmbedder::new(2, &[])), settings(0.7)).unwrap();
    index.index(vec![(chunk("a", "alpha", "web"), vec![1.0, 0.0])]).unwrap();

    let err = index
        .index(vec![(chunk("b", "beta", "web"), vec![0.0, 1.0]), (chunk("c", "gamma", "web"), vec![1.0, 0.0, 0.0])])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidVector { expected: 2, actual: 3 }));

    let err = index.index(vec![(chunk("d", "delta", "web"), vec![f32::NAN, 0.0])]).unwrap_err();
    assert!(matches!(err, Error::NonFiniteVector { position: 0 }));

    let err = index.reindex(vec![(chunk("e", "eps", "web"), vec![1.0])]).unwrap_err();
    assert!(err.is_invalid_vector());

    assert_eq!(index.len().unwrap(), 1);
    assert!(index.search_with_vector("alpha", &[1.0], 1, &SearchFilter::new()).is_err());
}

#[test]
fn reindex_replaces_previous_content() {
    let index = HybridIndex::new(memory(2), Arc::new(StubEmbedder::new(2, &[])), settings(0.7)).unwrap();
    index.index(vec![(chunk("old", "old text", "web"), vec![1.0, 0.0])]).unwrap();
    index.reindex(vec![(chunk("new-1", "new text", "web"), vec![1.0, 0.0]), (chunk("new-2", "newer", "web"), vec![0.0, 1.0])]).unwrap();
    assert_eq!(index.len().unwrap(), 2);
    let hits = index.search_with_vector("text", &[1.0, 0.0], 5, &SearchFilter::new()).unwrap();
    assert!(hits.iter().all(|h| h.chunk.id.starts_with("new")));
}

#[test]
fn construction_and_embedding_failures() {
    assert!(matches!(
        HybridIndex::new(memory(3), Arc::new(StubEmbedder::new(2, &[])), settings(0.7)),
        Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(
        HybridIndex::new(memory(2), Arc::new(StubEmbedder::new(2, &[])), settings(1.2)),
        Err(Error::InvalidConfig(_))
    ));

    let index = HybridIndex::new(memory(2), Arc::new(FailingEmbedder), settings(0.7)).unwrap();
    assert!(matches!(index.search("q", 3, &SearchFilter::new()), Err(Error::Embedding(_))));
    assert!(matches!(index.index_chunks(vec![chunk("a", "x", "web")]), Err(Error::Embedding(_))));
    assert!(index.is_empty().unwrap());
}

#[test]
fn chunk_id_tie_break_orders_exact_ties() {
    let mut s = settings(0.7);
    s.tie_break = TieBreak::ChunkId;
    let index = HybridIndex::new(memory(2), Arc::new(StubEmbedder::new(2, &[])), s).unwrap();
    index
        .index(vec![
            (chunk("c", "same", "web"), vec![1.0, 0.0]),
            (chunk("a", "same", "web"), vec![1.0, 0.0]),
            (chunk("b", "same", "web"), vec![1.0, 0.0]),
        ])
        .unwrap();
    let hits = index.search_with_vector("same", &[1.0, 0.0], 3, &SearchFilter::new()).unwrap();
    assert_eq!(ids(&hits), vec!["a", "b", "c"]);
}

#[test]
fn concurrent_readers_never_see_a_partial_rebuild() {
    let index = HybridIndex::new(memory(2), Arc::new(StubEmbedder::new(2, &[])), settings(0.7)).unwrap();
    let generation = |tag: &str| -> Vec<(Chunk, Vec<f32>)> {
        (0..8).map(|i| (chunk(&format!("{tag}-{i}"), "shared words", "web"), vec![1.0, i as f32])).collect()
    };
    index.reindex(generation("g0")).unwrap();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for round in 1..50 {
                index.reindex(generation(&format!("g{round}"))).unwrap();
            }
        });
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..200 {
                    let hits = index.search_with_vector("shared", &[1.0, 0.0], 3, &SearchFilter::new()).unwrap();
                    assert_eq!(hits.len(), 3);
                    let tag = hits[0].chunk.id.split('-').next().unwrap().to_string();
                    assert!(hits.iter().all(|h| h.chunk.id.starts_with(&format!("{tag}-"))));
                }
            });
        }
    });
    assert_eq!(index.len().unwrap(), 8);
}

/// Memory collection whose writes fail, as a dropped backend connection would.
struct UnreachableWrites {
    inner: MemoryBackend,
}

impl VectorBackend for UnreachableWrites {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn upsert(&mut self, _records: Vec<VectorRecord>) -> passage_core::Result<()> {
        Err(Error::backend(anyhow::anyhow!("connection reset")))
    }

    fn replace(&mut self, _records: Vec<VectorRecord>) -> passage_core::Result<()> {
        Err(Error::backend(anyhow::anyhow!("connection reset")))
    }

    fn query(&self, vector: &Embedding, limit: usize, filter: &SearchFilter) -> passage_core::Result<Vec<BackendHit>> {
        self.inner.query(vector, limit, filter)
    }

    fn clear(&mut self) -> passage_core::Result<()> {
        self.inner.clear()
    }

    fn len(&self) -> passage_core::Result<usize> {
        self.inner.len()
    }
}

#[test]
fn failed_rebuild_keeps_the_previous_collection() {
    let mut inner = memory(2);
    inner
        .upsert(vec![VectorRecord {
            chunk: chunk("kept", "kept text", "web"),
            vector: Embedding::new(vec![1.0, 0.0], 2).unwrap(),
        }])
        .unwrap();
    let index = HybridIndex::new(UnreachableWrites { inner }, Arc::new(StubEmbedder::new(2, &[])), settings(0.7)).unwrap();

    let err = index.reindex(vec![(chunk("new", "new text", "web"), vec![0.0, 1.0])]).unwrap_err();
    assert!(matches!(err, Error::BackendUnavailable(_)));
    assert_eq!(index.len().unwrap(), 1);
    let hits = index.search_with_vector("kept", &[1.0, 0.0], 5, &SearchFilter::new()).unwrap();
    assert_eq!(ids(&hits), vec!["kept"]);
}

#[test]
fn huge_dot_products_still_rank_within_unit_range() {
    let backend = MemoryBackend::new("dot", 2, Distance::Dot).unwrap();
    let index = HybridIndex::new(backend, Arc::new(StubEmbedder::new(2, &[])), settings(0.7)).unwrap();
    index
        .index(vec![(chunk("small", "small", "web"), vec![1.0, 0.0]), (chunk("big", "big", "web"), vec![1e20, 0.0])])
        .unwrap();
    let hits = index.search_with_vector("unrelated", &[1e20, 0.0], 2, &SearchFilter::new()).unwrap();
    assert_eq!(ids(&hits), vec!["big", "small"]);
    assert!(hits.iter().all(|h| h.score.is_finite() && (0.0..=1.0).contains(&h.score)));
    assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.semantic)));
    assert_eq!(hits[0].semantic, 1.0);
}
