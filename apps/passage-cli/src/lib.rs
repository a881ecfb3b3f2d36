//! Application layer behind the `passage` binary: argument parsing plus the
//! glue that turns settings into a loaded corpus and a ready search facade.
pub mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use passage_core::config::{expand_path, BackendKind, Settings};
use passage_core::loader::load_text_files;
use passage_core::{Chunk, Embedder, ScoredChunk, SearchFilter, VectorBackend};
use passage_hybrid::HybridIndex;
use passage_text::Segmenter;
use passage_vector::MemoryBackend;

pub type DynIndex = HybridIndex<Box<dyn VectorBackend>>;

const EMBED_BATCH: usize = 64;

pub fn corpus_dir(settings: &Settings, dir: Option<&Path>) -> PathBuf {
    dir.map_or_else(|| expand_path(&settings.data.raw_txt_dir), Path::to_path_buf)
}

/// Load every `.txt` file under `dir` and segment it with the configured budget.
pub fn load_chunks(settings: &Settings, dir: &Path) -> Result<Vec<Chunk>> {
    let documents = load_text_files(dir, &settings.data.source_type)
        .with_context(|| format!("loading documents from {}", dir.display()))?;
    let segmenter = Segmenter::new(settings.chunking)?;
    let chunks = segmenter.segment_many(&documents);
    tracing::info!(documents = documents.len(), chunks = chunks.len(), dir = %dir.display(), "segmented corpus");
    Ok(chunks)
}

pub fn open_backend(settings: &Settings) -> Result<Box<dyn VectorBackend>> {
    match settings.index.backend {
        BackendKind::Memory => Ok(Box::new(MemoryBackend::new(
            settings.index.collection.as_str(),
            settings.embedding.dim,
            settings.index.distance,
        )?)),
        BackendKind::Lance => open_lance(settings),
    }
}

#[cfg(feature = "lance")]
fn open_lance(settings: &Settings) -> Result<Box<dyn VectorBackend>> {
    let uri = expand_path(&settings.index.lance_uri);
    std::fs::create_dir_all(&uri).with_context(|| format!("creating {}", uri.display()))?;
    let backend = passage_vector::LanceBackend::open(
        &uri.to_string_lossy(),
        &settings.index.collection,
        settings.embedding.dim,
        settings.index.distance,
        settings.index.filter_fields.clone(),
    )?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "lance"))]
fn open_lance(_settings: &Settings) -> Result<Box<dyn VectorBackend>> {
    Err(passage_core::Error::InvalidConfig("index.backend = \"lance\" requires building with the `lance` feature".into()).into())
}

pub fn open_index(settings: &Settings) -> Result<DynIndex> {
    let embedder: Arc<dyn Embedder> = passage_embed::embedder_from_settings(&settings.embedding)?;
    let backend = open_backend(settings)?;
    Ok(HybridIndex::new(backend, embedder, settings.search)?)
}

/// Embed `chunks` in batches, ticking a progress bar on stderr.
pub fn embed_with_progress(index: &DynIndex, chunks: Vec<Chunk>) -> Result<Vec<(Chunk, Vec<f32>)>> {
    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let mut pairs = Vec::with_capacity(chunks.len());
    let mut rest = chunks.into_iter().peekable();
    while rest.peek().is_some() {
        let batch: Vec<Chunk> = rest.by_ref().take(EMBED_BATCH).collect();
        let n = batch.len() as u64;
        pairs.extend(index.embed_chunks(batch)?);
        pb.inc(n);
    }
    pb.finish_with_message("embedded");
    Ok(pairs)
}

/// Load, segment, embed and rebuild the collection. Returns the chunk count.
pub fn ingest(index: &DynIndex, settings: &Settings, dir: &Path) -> Result<usize> {
    let chunks = load_chunks(settings, dir)?;
    let count = chunks.len();
    let pairs = embed_with_progress(index, chunks)?;
    index.reindex(pairs)?;
    Ok(count)
}

pub fn build_filter(pairs: &[(String, String)]) -> SearchFilter {
    pairs.iter().cloned().collect()
}

pub fn format_hit(rank: usize, hit: &ScoredChunk) -> String {
    let preview: String = hit.chunk.text.split_whitespace().collect::<Vec<_>>().join(" ").chars().take(160).collect();
    format!(
        "{rank:>2}. [{:.3}] {} (semantic {:.3}, lexical {:.3})\n    {preview}",
        hit.score, hit.chunk.id, hit.semantic, hit.lexical
    )
}
