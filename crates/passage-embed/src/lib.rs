//! Embedding collaborators for the passage facade.
//!
//! [`HashEmbedder`] is always available and deterministic; the `model`
//! feature adds [`BgeEmbedder`], a local BGE-M3 encoder on candle.
use std::sync::Arc;

use passage_core::config::{EmbeddingProvider, EmbeddingSettings};
use passage_core::{Embedder, Error, Result};

mod hash;
pub use hash::HashEmbedder;

#[cfg(feature = "model")]
mod device;
#[cfg(feature = "model")]
mod model;
#[cfg(feature = "model")]
mod pool;
#[cfg(feature = "model")]
mod tokenize;

#[cfg(feature = "model")]
pub use model::{resolve_model_dir, BgeEmbedder};
#[cfg(feature = "model")]
pub use pool::masked_mean_l2;
#[cfg(feature = "model")]
pub use tokenize::encode_padded;

/// `APP_USE_FAKE_EMBEDDINGS=1|true` forces the hashing embedder.
pub fn fake_embeddings_forced() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the embedder described by `settings`.
pub fn embedder_from_settings(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    settings.validate()?;
    if fake_embeddings_forced() || settings.provider == EmbeddingProvider::Hash {
        tracing::info!(dim = settings.dim, "using hashing embedder");
        return Ok(Arc::new(HashEmbedder::new(settings.dim)));
    }
    load_model(settings)
}

#[cfg(feature = "model")]
fn load_model(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    let dir = resolve_model_dir(settings.model_dir.as_deref()).map_err(Error::Embedding)?;
    let model = BgeEmbedder::load(&dir, settings.dim, settings.max_len).map_err(Error::Embedding)?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "model"))]
fn load_model(_settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    Err(Error::InvalidConfig(
        "embedding.provider = \"model\" requires building passage-embed with the `model` feature".into(),
    ))
}
