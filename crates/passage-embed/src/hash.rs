use std::hash::{Hash, Hasher};

use anyhow::Result;
use twox_hash::XxHash64;

use passage_core::Embedder;

/// Deterministic bag-of-words embedder based on feature hashing.
///
/// Each lowercased word bumps one bucket of the output; the result is
/// L2-normalized. Text without words maps to the all-zero vector.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn bucket(&self, word: &str) -> usize {
        let mut hasher = XxHash64::with_seed(0);
        word.hash(&mut hasher);
        (hasher.finish() % self.dim as u64) as usize
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0f32; self.dim];
        if self.dim == 0 {
            return Ok(v);
        }
        let words = text
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|w| !w.is_empty());
        for word in words {
            let idx = self.bucket(&word.to_lowercase());
            v[idx] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(v)
    }
}
