//! Two-signal rank fusion.
//!
//! Semantic and lexical scores are normalized independently across the
//! candidate set, then blended as `alpha * semantic + (1 - alpha) * lexical`.
use std::cmp::Ordering;

use passage_core::config::{validate_alpha, SearchSettings};
use passage_core::{Chunk, Result, ScoredChunk, TieBreak};
use passage_text::LexicalScorer;

use crate::normalize::normalize;

/// Fuse `(chunk, raw semantic score)` candidates with lexical relevance to
/// `query` and keep the best `k`. Exact ties keep candidate order.
pub fn rank(candidates: Vec<(Chunk, f32)>, query: &str, alpha: f32, k: usize) -> Result<Vec<ScoredChunk>> {
    Ok(HybridRanker::new(alpha, TieBreak::ArrivalOrder)?.rank(candidates, query, k))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridRanker {
    alpha: f32,
    tie_break: TieBreak,
}

impl HybridRanker {
    pub fn new(alpha: f32, tie_break: TieBreak) -> Result<Self> {
        validate_alpha(alpha)?;
        Ok(Self { alpha, tie_break })
    }

    pub fn from_settings(settings: &SearchSettings) -> Result<Self> {
        Self::new(settings.alpha, settings.tie_break)
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    pub fn rank(&self, candidates: Vec<(Chunk, f32)>, query: &str, k: usize) -> Vec<ScoredChunk> {
        if k == 0 || candidates.is_empty() {
            return Vec::new();
        }
        let raw_semantic: Vec<f32> = candidates.iter().map(|(_, s)| *s).collect();
        let scorer = LexicalScorer::new(query);
        let raw_lexical: Vec<f32> = candidates.iter().map(|(c, _)| scorer.score(&c.text)).collect();
        let semantic = normalize(&raw_semantic);
        let lexical = normalize(&raw_lexical);

        let mut scored: Vec<ScoredChunk> = candidates
            .into_iter()
            .zip(semantic.into_iter().zip(lexical))
            .map(|((chunk, _), (semantic, lexical))| ScoredChunk {
                chunk,
                score: self.alpha * semantic + (1.0 - self.alpha) * lexical,
                semantic,
                lexical,
            })
            .collect();

        // sort_by is stable: ArrivalOrder falls out of leaving ties Equal
        let by_score = |a: &ScoredChunk, b: &ScoredChunk| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal);
        match self.tie_break {
            TieBreak::ArrivalOrder => scored.sort_by(by_score),
            TieBreak::ChunkId => scored.sort_by(|a, b| by_score(a, b).then_with(|| a.chunk.id.cmp(&b.chunk.id))),
        }
        scored.truncate(k);
        scored
    }
}
