//! passage-hybrid
//!
//! Score normalization, two-signal rank fusion, and the [`HybridIndex`]
//! facade that ties a vector backend, an embedder and the ranker together.
pub mod engine;
pub mod normalize;
pub mod rank;

pub use engine::HybridIndex;
pub use normalize::normalize;
pub use rank::{rank, HybridRanker};
