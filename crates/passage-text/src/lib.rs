//! passage-text
//!
//! Text-side algorithms: paragraph segmentation with overlap, and the
//! tantivy-analyzed tokenizer behind the term-frequency lexical scorer.
pub mod analyzer;
pub mod lexical;
pub mod segment;

pub use lexical::{lexical_score, tokenize, LexicalScorer};
pub use segment::{paragraphs, segment, segment_many, Segmenter};
