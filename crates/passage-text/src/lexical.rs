//! Term-frequency lexical relevance.
//!
//! The score of a text for a query is the sum, over every query token
//! (repeats included), of how often that token occurs in the text.
use std::collections::HashMap;

use crate::analyzer::{analyze, word_analyzer};

/// Lowercased maximal word-character runs; punctuation and whitespace are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
	if text.is_empty() { return Vec::new(); }
	analyze(&mut word_analyzer(), text)
}

/// One-shot form of [`LexicalScorer::score`].
pub fn lexical_score(text: &str, query: &str) -> f32 {
	LexicalScorer::new(query).score(text)
}

/// Scores many texts against one pre-tokenized query.
#[derive(Debug, Clone)]
pub struct LexicalScorer {
	query_tokens: Vec<String>,
}

impl LexicalScorer {
	pub fn new(query: &str) -> Self {
		Self { query_tokens: tokenize(query) }
	}

	pub fn query_tokens(&self) -> &[String] {
		&self.query_tokens
	}

	pub fn score(&self, text: &str) -> f32 {
		if self.query_tokens.is_empty() { return 0.0; }
		let text_tokens = tokenize(text);
		if text_tokens.is_empty() { return 0.0; }
		let tf = term_frequencies(&text_tokens);
		let total: usize = self.query_tokens.iter().map(|t| tf.get(t.as_str()).copied().unwrap_or(0)).sum();
		total as f32
	}
}

fn term_frequencies(tokens: &[String]) -> HashMap<&str, usize> {
	let mut tf = HashMap::with_capacity(tokens.len());
	for t in tokens {
		*tf.entry(t.as_str()).or_insert(0) += 1;
	}
	tf
}
