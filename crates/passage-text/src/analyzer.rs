use std::sync::OnceLock;

use tantivy::tokenizer::{LowerCaser, RegexTokenizer, TextAnalyzer, TokenStream};

/// Maximal runs of word characters (Unicode alphanumerics plus underscore).
pub const WORD_PATTERN: &str = r"\w+";

pub fn build_word_analyzer() -> tantivy::Result<TextAnalyzer> {
	let tokenizer = RegexTokenizer::new(WORD_PATTERN)?;
	Ok(TextAnalyzer::builder(tokenizer).filter(LowerCaser).build())
}

/// Shared analyzer; `TextAnalyzer` needs `&mut` to stream, so callers get a clone.
pub fn word_analyzer() -> TextAnalyzer {
	static ANALYZER: OnceLock<TextAnalyzer> = OnceLock::new();
	ANALYZER
		.get_or_init(|| build_word_analyzer().expect("WORD_PATTERN is a valid regex"))
		.clone()
}

/// Run `analyzer` over `text` and collect the emitted terms in order.
pub fn analyze(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
	let mut stream = analyzer.token_stream(text);
	let mut terms = Vec::new();
	while stream.advance() {
		terms.push(stream.token().text.clone());
	}
	terms
}
