//! Paragraph-preserving segmentation with paragraph-granular overlap.
//!
//! Lengths are counted in chars and include the blank-line separators of
//! the joined chunk text. Paragraphs are never split: one that alone exceeds
//! `max_chars` becomes its own chunk.
use passage_core::config::ChunkingSettings;
use passage_core::types::CHUNK_INDEX_KEY;
use passage_core::{Chunk, Document, Result};

pub const PARAGRAPH_SEPARATOR: &str = "\n\n";
const SEPARATOR_CHARS: usize = 2;

/// Non-blank paragraphs of `text`, trimmed, in document order.
pub fn paragraphs(text: &str) -> impl Iterator<Item = &str> {
	text.split(PARAGRAPH_SEPARATOR).map(str::trim).filter(|p| !p.is_empty())
}

/// Split one document into ordered, overlapping chunks.
///
/// The overlap budget measures the carried paragraphs joined with their
/// separators, and carried paragraphs are dropped from the front when the
/// next paragraph would otherwise push the chunk past `max_chars`.
pub fn segment(document: &Document, max_chars: usize, overlap: usize) -> Vec<Chunk> {
	let mut chunks = Vec::new();
	let mut buffer = Buffer::default();

	for para in paragraphs(&document.text) {
		let len = para.chars().count();
		if !buffer.is_empty() && buffer.len_with(len) > max_chars {
			chunks.push(buffer.to_chunk(document, chunks.len()));
			buffer = buffer.tail_within(overlap);
			while !buffer.is_empty() && buffer.len_with(len) > max_chars {
				buffer.pop_front();
			}
		}
		buffer.push(para, len);
	}
	if !buffer.is_empty() {
		chunks.push(buffer.to_chunk(document, chunks.len()));
	}
	chunks
}

/// Segment each document in order and concatenate; overlap never crosses documents.
pub fn segment_many(documents: &[Document], max_chars: usize, overlap: usize) -> Vec<Chunk> {
	documents.iter().flat_map(|d| segment(d, max_chars, overlap)).collect()
}

/// Segmenter bound to validated settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Segmenter {
	settings: ChunkingSettings,
}

impl Segmenter {
	pub fn new(settings: ChunkingSettings) -> Result<Self> {
		settings.validate()?;
		Ok(Self { settings })
	}

	pub fn settings(&self) -> ChunkingSettings { self.settings }

	pub fn segment(&self, document: &Document) -> Vec<Chunk> {
		segment(document, self.settings.max_chars, self.settings.overlap)
	}

	pub fn segment_many(&self, documents: &[Document]) -> Vec<Chunk> {
		let chunks = segment_many(documents, self.settings.max_chars, self.settings.overlap);
		tracing::debug!(documents = documents.len(), chunks = chunks.len(), "segmented documents");
		chunks
	}
}

/// Paragraphs pending emission with their char lengths; `chars` is the joined length.
#[derive(Default)]
struct Buffer<'a> {
	paras: Vec<(&'a str, usize)>,
	chars: usize,
}

impl<'a> Buffer<'a> {
	fn is_empty(&self) -> bool { self.paras.is_empty() }

	fn len_with(&self, len: usize) -> usize {
		if self.is_empty() { len } else { self.chars + SEPARATOR_CHARS + len }
	}

	fn push(&mut self, para: &'a str, len: usize) {
		self.chars = self.len_with(len);
		self.paras.push((para, len));
	}

	fn pop_front(&mut self) {
		if self.paras.is_empty() { return; }
		let (_, len) = self.paras.remove(0);
		self.chars = if self.paras.is_empty() { 0 } else { self.chars - len - SEPARATOR_CHARS };
	}

	/// Longest run of trailing paragraphs whose joined length fits in `budget`.
	fn tail_within(&self, budget: usize) -> Self {
		let mut taken = 0;
		let mut chars = 0;
		for &(_, len) in self.paras.iter().rev() {
			let next = if taken == 0 { len } else { chars + SEPARATOR_CHARS + len };
			if next > budget { break; }
			chars = next;
			taken += 1;
		}
		Self { paras: self.paras[self.paras.len() - taken..].to_vec(), chars }
	}

	fn text(&self) -> String {
		let mut out = String::with_capacity(self.chars);
		for (i, (para, _)) in self.paras.iter().enumerate() {
			if i > 0 { out.push_str(PARAGRAPH_SEPARATOR); }
			out.push_str(para);
		}
		out
	}

	fn to_chunk(&self, document: &Document, index: usize) -> Chunk {
		let mut metadata = document.metadata.clone();
		metadata.insert(CHUNK_INDEX_KEY.to_string(), index.to_string());
		Chunk { id: Chunk::chunk_id(&document.id, index), text: self.text(), metadata }
	}
}
