use passage_core::Document;
use passage_text::{paragraphs, segment, segment_many};

fn corpus() -> Vec<Document> {
	let long = "lorem ipsum dolor sit amet ".repeat(8);
	vec![
		Document::new("req", "The system shall log in users.\n\nPasswords are hashed.\n\nSessions expire after 30 minutes of inactivity.\n\nAdmins can revoke sessions."),
		Document::new("arch", format!("Intro.\n\n{long}\n\nShort tail.\n\n\n\nAfter a wide gap.")),
		Document::new("tiny", "one"),
		Document::new("blank", "   \n\n \n\n"),
		Document::new("schema", (0..20).map(|i| format!("Table t{i} has columns id, name_{i}.")).collect::<Vec<_>>().join("\n\n")),
	]
}

const BUDGETS: [(usize, usize); 5] = [(30, 10), (60, 0), (80, 40), (120, 200), (10, 5)];

/// Paragraphs of chunk `i + 1` that repeat the tail of chunk `i`.
fn shared_prefix(prev: &[&str], next: &[&str]) -> usize {
	(0..=prev.len().min(next.len())).rev().find(|&n| prev[prev.len() - n..] == next[..n]).unwrap_or(0)
}

#[test]
fn coverage_reproduces_paragraphs_in_order() {
	for (max, overlap) in BUDGETS {
		for doc in corpus() {
			let chunks = segment(&doc, max, overlap);
			let mut rebuilt: Vec<&str> = Vec::new();
			let mut prev: Vec<&str> = Vec::new();
			for c in &chunks {
				let paras: Vec<&str> = paragraphs(&c.text).collect();
				let skip = shared_prefix(&prev, &paras);
				rebuilt.extend(&paras[skip..]);
				prev = paras;
			}
			let original: Vec<&str> = paragraphs(&doc.text).collect();
			assert_eq!(rebuilt, original, "doc={} max={max} overlap={overlap}", doc.id);
		}
	}
}

#[test]
fn chunks_respect_the_size_bound() {
	for (max, overlap) in BUDGETS {
		for c in segment_many(&corpus(), max, overlap) {
			let n = c.text.chars().count();
			let single = paragraphs(&c.text).count() == 1;
			assert!(n <= max || single, "{} has {n} chars > {max}", c.id);
		}
	}
}

#[test]
fn overlap_stays_within_budget() {
	for (max, overlap) in BUDGETS {
		for doc in corpus() {
			let chunks = segment(&doc, max, overlap);
			for pair in chunks.windows(2) {
				let prev: Vec<&str> = paragraphs(&pair[0].text).collect();
				let next: Vec<&str> = paragraphs(&pair[1].text).collect();
				let shared = shared_prefix(&prev, &next);
				assert!(shared < next.len(), "a chunk never consists of overlap alone");
				let carried = next[..shared].join("\n\n").chars().count();
				assert!(carried <= overlap, "{} carries {carried} > {overlap}", pair[1].id);
			}
		}
	}
}

#[test]
fn chunk_indices_increase_from_zero() {
	for doc in corpus() {
		let chunks = segment(&doc, 40, 15);
		for (i, c) in chunks.iter().enumerate() {
			assert_eq!(c.index(), Some(i));
			assert_eq!(c.id, format!("{}::chunk{i}", doc.id));
			assert_eq!(c.document_id(), doc.id);
		}
	}
}

#[test]
fn segmentation_is_deterministic() {
	let docs = corpus();
	assert_eq!(segment_many(&docs, 50, 20), segment_many(&docs, 50, 20));
}
