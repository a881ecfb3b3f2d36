//! Exact in-memory vector collection.
//!
//! Records are kept in insertion order; re-upserting an id replaces the
//! record in place. Queries filter first, then rank by similarity; equal
//! similarities keep insertion order.
use std::collections::HashMap;

use passage_core::{BackendHit, Distance, Embedding, Error, Result, SearchFilter, VectorBackend, VectorRecord};

use crate::similarity::similarity;

#[derive(Debug, Clone)]
pub struct MemoryBackend {
	name: String,
	dim: usize,
	distance: Distance,
	records: Vec<VectorRecord>,
	positions: HashMap<String, usize>,
}

impl MemoryBackend {
	pub fn new(name: impl Into<String>, dim: usize, distance: Distance) -> Result<Self> {
		if dim == 0 {
			return Err(Error::InvalidConfig("collection dimension must be greater than zero".into()));
		}
		Ok(Self { name: name.into(), dim, distance, records: Vec::new(), positions: HashMap::new() })
	}

	pub fn distance(&self) -> Distance {
		self.distance
	}

	pub fn get(&self, id: &str) -> Option<&VectorRecord> {
		self.positions.get(id).map(|&i| &self.records[i])
	}
}

impl VectorBackend for MemoryBackend {
	fn name(&self) -> &str {
		&self.name
	}

	fn dim(&self) -> usize {
		self.dim
	}

	fn upsert(&mut self, records: Vec<VectorRecord>) -> Result<()> {
		if let Some(bad) = records.iter().find(|r| r.vector.dim() != self.dim) {
			return Err(Error::InvalidVector { expected: self.dim, actual: bad.vector.dim() });
		}
		for record in records {
			match self.positions.get(&record.chunk.id) {
				Some(&i) => self.records[i] = record,
				None => {
					self.positions.insert(record.chunk.id.clone(), self.records.len());
					self.records.push(record);
				}
			}
		}
		Ok(())
	}

	fn replace(&mut self, records: Vec<VectorRecord>) -> Result<()> {
		let mut next = Self::new(self.name.clone(), self.dim, self.distance)?;
		next.upsert(records)?;
		*self = next;
		Ok(())
	}

	fn query(&self, vector: &Embedding, limit: usize, filter: &SearchFilter) -> Result<Vec<BackendHit>> {
		if vector.dim() != self.dim {
			return Err(Error::InvalidVector { expected: self.dim, actual: vector.dim() });
		}
		if limit == 0 {
			return Ok(Vec::new());
		}
		let mut hits: Vec<BackendHit> = self
			.records
			.iter()
			.filter(|r| filter.matches(&r.chunk.metadata))
			.map(|r| BackendHit {
				score: similarity(self.distance, vector.as_slice(), r.vector.as_slice()),
				chunk: r.chunk.clone(),
			})
			.collect();
		hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
		hits.truncate(limit);
		Ok(hits)
	}

	fn clear(&mut self) -> Result<()> {
		self.records.clear();
		self.positions.clear();
		Ok(())
	}

	fn len(&self) -> Result<usize> {
		Ok(self.records.len())
	}
}
