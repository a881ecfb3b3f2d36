//! LanceDB-backed collection.
//!
//! One table per collection with columns `id`, `text`, `metadata` (JSON),
//! one `meta_<key>` column per configured filter field, and a fixed-size
//! `vector` list. Filters are pushed down as SQL prefilters, so only the
//! configured filter fields can be filtered on. Cosine distance only.
use std::sync::Arc;

use arrow_array::types::Float32Type;
use arrow_array::{Array, ArrayRef, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, DistanceType, Table};
use tokio::runtime::Runtime;

use passage_core::{BackendHit, Chunk, Distance, Embedding, Error, Meta, Result, SearchFilter, VectorBackend, VectorRecord};

const FILTER_COLUMN_PREFIX: &str = "meta_";

pub fn build_arrow_schema(dim: usize, filter_fields: &[String]) -> SchemaRef {
	let mut fields = vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("text", DataType::Utf8, false),
		Field::new("metadata", DataType::Utf8, false),
	];
	fields.extend(filter_fields.iter().map(|f| Field::new(format!("{FILTER_COLUMN_PREFIX}{f}"), DataType::Utf8, true)));
	fields.push(Field::new("vector", vector_type(dim), true));
	Arc::new(Schema::new(fields))
}

fn vector_type(dim: usize) -> DataType {
	DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim as i32)
}

pub struct LanceBackend {
	runtime: Runtime,
	table: Table,
	name: String,
	dim: usize,
	filter_fields: Vec<String>,
	schema: SchemaRef,
}

impl LanceBackend {
	/// Connect to `uri` and open (or create) the collection table `name`.
	pub fn open(uri: &str, name: &str, dim: usize, distance: Distance, filter_fields: Vec<String>) -> Result<Self> {
		if distance != Distance::Cosine {
			return Err(Error::InvalidConfig("the lance backend supports cosine distance only".into()));
		}
		if dim == 0 {
			return Err(Error::InvalidConfig("collection dimension must be greater than zero".into()));
		}
		if let Some(bad) = filter_fields.iter().find(|f| f.is_empty() || !f.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')) {
			return Err(Error::InvalidConfig(format!("filter field '{bad}' must match [A-Za-z0-9_]+")));
		}
		let runtime = Runtime::new().map_err(Error::backend)?;
		let schema = build_arrow_schema(dim, &filter_fields);
		let table = runtime.block_on(async {
			let conn = connect(uri).execute().await?;
			if !conn.table_names().execute().await?.contains(&name.to_string()) {
				let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
				conn.create_table(name, Box::new(iter)).execute().await?;
				tracing::info!(uri, table = name, dim, "created lance table");
			}
			conn.open_table(name).execute().await
		}).map_err(Error::backend)?;

		let existing = runtime.block_on(table.schema()).map_err(Error::backend)?;
		let stored = existing.field_with_name("vector").map(|f| f.data_type().clone()).ok();
		if stored.as_ref() != Some(&vector_type(dim)) {
			return Err(Error::InvalidConfig(format!("lance table '{name}' does not hold {dim}-dimensional vectors")));
		}
		if !existing.fields().iter().map(|f| f.name()).eq(schema.fields().iter().map(|f| f.name())) {
			return Err(Error::InvalidConfig(format!("lance table '{name}' was created with different filter fields")));
		}
		Ok(Self { runtime, table, name: name.to_string(), dim, filter_fields, schema })
	}

	/// One `merge_insert` commit keyed on `id`; with `delete_missing`, rows
	/// absent from `records` are dropped in the same commit.
	fn merge(&self, records: Vec<VectorRecord>, delete_missing: bool) -> Result<()> {
		if let Some(bad) = records.iter().find(|r| r.vector.dim() != self.dim) {
			return Err(Error::InvalidVector { expected: self.dim, actual: bad.vector.dim() });
		}
		if records.is_empty() { return Ok(()); }
		let batch = self.to_record_batch(&records)?;
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), self.schema.clone()));
		self.runtime.block_on(async {
			let mut mi = self.table.merge_insert(&["id"]);
			mi.when_matched_update_all(None).when_not_matched_insert_all();
			if delete_missing {
				mi.when_not_matched_by_source_delete(None);
			}
			mi.execute(reader).await.map(|_| ())
		}).map_err(Error::backend)?;
		tracing::debug!(table = %self.name, rows = records.len(), delete_missing, "merged into lance");
		Ok(())
	}

	fn to_record_batch(&self, records: &[VectorRecord]) -> Result<RecordBatch> {
		let ids: Vec<String> = records.iter().map(|r| r.chunk.id.clone()).collect();
		let texts: Vec<String> = records.iter().map(|r| r.chunk.text.clone()).collect();
		let metadata = records
			.iter()
			.map(|r| serde_json::to_string(&r.chunk.metadata))
			.collect::<std::result::Result<Vec<String>, _>>()
			.map_err(Error::backend)?;

		let mut columns: Vec<ArrayRef> = vec![
			Arc::new(StringArray::from(ids)),
			Arc::new(StringArray::from(texts)),
			Arc::new(StringArray::from(metadata)),
		];
		for field in &self.filter_fields {
			let values: Vec<Option<String>> = records.iter().map(|r| r.chunk.metadata.get(field).cloned()).collect();
			columns.push(Arc::new(StringArray::from(values)));
		}
		let vectors = records.iter().map(|r| Some(r.vector.as_slice().iter().copied().map(Some).collect::<Vec<_>>()));
		columns.push(Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, self.dim as i32)));

		RecordBatch::try_new(self.schema.clone(), columns).map_err(Error::backend)
	}

	/// SQL conjunction over the filter columns; unknown keys are a configuration error.
	fn predicate(&self, filter: &SearchFilter) -> Result<Option<String>> {
		let mut clauses = Vec::with_capacity(filter.len());
		for (key, value) in filter.iter() {
			if !self.filter_fields.iter().any(|f| f == key) {
				return Err(Error::InvalidConfig(format!("metadata key '{key}' is not a filter field of '{}'", self.name)));
			}
			clauses.push(format!("{FILTER_COLUMN_PREFIX}{key} = '{}'", value.replace('\'', "''")));
		}
		Ok(if clauses.is_empty() { None } else { Some(clauses.join(" AND ")) })
	}
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| Error::backend(anyhow::anyhow!("lance result is missing the '{name}' column")))
}

/// Decode one result batch; scores are `1 - _distance`.
fn batch_hits(batch: &RecordBatch, hits: &mut Vec<BackendHit>) -> Result<()> {
	let ids = string_column(batch, "id")?;
	let texts = string_column(batch, "text")?;
	let metadata = string_column(batch, "metadata")?;
	let distances = batch
		.column_by_name("_distance")
		.and_then(|c| c.as_any().downcast_ref::<Float32Array>())
		.ok_or_else(|| Error::backend(anyhow::anyhow!("lance result is missing the '_distance' column")))?;
	for i in 0..batch.num_rows() {
		let meta: Meta = serde_json::from_str(metadata.value(i)).map_err(Error::backend)?;
		let chunk = Chunk { id: ids.value(i).to_string(), text: texts.value(i).to_string(), metadata: meta };
		hits.push(BackendHit { chunk, score: 1.0 - distances.value(i) });
	}
	Ok(())
}

impl VectorBackend for LanceBackend {
	fn name(&self) -> &str { &self.name }

	fn dim(&self) -> usize { self.dim }

	fn upsert(&mut self, records: Vec<VectorRecord>) -> Result<()> {
		self.merge(records, false)
	}

	fn replace(&mut self, records: Vec<VectorRecord>) -> Result<()> {
		if records.is_empty() { return self.clear(); }
		self.merge(records, true)
	}

	fn query(&self, vector: &Embedding, limit: usize, filter: &SearchFilter) -> Result<Vec<BackendHit>> {
		if vector.dim() != self.dim {
			return Err(Error::InvalidVector { expected: self.dim, actual: vector.dim() });
		}
		if limit == 0 { return Ok(Vec::new()); }
		let predicate = self.predicate(filter)?;
		let batches: Vec<RecordBatch> = self.runtime.block_on(async {
			let mut query = self.table.vector_search(vector.as_slice().to_vec())?.distance_type(DistanceType::Cosine).limit(limit);
			if let Some(p) = predicate { query = query.only_if(p); }
			query.execute().await?.try_collect::<Vec<_>>().await
		}).map_err(Error::backend)?;

		let mut hits = Vec::new();
		for batch in &batches {
			batch_hits(batch, &mut hits)?;
		}
		hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
		hits.truncate(limit);
		Ok(hits)
	}

	fn clear(&mut self) -> Result<()> {
		self.runtime.block_on(self.table.delete("true")).map(|_| ()).map_err(Error::backend)
	}

	fn len(&self) -> Result<usize> {
		self.runtime.block_on(self.table.count_rows(None)).map_err(Error::backend)
	}
}
