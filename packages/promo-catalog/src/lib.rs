pub mod jsonl;

mod shared;

pub use shared::SharedCatalog;

use std::collections::HashMap;

use promo_domain::Promotion;
use tracing::warn;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RejectReason {
	EmptyId,
	EmptyTitle,
	InvalidBaseCtr,
	MalformedEmbedding,
	WrongEmbeddingDimension,
	DuplicateId,
}
impl RejectReason {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::EmptyId => "empty_id",
			Self::EmptyTitle => "empty_title",
			Self::InvalidBaseCtr => "invalid_base_ctr",
			Self::MalformedEmbedding => "malformed_embedding",
			Self::WrongEmbeddingDimension => "wrong_embedding_dimension",
			Self::DuplicateId => "duplicate_id",
		}
	}
}

#[derive(Debug)]
pub struct RejectedRecord {
	pub id: String,
	pub reason: RejectReason,
}

/// Immutable in-memory promotion index. Built once, never mutated; reloads
/// construct a fresh instance and swap it in via [`SharedCatalog`].
#[derive(Debug)]
pub struct Catalog {
	vector_dim: usize,
	entries: Vec<Promotion>,
	index_by_id: HashMap<String, usize>,
}
impl Catalog {
	pub fn empty(vector_dim: usize) -> Self {
		Self { vector_dim, entries: Vec::new(), index_by_id: HashMap::new() }
	}

	/// Builds a catalog from already-embedded promotions. Malformed entries
	/// are rejected individually; the build itself never fails. The first
	/// occurrence of a duplicate id wins.
	pub fn build(entries: Vec<Promotion>, vector_dim: usize) -> (Self, Vec<RejectedRecord>) {
		let mut catalog = Self::empty(vector_dim);
		let mut rejected = Vec::new();

		for entry in entries {
			if let Err(reason) = validate_entry(&entry, vector_dim, &catalog.index_by_id) {
				warn!(
					promotion_id = entry.id.as_str(),
					reason = reason.as_str(),
					"Rejecting malformed promotion record."
				);
				rejected.push(RejectedRecord { id: entry.id, reason });

				continue;
			}

			catalog.index_by_id.insert(entry.id.clone(), catalog.entries.len());
			catalog.entries.push(entry);
		}

		(catalog, rejected)
	}

	/// Stable load-order view of every promotion.
	pub fn all(&self) -> &[Promotion] {
		&self.entries
	}

	pub fn get(&self, id: &str) -> Option<&Promotion> {
		self.index_by_id.get(id).map(|&index| &self.entries[index])
	}

	pub fn contains(&self, id: &str) -> bool {
		self.index_by_id.contains_key(id)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn vector_dim(&self) -> usize {
		self.vector_dim
	}
}

fn validate_entry(
	entry: &Promotion,
	vector_dim: usize,
	index_by_id: &HashMap<String, usize>,
) -> Result<(), RejectReason> {
	if entry.id.trim().is_empty() {
		return Err(RejectReason::EmptyId);
	}
	if entry.title.trim().is_empty() {
		return Err(RejectReason::EmptyTitle);
	}
	if !entry.base_ctr.is_finite() || !(0.0..=1.0).contains(&entry.base_ctr) {
		return Err(RejectReason::InvalidBaseCtr);
	}
	if entry.embedding.iter().any(|value| !value.is_finite()) {
		return Err(RejectReason::MalformedEmbedding);
	}
	if entry.embedding.len() != vector_dim {
		return Err(RejectReason::WrongEmbeddingDimension);
	}
	if index_by_id.contains_key(&entry.id) {
		return Err(RejectReason::DuplicateId);
	}

	Ok(())
}
