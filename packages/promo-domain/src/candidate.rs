use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One retrieval hit: a promotion id and its (possibly boosted) similarity.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CandidateResult {
	pub id: String,
	pub score: f32,
}

/// Merges candidates produced by multiple query variants. Each promotion id
/// keeps its maximum score; the first-seen order of ids is preserved.
pub fn merge_candidates(candidates: Vec<CandidateResult>) -> Vec<CandidateResult> {
	let mut merged: Vec<CandidateResult> = Vec::with_capacity(candidates.len());
	let mut index_by_id: HashMap<String, usize> = HashMap::new();

	for candidate in candidates {
		match index_by_id.get(&candidate.id) {
			Some(&index) => {
				if candidate.score > merged[index].score {
					merged[index].score = candidate.score;
				}
			},
			None => {
				index_by_id.insert(candidate.id.clone(), merged.len());
				merged.push(candidate);
			},
		}
	}

	merged
}

/// Which path produced the engagement estimate. `BaseRate` also marks the
/// degraded mode entered when the learned model is unavailable.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CtrSource {
	Model,
	BaseRate,
}

/// Diagnostic decomposition of a final score. Not part of the ordering
/// contract; present so callers can see how a score came to be.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ScoreBreakdown {
	pub base_ctr: f32,
	pub model_ctr: Option<f32>,
	pub ctr_source: CtrSource,
	pub similarity: f32,
	pub retrieval_factor: f32,
	pub budget_bonus: f32,
	pub interest_bonus: f32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RankedPromotion {
	pub id: String,
	pub score: f32,
	pub breakdown: ScoreBreakdown,
}
