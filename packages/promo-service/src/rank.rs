use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use crate::{PromoService, ServiceResult};
use promo_config::CTR_MODEL_OFF;
use promo_domain::{
	CandidateResult, CtrSource, PriceTier, RankedPromotion, ScoreBreakdown, UserProfile,
	interest_overlap_ratio, merge_candidates,
};

/// A promotion-like ranking input. `similarity` accepts the `score` field
/// emitted by search so retrieval output can be fed back in directly;
/// fields left out are resolved from the catalog by id.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RankCandidate {
	pub id: String,
	#[serde(default, alias = "score")]
	pub similarity: f32,
	#[serde(default)]
	pub categories: Option<Vec<String>>,
	#[serde(default)]
	pub price_tier: Option<PriceTier>,
	#[serde(default)]
	pub base_ctr: Option<f32>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RankRequest {
	pub candidates: Vec<RankCandidate>,
	#[serde(default)]
	pub user_profile: Option<UserProfile>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RankResponse {
	pub ranked_promotions: Vec<RankedPromotion>,
}

#[derive(Debug)]
struct ResolvedCandidate {
	id: String,
	similarity: f32,
	categories: Vec<String>,
	price_tier: Option<PriceTier>,
	base_ctr: f32,
}

impl PromoService {
	/// Scores and orders candidates by predicted engagement.
	///
	/// Duplicate ids are merged by maximum similarity before scoring, so
	/// the output is a permutation of the distinct input ids. The learned
	/// CTR model is optional; without it the deterministic formula ranks on
	/// the promotion's base rate.
	pub async fn rank_promotions(&self, req: RankRequest) -> ServiceResult<RankResponse> {
		if req.candidates.is_empty() {
			return Ok(RankResponse { ranked_promotions: Vec::new() });
		}

		let catalog = self.catalog.snapshot();
		let mut fields_by_id: HashMap<&str, &RankCandidate> = HashMap::new();

		for candidate in &req.candidates {
			fields_by_id.entry(candidate.id.as_str()).or_insert(candidate);
		}

		let merged = merge_candidates(
			req.candidates
				.iter()
				.map(|candidate| CandidateResult {
					id: candidate.id.clone(),
					score: candidate.similarity,
				})
				.collect(),
		);
		let mut resolved = Vec::with_capacity(merged.len());

		for candidate in merged {
			let record = fields_by_id[candidate.id.as_str()];
			let promotion = catalog.get(&candidate.id);
			let base_ctr =
				record.base_ctr.or_else(|| promotion.map(|promotion| promotion.base_ctr));
			let Some(base_ctr) = base_ctr else {
				warn!(
					promotion_id = candidate.id.as_str(),
					"Skipping rank candidate without base_ctr or catalog entry."
				);

				continue;
			};
			let categories = record
				.categories
				.clone()
				.or_else(|| promotion.map(|promotion| promotion.categories.clone()))
				.unwrap_or_default();
			let price_tier =
				record.price_tier.or_else(|| promotion.map(|promotion| promotion.price_tier));

			resolved.push(ResolvedCandidate {
				id: candidate.id,
				similarity: candidate.score,
				categories,
				price_tier,
				base_ctr,
			});
		}

		if resolved.is_empty() {
			return Ok(RankResponse { ranked_promotions: Vec::new() });
		}

		let profile = req.user_profile.as_ref();
		let model_ctrs = self.model_ctrs(&resolved, profile).await;
		let ranking = &self.cfg.ranking;
		let mut ranked: Vec<RankedPromotion> = resolved
			.into_iter()
			.enumerate()
			.map(|(index, candidate)| {
				let retrieval_factor = retrieval_weight_factor(
					candidate.similarity,
					ranking.retrieval_factor_floor,
					ranking.retrieval_factor_ceil,
				);
				let budget_bonus = profile
					.and_then(|profile| profile.budget_level)
					.zip(candidate.price_tier)
					.map(|(budget, tier)| {
						if budget == tier {
							ranking.budget_match_bonus
						} else if budget.is_adjacent_to(tier) {
							ranking.adjacent_tier_bonus
						} else {
							0.0
						}
					})
					.unwrap_or(0.0);
				let interest_bonus = profile
					.map(|profile| {
						ranking.interest_weight
							* interest_overlap_ratio(&candidate.categories, &profile.interests)
					})
					.unwrap_or(0.0);
				let model_ctr = model_ctrs.as_ref().map(|scores| scores[index]);
				let (ctr, ctr_source) = match model_ctr {
					Some(predicted) => (predicted, CtrSource::Model),
					None => (candidate.base_ctr, CtrSource::BaseRate),
				};
				let score = ctr * retrieval_factor + budget_bonus + interest_bonus;

				RankedPromotion {
					id: candidate.id,
					score,
					breakdown: ScoreBreakdown {
						base_ctr: candidate.base_ctr,
						model_ctr,
						ctr_source,
						similarity: candidate.similarity,
						retrieval_factor,
						budget_bonus,
						interest_bonus,
					},
				}
			})
			.collect();

		ranked.sort_by(|a, b| {
			b.score
				.partial_cmp(&a.score)
				.unwrap_or(std::cmp::Ordering::Equal)
				.then_with(|| a.id.cmp(&b.id))
		});

		Ok(RankResponse { ranked_promotions: ranked })
	}

	/// One batched model call per request. Any failure degrades to base
	/// rates; ranking never fails because the model is absent.
	async fn model_ctrs(
		&self,
		candidates: &[ResolvedCandidate],
		profile: Option<&UserProfile>,
	) -> Option<Vec<f32>> {
		let cfg = &self.cfg.providers.ctr_model;

		if cfg.provider_id == CTR_MODEL_OFF {
			return None;
		}

		let rows: Vec<Value> =
			candidates.iter().map(|candidate| feature_row(candidate, profile)).collect();

		match self.providers.ctr_model.predict(cfg, &rows).await {
			Ok(scores) if scores.len() == candidates.len() =>
				Some(scores.into_iter().map(|score| score.clamp(0.0, 1.0)).collect()),
			Ok(_) => {
				warn!("CTR model returned a mismatched score count; using base rates.");

				None
			},
			Err(err) => {
				warn!(error = %err, "CTR model unavailable; using base rates.");

				None
			},
		}
	}
}

/// Maps similarity into a bounded multiplier so retrieval relevance
/// moderates the engagement estimate without ever zeroing it out.
fn retrieval_weight_factor(similarity: f32, floor: f32, ceil: f32) -> f32 {
	floor + (ceil - floor) * similarity.clamp(0.0, 1.0)
}

fn feature_row(candidate: &ResolvedCandidate, profile: Option<&UserProfile>) -> Value {
	let interest_match = profile
		.map(|profile| interest_overlap_ratio(&candidate.categories, &profile.interests))
		.unwrap_or(0.0);
	let budget_compatibility = budget_compatibility(
		profile.and_then(|profile| profile.budget_level),
		candidate.price_tier,
	);

	serde_json::json!({
		"id": candidate.id,
		"base_ctr": candidate.base_ctr,
		"similarity": candidate.similarity,
		"interest_match": interest_match,
		"budget_compatibility": budget_compatibility,
		"category_count": candidate.categories.len(),
		"price_tier": candidate.price_tier.map(PriceTier::as_str),
		"user_type": profile.and_then(|profile| profile.user_type),
	})
}

fn budget_compatibility(budget: Option<PriceTier>, tier: Option<PriceTier>) -> f32 {
	match budget.zip(tier) {
		Some((budget, tier)) if budget == tier => 1.0,
		Some((budget, tier)) if budget.is_adjacent_to(tier) => 0.6,
		Some(_) => 0.2,
		None => 0.5,
	}
}
