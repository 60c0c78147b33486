use promo_domain::{PriceTier, UserProfile, cosine_similarity, interest_overlap_ratio};

use crate::{PromoService, ServiceError, ServiceResult};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchRequest {
	pub query: String,
	#[serde(default)]
	pub user_profile: Option<UserProfile>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchItem {
	pub id: String,
	pub title: String,
	pub description: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub link: Option<String>,
	pub categories: Vec<String>,
	pub price_tier: PriceTier,
	pub base_ctr: f32,
	pub score: f32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResponse {
	pub results: Vec<SearchItem>,
}

impl PromoService {
	/// Retrieves the catalog entries closest to the query, optionally
	/// boosted by profile interest overlap.
	///
	/// The scan is O(catalog) on an immutable snapshot; result ordering is
	/// descending adjusted score with ascending-id ties, a contract any
	/// future indexed retriever must preserve.
	pub async fn search_promotions(&self, req: SearchRequest) -> ServiceResult<SearchResponse> {
		let query = req.query.trim();

		if query.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "query must be non-empty.".to_string(),
			});
		}

		let catalog = self.catalog.snapshot();

		if catalog.is_empty() {
			return Ok(SearchResponse { results: Vec::new() });
		}

		let query_vec = self.embed_query(query, catalog.vector_dim()).await?;
		let boost_weight = self.cfg.search.interest_boost_weight;
		let profile = req.user_profile.as_ref();
		let mut scored: Vec<(f32, usize)> = catalog
			.all()
			.iter()
			.enumerate()
			.map(|(index, promotion)| {
				let mut score = cosine_similarity(&query_vec, &promotion.embedding);

				if let Some(profile) = profile {
					score += boost_weight
						* interest_overlap_ratio(&promotion.categories, &profile.interests);
				}

				(score, index)
			})
			.collect();

		scored.sort_by(|a, b| {
			b.0.partial_cmp(&a.0)
				.unwrap_or(std::cmp::Ordering::Equal)
				.then_with(|| catalog.all()[a.1].id.cmp(&catalog.all()[b.1].id))
		});
		scored.truncate(self.cfg.search.max_results as usize);

		let results = scored
			.into_iter()
			.map(|(score, index)| {
				let promotion = &catalog.all()[index];

				SearchItem {
					id: promotion.id.clone(),
					title: promotion.title.clone(),
					description: promotion.description.clone(),
					link: promotion.link.clone(),
					categories: promotion.categories.clone(),
					price_tier: promotion.price_tier,
					base_ctr: promotion.base_ctr,
					score,
				}
			})
			.collect();

		Ok(SearchResponse { results })
	}

	/// Embeds one query into the catalog's vector space. A dimension
	/// mismatch means the embedding provider and the catalog disagree about
	/// the vector space, which no per-call handling can repair.
	pub(crate) async fn embed_query(
		&self,
		query: &str,
		vector_dim: usize,
	) -> ServiceResult<Vec<f32>> {
		let texts = [query.to_string()];
		let embeddings =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?;
		let query_vec = embeddings.into_iter().next().ok_or_else(|| ServiceError::Provider {
			message: "Embedding provider returned no vectors.".to_string(),
		})?;

		if query_vec.len() != vector_dim {
			return Err(ServiceError::Configuration {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(query_vec)
	}
}
