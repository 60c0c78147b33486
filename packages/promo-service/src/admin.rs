use tracing::info;

use crate::{PromoService, ServiceError, ServiceResult};
use promo_catalog::Catalog;
use promo_domain::{Promotion, PromotionRecord};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CatalogReloadReport {
	pub loaded: usize,
	pub rejected: usize,
	pub embedded: usize,
}

impl PromoService {
	/// Rebuilds the catalog from the given records and swaps it in as one
	/// reference update. Records without a precomputed vector are embedded
	/// in a single batched provider call; malformed records are rejected
	/// individually and never abort the reload.
	pub async fn reload_catalog(
		&self,
		records: Vec<PromotionRecord>,
	) -> ServiceResult<CatalogReloadReport> {
		let vector_dim = self.cfg.catalog.vector_dim as usize;
		let pending: Vec<usize> = records
			.iter()
			.enumerate()
			.filter(|(_, record)| record.embedding.is_none())
			.map(|(index, _)| index)
			.collect();
		let texts: Vec<String> =
			pending.iter().map(|&index| records[index].embedding_text()).collect();
		let mut computed = if texts.is_empty() {
			Vec::new()
		} else {
			self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?
		};

		if computed.len() != texts.len() {
			return Err(ServiceError::Provider {
				message: "Embedding provider returned mismatched vector count.".to_string(),
			});
		}
		for vector in &computed {
			if vector.len() != vector_dim {
				return Err(ServiceError::Configuration {
					message: "Embedding vector dimension mismatch.".to_string(),
				});
			}
		}

		let embedded = computed.len();
		let mut computed_iter = computed.drain(..);
		let entries: Vec<Promotion> = records
			.into_iter()
			.map(|record| match record.embedding.clone() {
				Some(vector) => record.into_promotion(vector),
				None => {
					// pending indexes are in record order, so the drained
					// vectors line up one-to-one.
					let vector = computed_iter.next().unwrap_or_default();

					record.into_promotion(vector)
				},
			})
			.collect();
		let (catalog, rejected) = Catalog::build(entries, vector_dim);
		let report = CatalogReloadReport {
			loaded: catalog.len(),
			rejected: rejected.len(),
			embedded,
		};

		info!(
			loaded = report.loaded,
			rejected = report.rejected,
			embedded = report.embedded,
			"Catalog reloaded."
		);
		self.catalog.swap(catalog);

		Ok(report)
	}
}
