use std::{fs, sync::Arc};

use tracing::{info, warn};

use promo_catalog::{Catalog, SharedCatalog, jsonl};
use promo_service::PromoService;

const SAMPLE_PROMOTIONS: &str = include_str!("../../../data/promotions.jsonl");

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<PromoService>,
}
impl AppState {
	pub async fn new(config: promo_config::Config) -> color_eyre::Result<Self> {
		let vector_dim = config.catalog.vector_dim as usize;
		let raw = load_raw_records(config.catalog.data_path.as_deref());
		let (records, malformed) = jsonl::parse_records(&raw);

		if malformed > 0 {
			warn!(malformed, "Some promotion lines could not be parsed.");
		}

		let service = PromoService::new(config, SharedCatalog::new(Catalog::empty(vector_dim)));
		let report = service.reload_catalog(records).await?;

		info!(
			loaded = report.loaded,
			rejected = report.rejected,
			embedded = report.embedded,
			"Promotion catalog ready."
		);

		Ok(Self { service: Arc::new(service) })
	}
}

/// Reads the configured JSONL file, falling back to the built-in sample
/// catalog when no path is configured or the file cannot be read.
pub(crate) fn load_raw_records(data_path: Option<&str>) -> String {
	let Some(path) = data_path else {
		info!("No promotion data path configured; using the built-in sample catalog.");

		return SAMPLE_PROMOTIONS.to_string();
	};

	match fs::read_to_string(path) {
		Ok(raw) => {
			info!(path, "Loading promotion catalog.");

			raw
		},
		Err(err) => {
			warn!(path, error = %err, "Promotion data unavailable; using the built-in sample catalog.");

			SAMPLE_PROMOTIONS.to_string()
		},
	}
}
