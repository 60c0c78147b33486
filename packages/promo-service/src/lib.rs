pub mod admin;
pub mod expand;
pub mod rank;
pub mod search;
pub mod slots;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

pub use admin::CatalogReloadReport;
pub use expand::{ExpandRequest, ExpandResponse};
pub use rank::{RankCandidate, RankRequest, RankResponse};
pub use search::{SearchItem, SearchRequest, SearchResponse};
pub use slots::{SlotItem, SlotPlan, SlotPromotion, SlotRequest, SlotResponse, SlotSource};

use promo_catalog::SharedCatalog;
use promo_config::{Config, EmbeddingProviderConfig, LlmProviderConfig, ProviderConfig};
use promo_providers::{ctr, embedding, expansion};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, promo_providers::Result<Vec<Vec<f32>>>>;
}

pub trait ExpansionProvider
where
	Self: Send + Sync,
{
	fn expand<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, promo_providers::Result<Value>>;
}

pub trait CtrModelProvider
where
	Self: Send + Sync,
{
	fn predict<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		rows: &'a [Value],
	) -> BoxFuture<'a, promo_providers::Result<Vec<f32>>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	Validation { message: String },
	Configuration { message: String },
	Provider { message: String },
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub expansion: Arc<dyn ExpansionProvider>,
	pub ctr_model: Arc<dyn CtrModelProvider>,
}

pub struct PromoService {
	pub cfg: Config,
	pub catalog: SharedCatalog,
	pub providers: Providers,
}

struct DefaultProviders;

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::Validation { message } => write!(f, "Validation error: {message}"),
			Self::Configuration { message } => write!(f, "Configuration error: {message}"),
			Self::Provider { message } => write!(f, "Provider error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<promo_providers::Error> for ServiceError {
	fn from(err: promo_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, promo_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl ExpansionProvider for DefaultProviders {
	fn expand<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, promo_providers::Result<Value>> {
		Box::pin(expansion::expand(cfg, messages))
	}
}

impl CtrModelProvider for DefaultProviders {
	fn predict<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		rows: &'a [Value],
	) -> BoxFuture<'a, promo_providers::Result<Vec<f32>>> {
		Box::pin(ctr::predict(cfg, rows))
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		expansion: Arc<dyn ExpansionProvider>,
		ctr_model: Arc<dyn CtrModelProvider>,
	) -> Self {
		Self { embedding, expansion, ctr_model }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), expansion: provider.clone(), ctr_model: provider }
	}
}

impl PromoService {
	pub fn new(cfg: Config, catalog: SharedCatalog) -> Self {
		Self { cfg, catalog, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, catalog: SharedCatalog, providers: Providers) -> Self {
		Self { cfg, catalog, providers }
	}
}
