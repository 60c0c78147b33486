use serde::Deserialize;
use serde_json::{Map, Value};

/// Provider id that selects the built-in hash embedder instead of a remote
/// embedding endpoint.
pub const DETERMINISTIC_EMBEDDER: &str = "deterministic";
/// Provider id that disables the learned CTR model entirely.
pub const CTR_MODEL_OFF: &str = "off";

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub catalog: Catalog,
	pub providers: Providers,
	pub expansion: Expansion,
	pub search: Search,
	pub ranking: Ranking,
	pub slots: Slots,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub mcp_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Catalog {
	/// Dimensionality of the catalog's vector space. Every stored and
	/// queried embedding must match it exactly.
	pub vector_dim: u32,
	/// Optional JSONL promotion file loaded at startup. When absent or
	/// unreadable the built-in sample records are used instead.
	pub data_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub expansion: LlmProviderConfig,
	pub ctr_model: ProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Expansion {
	/// "llm" tries the expansion provider first; "rules" skips it and goes
	/// straight to the deterministic expansion.
	pub mode: String,
	pub max_variants: u32,
	#[serde(default = "default_include_original")]
	pub include_original: bool,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	pub max_results: u32,
	pub interest_boost_weight: f32,
}

#[derive(Debug, Deserialize)]
pub struct Ranking {
	pub retrieval_factor_floor: f32,
	pub retrieval_factor_ceil: f32,
	pub budget_match_bonus: f32,
	pub adjacent_tier_bonus: f32,
	pub interest_weight: f32,
}

#[derive(Debug, Deserialize)]
pub struct Slots {
	pub max_ads: u32,
	pub min_spacing: u32,
	/// Ordinal of the organic result the first promotion is placed after,
	/// clamped to the organic list length.
	pub first_slot: u32,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub auth_mode: String,
	pub auth_token: Option<String>,
}

fn default_include_original() -> bool {
	true
}
