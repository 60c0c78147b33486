mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	CTR_MODEL_OFF, Catalog, Config, DETERMINISTIC_EMBEDDER, EmbeddingProviderConfig, Expansion,
	LlmProviderConfig, ProviderConfig, Providers, Ranking, Search, Security, Service, Slots,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.mcp_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.mcp_bind must be non-empty.".to_string(),
		});
	}
	if cfg.catalog.vector_dim == 0 {
		return Err(Error::Validation {
			message: "catalog.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.catalog.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match catalog.vector_dim.".to_string(),
		});
	}

	let expansion_mode = cfg.expansion.mode.as_str();

	if !matches!(expansion_mode, "llm" | "rules") {
		return Err(Error::Validation {
			message: "expansion.mode must be one of llm or rules.".to_string(),
		});
	}
	if cfg.expansion.max_variants == 0 {
		return Err(Error::Validation {
			message: "expansion.max_variants must be greater than zero.".to_string(),
		});
	}
	if !cfg.providers.expansion.temperature.is_finite()
		|| !(0.0..=2.0).contains(&cfg.providers.expansion.temperature)
	{
		return Err(Error::Validation {
			message: "providers.expansion.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}

	if cfg.search.max_results == 0 {
		return Err(Error::Validation {
			message: "search.max_results must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.interest_boost_weight.is_finite() {
		return Err(Error::Validation {
			message: "search.interest_boost_weight must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.search.interest_boost_weight) {
		return Err(Error::Validation {
			message: "search.interest_boost_weight must be in the range 0.0-1.0.".to_string(),
		});
	}

	for (path, value) in [
		("ranking.retrieval_factor_floor", cfg.ranking.retrieval_factor_floor),
		("ranking.retrieval_factor_ceil", cfg.ranking.retrieval_factor_ceil),
		("ranking.budget_match_bonus", cfg.ranking.budget_match_bonus),
		("ranking.adjacent_tier_bonus", cfg.ranking.adjacent_tier_bonus),
		("ranking.interest_weight", cfg.ranking.interest_weight),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{path} must be a finite number.") });
		}
		if value < 0.0 {
			return Err(Error::Validation { message: format!("{path} must be zero or greater.") });
		}
	}
	if cfg.ranking.retrieval_factor_floor <= 0.0 {
		return Err(Error::Validation {
			message: "ranking.retrieval_factor_floor must be greater than zero.".to_string(),
		});
	}
	if cfg.ranking.retrieval_factor_ceil < cfg.ranking.retrieval_factor_floor {
		return Err(Error::Validation {
			message:
				"ranking.retrieval_factor_ceil must be at least ranking.retrieval_factor_floor."
					.to_string(),
		});
	}
	if cfg.ranking.adjacent_tier_bonus > cfg.ranking.budget_match_bonus {
		return Err(Error::Validation {
			message: "ranking.adjacent_tier_bonus must not exceed ranking.budget_match_bonus."
				.to_string(),
		});
	}

	if cfg.slots.max_ads == 0 {
		return Err(Error::Validation {
			message: "slots.max_ads must be greater than zero.".to_string(),
		});
	}
	if cfg.slots.min_spacing == 0 {
		return Err(Error::Validation {
			message: "slots.min_spacing must be greater than zero.".to_string(),
		});
	}
	if cfg.slots.first_slot == 0 {
		return Err(Error::Validation {
			message: "slots.first_slot must be greater than zero.".to_string(),
		});
	}

	if !matches!(cfg.security.auth_mode.as_str(), "off" | "static_key") {
		return Err(Error::Validation {
			message: "security.auth_mode must be one of off or static_key.".to_string(),
		});
	}
	if cfg.security.auth_mode == "static_key" && cfg.security.auth_token.is_none() {
		return Err(Error::Validation {
			message: "security.auth_token must be non-empty when security.auth_mode=static_key."
				.to_string(),
		});
	}

	let remote_embedding = cfg.providers.embedding.provider_id != DETERMINISTIC_EMBEDDER;
	let llm_expansion = expansion_mode == "llm";
	let ctr_model_enabled = cfg.providers.ctr_model.provider_id != CTR_MODEL_OFF;

	for (label, enabled, api_base, api_key, timeout_ms) in [
		(
			"embedding",
			remote_embedding,
			&cfg.providers.embedding.api_base,
			&cfg.providers.embedding.api_key,
			cfg.providers.embedding.timeout_ms,
		),
		(
			"expansion",
			llm_expansion,
			&cfg.providers.expansion.api_base,
			&cfg.providers.expansion.api_key,
			cfg.providers.expansion.timeout_ms,
		),
		(
			"ctr_model",
			ctr_model_enabled,
			&cfg.providers.ctr_model.api_base,
			&cfg.providers.ctr_model.api_key,
			cfg.providers.ctr_model.timeout_ms,
		),
	] {
		if !enabled {
			continue;
		}
		if api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("providers.{label}.api_base must be non-empty."),
			});
		}
		if api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("providers.{label}.api_key must be non-empty."),
			});
		}
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("providers.{label}.timeout_ms must be greater than zero."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.catalog.data_path.as_deref().map(|path| path.trim().is_empty()).unwrap_or(false) {
		cfg.catalog.data_path = None;
	}
	if cfg.security.auth_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false) {
		cfg.security.auth_token = None;
	}
}
