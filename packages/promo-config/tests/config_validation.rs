use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use promo_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn write_temp_config(payload: &str) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("promo_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

#[test]
fn template_config_is_valid() {
	let cfg = base_config();

	assert!(promo_config::validate(&cfg).is_ok());
}

#[test]
fn load_rejects_a_missing_file() {
	let mut path = env::temp_dir();

	path.push("promo_config_does_not_exist.toml");

	let err = promo_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "unexpected error: {err}");
}

#[test]
fn load_rejects_invalid_toml() {
	let path = write_temp_config("not = [valid");
	let result = promo_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }), "unexpected error: {err}");
}

#[test]
fn embedding_dimensions_must_match_catalog_vector_dim() {
	let mut cfg = base_config();

	cfg.providers.embedding.dimensions = 32;

	let err = promo_config::validate(&cfg).expect_err("Expected dimension validation error.");

	assert!(
		err.to_string().contains("providers.embedding.dimensions must match catalog.vector_dim."),
		"Unexpected error: {err}"
	);
}

#[test]
fn expansion_mode_must_be_known() {
	let mut cfg = base_config();

	cfg.expansion.mode = "ask-a-friend".to_string();

	let err = promo_config::validate(&cfg).expect_err("Expected expansion mode validation error.");

	assert!(
		err.to_string().contains("expansion.mode must be one of llm or rules."),
		"Unexpected error: {err}"
	);
}

#[test]
fn expansion_max_variants_must_be_positive() {
	let mut cfg = base_config();

	cfg.expansion.max_variants = 0;

	let err = promo_config::validate(&cfg).expect_err("Expected max_variants validation error.");

	assert!(
		err.to_string().contains("expansion.max_variants must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn retrieval_factor_ceil_cannot_undercut_the_floor() {
	let mut cfg = base_config();

	cfg.ranking.retrieval_factor_ceil = 0.4;

	let err = promo_config::validate(&cfg).expect_err("Expected factor bounds validation error.");

	assert!(
		err.to_string().contains(
			"ranking.retrieval_factor_ceil must be at least ranking.retrieval_factor_floor."
		),
		"Unexpected error: {err}"
	);
}

#[test]
fn adjacent_tier_bonus_cannot_exceed_the_exact_match_bonus() {
	let mut cfg = base_config();

	cfg.ranking.adjacent_tier_bonus = 0.2;

	let err = promo_config::validate(&cfg).expect_err("Expected bonus ordering validation error.");

	assert!(
		err.to_string()
			.contains("ranking.adjacent_tier_bonus must not exceed ranking.budget_match_bonus."),
		"Unexpected error: {err}"
	);
}

#[test]
fn ranking_weights_must_be_finite() {
	let mut cfg = base_config();

	cfg.ranking.interest_weight = f32::NAN;

	let err = promo_config::validate(&cfg).expect_err("Expected finiteness validation error.");

	assert!(
		err.to_string().contains("ranking.interest_weight must be a finite number."),
		"Unexpected error: {err}"
	);
}

#[test]
fn interest_boost_weight_must_be_in_range() {
	let mut cfg = base_config();

	cfg.search.interest_boost_weight = 1.5;

	let err = promo_config::validate(&cfg).expect_err("Expected boost weight validation error.");

	assert!(
		err.to_string().contains("search.interest_boost_weight must be in the range 0.0-1.0."),
		"Unexpected error: {err}"
	);
}

#[test]
fn slot_bounds_must_be_positive() {
	for (field, message) in [
		("max_ads", "slots.max_ads must be greater than zero."),
		("min_spacing", "slots.min_spacing must be greater than zero."),
		("first_slot", "slots.first_slot must be greater than zero."),
	] {
		let mut cfg = base_config();

		match field {
			"max_ads" => cfg.slots.max_ads = 0,
			"min_spacing" => cfg.slots.min_spacing = 0,
			_ => cfg.slots.first_slot = 0,
		}

		let err = promo_config::validate(&cfg).expect_err("Expected slot bounds validation error.");

		assert!(err.to_string().contains(message), "Unexpected error: {err}");
	}
}

#[test]
fn remote_embedding_requires_credentials() {
	let mut cfg = base_config();

	cfg.providers.embedding.provider_id = "openai-compatible".to_string();
	cfg.providers.embedding.api_base = "https://api.example.com".to_string();
	cfg.providers.embedding.api_key = String::new();

	let err = promo_config::validate(&cfg).expect_err("Expected api_key validation error.");

	assert!(
		err.to_string().contains("providers.embedding.api_key must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn deterministic_embedding_needs_no_credentials() {
	let cfg = base_config();

	assert_eq!(cfg.providers.embedding.provider_id, "deterministic");
	assert!(cfg.providers.embedding.api_key.is_empty());
	assert!(promo_config::validate(&cfg).is_ok());
}

#[test]
fn llm_expansion_requires_provider_credentials() {
	let mut cfg = base_config();

	cfg.expansion.mode = "llm".to_string();
	cfg.providers.expansion.api_key = "   ".to_string();

	let err = promo_config::validate(&cfg).expect_err("Expected api_key validation error.");

	assert!(
		err.to_string().contains("providers.expansion.api_key must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn static_key_auth_requires_a_token() {
	let mut cfg = base_config();

	cfg.security.auth_mode = "static_key".to_string();
	cfg.security.auth_token = None;

	let err = promo_config::validate(&cfg).expect_err("Expected auth token validation error.");

	assert!(
		err.to_string()
			.contains("security.auth_token must be non-empty when security.auth_mode=static_key."),
		"Unexpected error: {err}"
	);
}

#[test]
fn load_normalizes_whitespace_only_optionals() {
	let payload = SAMPLE_CONFIG_TEMPLATE_TOML
		.replace("data_path  = \"data/promotions.jsonl\"", "data_path  = \"   \"");
	let path = write_temp_config(&payload);
	let result = promo_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected config to load.");

	assert!(cfg.catalog.data_path.is_none());
}

#[test]
fn example_toml_is_valid() {
	let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

	path.push("../../promosearch.example.toml");

	promo_config::load(&path).expect("Expected promosearch.example.toml to be a valid config.");
}
