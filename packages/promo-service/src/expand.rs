use std::collections::HashSet;

use serde_json::Value;
use tracing::warn;

use crate::{PromoService, ServiceError, ServiceResult};

const PROMO_TERMS: [&str; 6] = ["deal", "discount", "sale", "offer", "promotion", "coupon"];

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExpandRequest {
	pub query: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExpandResponse {
	pub expanded_queries: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ExpansionOutput {
	queries: Vec<String>,
}

impl PromoService {
	/// Expands a raw query into long-tail variants, best first.
	///
	/// The LLM path is optional; any failure there degrades to the
	/// rule-based expansion, so a non-empty query always yields at least
	/// one variant.
	pub async fn expand_query(&self, req: ExpandRequest) -> ServiceResult<ExpandResponse> {
		let query = req.query.trim();

		if query.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "query must be non-empty.".to_string(),
			});
		}

		let cfg = &self.cfg.expansion;
		let (queries, used_fallback) = if cfg.mode == "llm" {
			match self.expand_with_llm(query).await {
				Ok(queries) if !queries.is_empty() => (queries, false),
				Ok(_) => {
					warn!("Expansion provider returned no variants; using rule-based expansion.");

					(rule_based_expansion(query), true)
				},
				Err(err) => {
					warn!(error = %err, "Query expansion failed; using rule-based expansion.");

					(rule_based_expansion(query), true)
				},
			}
		} else {
			(rule_based_expansion(query), true)
		};
		let max_variants = cfg.max_variants as usize;
		let mut expanded =
			normalize_variants(queries, query, cfg.include_original, max_variants);

		// The deterministic path guarantees the normalized original survives
		// the cap, so the pipeline never stalls on this stage.
		if used_fallback || cfg.include_original {
			ensure_original(&mut expanded, &normalize_query(query), max_variants);
		}
		if expanded.is_empty() {
			expanded.push(normalize_query(query));
		}

		Ok(ExpandResponse { expanded_queries: expanded })
	}

	async fn expand_with_llm(&self, query: &str) -> ServiceResult<Vec<String>> {
		let messages = build_expansion_messages(query, self.cfg.expansion.max_variants);
		let raw =
			self.providers.expansion.expand(&self.cfg.providers.expansion, &messages).await?;
		let parsed: ExpansionOutput =
			serde_json::from_value(raw).map_err(|err| ServiceError::Provider {
				message: format!("Expansion returned invalid JSON: {err}"),
			})?;

		Ok(parsed.queries)
	}
}

/// Deterministic expansion: promotional-term augmentation plus category
/// keyword rules, with the normalized original query placed last so genuine
/// expansions keep priority. Always returns at least the original.
fn rule_based_expansion(query: &str) -> Vec<String> {
	let normalized = normalize_query(query);
	let mut expansions = Vec::new();

	for term in PROMO_TERMS {
		if !normalized.contains(term) {
			expansions.push(format!("{normalized} {term}"));
		}
	}

	if contains_any(&normalized, &["cloud", "aws", "server", "hosting"]) {
		expansions.extend([
			format!("{normalized} cloud computing"),
			format!("{normalized} web hosting deal"),
			format!("managed {normalized} discount"),
		]);
	} else if contains_any(&normalized, &["phone", "mobile", "smartphone"]) {
		expansions.extend([
			format!("{normalized} smartphone deal"),
			format!("{normalized} mobile phone offer"),
			format!("{normalized} electronics sale"),
		]);
	} else if contains_any(&normalized, &["laptop", "computer", "pc"]) {
		expansions.extend([
			format!("{normalized} computer deal"),
			format!("{normalized} laptop discount"),
			format!("{normalized} electronics promotion"),
		]);
	} else {
		expansions.extend([
			format!("best {normalized} deals"),
			format!("{normalized} special offer"),
			format!("cheap {normalized}"),
		]);
	}

	expansions.push(normalized);

	expansions
}

/// Light normalization of a raw query: trim, collapse whitespace, lowercase.
fn normalize_query(query: &str) -> String {
	query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
	needles.iter().any(|needle| haystack.contains(needle))
}

fn normalize_variants(
	queries: Vec<String>,
	original: &str,
	include_original: bool,
	max_variants: usize,
) -> Vec<String> {
	let mut out = Vec::new();
	let mut seen = HashSet::new();

	for query in queries {
		push_variant(&mut out, &mut seen, &query);
	}

	if include_original {
		push_variant(&mut out, &mut seen, &normalize_query(original));
	}

	out.truncate(max_variants);

	out
}

/// Keeps the normalized original in the variant set, replacing the lowest
/// priority entry when the cap is already reached.
fn ensure_original(variants: &mut Vec<String>, original: &str, max_variants: usize) {
	let key = original.to_lowercase();

	if variants.iter().any(|variant| variant.to_lowercase() == key) {
		return;
	}
	if variants.len() >= max_variants {
		variants.pop();
	}

	variants.push(original.to_string());
}

fn push_variant(out: &mut Vec<String>, seen: &mut HashSet<String>, value: &str) {
	let trimmed = value.trim();

	if trimmed.is_empty() {
		return;
	}

	let key = trimmed.to_lowercase();

	if seen.insert(key) {
		out.push(trimmed.to_string());
	}
}

fn build_expansion_messages(query: &str, max_variants: u32) -> Vec<Value> {
	let schema = serde_json::json!({
		"queries": ["string"]
	});
	let schema_text = serde_json::to_string_pretty(&schema)
		.unwrap_or_else(|_| "{\"queries\": [\"string\"]}".to_string());
	let system_prompt = "You are a query expansion engine for a promotion search system. \
Output must be valid JSON only and must match the provided schema exactly. \
Generate short long-tail keyword variations that preserve the shopping intent: \
specific product terms, promotional modifiers (discount, sale, offer, deal), \
category terms, and price or budget phrasing. Order variations from most to \
least relevant. Do not add explanations or extra fields.";
	let user_prompt = format!(
		"Return JSON matching this exact schema:\n{schema}\nConstraints:\n- MAX_QUERIES = {max}\nOriginal query:\n{query}",
		schema = schema_text,
		max = max_variants,
		query = query
	);

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}
