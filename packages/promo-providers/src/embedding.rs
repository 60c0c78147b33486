use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};
use promo_config::{DETERMINISTIC_EMBEDDER, EmbeddingProviderConfig};

/// Embeds a batch of texts into the configured vector space.
///
/// With `provider_id = "deterministic"` the built-in hash embedder is used
/// and the call cannot fail; any other id is treated as a remote
/// OpenAI-compatible embeddings endpoint.
pub async fn embed(cfg: &EmbeddingProviderConfig, texts: &[String]) -> Result<Vec<Vec<f32>>> {
	if cfg.provider_id == DETERMINISTIC_EMBEDDER {
		return Ok(texts
			.iter()
			.map(|text| hash_embedding(text, cfg.dimensions as usize))
			.collect());
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_embedding_response(json)
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;

	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
			Error::InvalidResponse { message: "Embedding item missing embedding array.".to_string() }
		})?;
		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "Embedding value must be numeric.".to_string(),
			})?;

			vec.push(number as f32);
		}

		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

/// Deterministic bag-of-tokens embedding.
///
/// Each token hashes to a fixed pseudo-random direction (blake3 XOF) and the
/// token directions are summed and normalized, so texts sharing tokens land
/// near each other while unrelated texts stay near-orthogonal. Empty or
/// token-free text maps to the zero vector, which similarity defines as 0.
pub fn hash_embedding(text: &str, dimensions: usize) -> Vec<f32> {
	let mut vector = vec![0.0_f32; dimensions];
	let mut token_count = 0_usize;

	for token in tokenize(text) {
		token_count += 1;

		let mut hasher = blake3::Hasher::new();

		hasher.update(token.as_bytes());

		let mut reader = hasher.finalize_xof();
		let mut buf = [0_u8; 4];

		for slot in vector.iter_mut() {
			reader.fill(&mut buf);

			let raw = u32::from_le_bytes(buf);

			// Uniform in [-1, 1).
			*slot += (f64::from(raw) / f64::from(u32::MAX) * 2.0 - 1.0) as f32;
		}
	}

	if token_count == 0 {
		return vector;
	}

	let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();

	if norm > 0.0 {
		for value in vector.iter_mut() {
			*value /= norm;
		}
	}

	vector
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
	text.split(|ch: char| !ch.is_ascii_alphanumeric())
		.filter(|token| !token.is_empty())
		.map(|token| token.to_ascii_lowercase())
}
