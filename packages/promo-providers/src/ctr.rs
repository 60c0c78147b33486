// std
use std::time::Duration as StdDuration;

// crates.io
use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};
use promo_config::ProviderConfig;

/// Asks the CTR model endpoint for one predicted engagement probability per
/// candidate feature row. Scores come back aligned to the request order.
pub async fn predict(cfg: &ProviderConfig, rows: &[Value]) -> Result<Vec<f32>> {
	let client = Client::builder().timeout(StdDuration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({ "model": cfg.model, "candidates": rows });
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_prediction_response(json, rows.len())
}

fn parse_prediction_response(json: Value, row_count: usize) -> Result<Vec<f32>> {
	let mut scores = vec![0.0_f32; row_count];
	let results = json
		.get("scores")
		.or_else(|| json.get("predictions"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Prediction response is missing scores array.".to_string(),
		})?;

	for item in results {
		let index = item.get("index").and_then(|v| v.as_u64()).ok_or_else(|| {
			Error::InvalidResponse { message: "Prediction result missing index.".to_string() }
		})? as usize;
		let score = item
			.get("score")
			.or_else(|| item.get("probability"))
			.and_then(|v| v.as_f64())
			.ok_or_else(|| Error::InvalidResponse {
				message: "Prediction result missing score.".to_string(),
			})? as f32;

		if index < scores.len() {
			scores[index] = score;
		}
	}

	Ok(scores)
}
