use serde::{Deserialize, Serialize};

use crate::promotion::PriceTier;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
	Casual,
	Professional,
	Enterprise,
}

/// Per-request user context. Supplied by the caller, never persisted.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct UserProfile {
	#[serde(default)]
	pub user_type: Option<UserType>,
	#[serde(default)]
	pub interests: Vec<String>,
	#[serde(default)]
	pub budget_level: Option<PriceTier>,
}

/// Fraction of the promotion's category tags present in the profile's
/// interest tags, compared case-insensitively. A promotion without tags
/// has no overlap signal and yields 0.
pub fn interest_overlap_ratio(categories: &[String], interests: &[String]) -> f32 {
	if categories.is_empty() || interests.is_empty() {
		return 0.0;
	}

	let matched = categories
		.iter()
		.filter(|category| {
			interests.iter().any(|interest| interest.eq_ignore_ascii_case(category))
		})
		.count();

	matched as f32 / categories.len() as f32
}
