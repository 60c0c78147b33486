use serde::{Deserialize, Serialize};

/// Price tier of a promotion, also used as a user's budget level. Variants
/// are ordered so adjacency can be derived from the discriminant distance.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
	Low,
	Medium,
	High,
}
impl PriceTier {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Low => "low",
			Self::Medium => "medium",
			Self::High => "high",
		}
	}

	pub fn is_adjacent_to(self, other: Self) -> bool {
		(self as i8 - other as i8).abs() == 1
	}
}

/// A promotion held by the catalog. Immutable once the catalog is built;
/// the embedding dimension is validated against the catalog's vector space.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Promotion {
	pub id: String,
	pub title: String,
	pub description: String,
	#[serde(default)]
	pub link: Option<String>,
	#[serde(default)]
	pub categories: Vec<String>,
	pub price_tier: PriceTier,
	pub base_ctr: f32,
	pub embedding: Vec<f32>,
}
impl Promotion {
	/// Text that is embedded for this promotion. Queries must be embedded
	/// into the same vector space for similarities to be meaningful.
	pub fn embedding_text(&self) -> String {
		format!("{} {}", self.title, self.description)
	}
}

/// A promotion as read from disk or the wire. The embedding is optional;
/// records without one are embedded when the catalog is (re)loaded.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PromotionRecord {
	pub id: String,
	pub title: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub link: Option<String>,
	#[serde(default)]
	pub categories: Vec<String>,
	pub price_tier: PriceTier,
	pub base_ctr: f32,
	#[serde(default)]
	pub embedding: Option<Vec<f32>>,
}
impl PromotionRecord {
	pub fn embedding_text(&self) -> String {
		format!("{} {}", self.title, self.description)
	}

	pub fn into_promotion(self, embedding: Vec<f32>) -> Promotion {
		Promotion {
			id: self.id,
			title: self.title,
			description: self.description,
			link: self.link,
			categories: self.categories,
			price_tier: self.price_tier,
			base_ctr: self.base_ctr,
			embedding,
		}
	}
}
