use std::collections::HashMap;

use crate::{PromoService, ServiceResult};

const CONTEXT_WINDOW: usize = 2;
const MAX_CONTEXT_KEYWORDS: usize = 5;
const STOPWORDS: [&str; 40] = [
	"the", "and", "for", "are", "was", "were", "been", "have", "has", "had", "does", "did",
	"will", "would", "could", "should", "this", "that", "these", "those", "you", "your", "with",
	"from", "into", "about", "than", "then", "them", "they", "what", "when", "where", "which",
	"while", "who", "whom", "why", "how", "all",
];
const TECH_KEYWORDS: [&str; 7] = ["cloud", "server", "hosting", "aws", "api", "database", "software"];
const MOBILE_KEYWORDS: [&str; 5] = ["phone", "mobile", "smartphone", "android", "ios"];
const BUSINESS_KEYWORDS: [&str; 5] =
	["business", "enterprise", "professional", "office", "productivity"];

/// A pre-ranked promotion to be placed. Highest value first in the request.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SlotPromotion {
	pub id: String,
	pub title: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub link: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SlotRequest {
	pub search_results: Vec<String>,
	pub promotions: Vec<SlotPromotion>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
	Organic,
	Promoted,
}

/// One entry of the merged list. Promoted entries always carry the
/// `promotion_id` and a `label`, so they are never indistinguishable from
/// organic results in output metadata.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SlotItem {
	pub source: SlotSource,
	pub content: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub promotion_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SlotPlan {
	pub items: Vec<SlotItem>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SlotResponse {
	pub injected_results: SlotPlan,
}

impl PromoService {
	/// Interleaves promotions into the organic list under the placement
	/// budget: at most `max_ads` insertions, at least `min_spacing` organic
	/// items between insertions, organic order untouched. When the spacing
	/// invariant cannot be satisfied the remaining promotions are dropped,
	/// never squeezed in.
	pub fn optimize_ad_slots(&self, req: SlotRequest) -> ServiceResult<SlotResponse> {
		let slots = &self.cfg.slots;
		let plan = build_plan(
			&req.search_results,
			&req.promotions,
			slots.max_ads as usize,
			slots.min_spacing as usize,
			slots.first_slot as usize,
		);

		Ok(SlotResponse { injected_results: plan })
	}
}

fn build_plan(
	organic: &[String],
	promotions: &[SlotPromotion],
	max_ads: usize,
	min_spacing: usize,
	first_slot: usize,
) -> SlotPlan {
	if organic.is_empty() {
		return SlotPlan { items: Vec::new() };
	}

	// Insertion points are measured in organic items preceding the ad.
	let points =
		insertion_points(organic.len(), promotions.len().min(max_ads), min_spacing, first_slot);
	let mut inserted = 0_usize;
	let mut items = Vec::with_capacity(organic.len() + points.len());

	for (index, result) in organic.iter().enumerate() {
		items.push(organic_item(result));

		while inserted < points.len() && points[inserted] == index + 1 {
			items.push(promoted_item(&promotions[inserted], organic, index));
			inserted += 1;
		}
	}

	// Points equal to the organic length land after the loop body above,
	// so nothing is left to append here.
	SlotPlan { items }
}

/// Computes the ordered insertion points. The first promotion goes after
/// `first_slot` organic items (bounded by the list length); each subsequent
/// point sits at least `min_spacing` organic items further. A final
/// end-of-list point is used only when it honors the spacing.
fn insertion_points(
	organic_len: usize,
	ad_count: usize,
	min_spacing: usize,
	first_slot: usize,
) -> Vec<usize> {
	let mut points = Vec::with_capacity(ad_count);
	let mut next = first_slot.min(organic_len);

	while points.len() < ad_count {
		if next > organic_len {
			break;
		}

		points.push(next);

		next += min_spacing;
	}

	points
}

fn organic_item(content: &str) -> SlotItem {
	SlotItem {
		source: SlotSource::Organic,
		content: content.to_string(),
		promotion_id: None,
		label: None,
	}
}

fn promoted_item(promotion: &SlotPromotion, organic: &[String], position: usize) -> SlotItem {
	SlotItem {
		source: SlotSource::Promoted,
		content: render_ad_copy(promotion, organic, position),
		promotion_id: Some(promotion.id.clone()),
		label: Some("sponsored".to_string()),
	}
}

/// Renders the promoted entry with an intro derived from the surrounding
/// organic results, always marked as sponsored.
fn render_ad_copy(promotion: &SlotPromotion, organic: &[String], position: usize) -> String {
	let keywords = context_keywords(organic, position);
	let intro = contextual_intro(&keywords);
	let mut copy = format!("[Sponsored] {intro} {}", promotion.title);

	if !promotion.description.trim().is_empty() {
		copy.push_str(" - ");
		copy.push_str(promotion.description.trim());
	}
	if let Some(link) = promotion.link.as_deref().filter(|link| !link.trim().is_empty()) {
		copy.push_str(&format!(" ({link})"));
	}

	copy
}

/// Most frequent non-stopword terms in the organic results around the
/// insertion position, first occurrence breaking frequency ties.
fn context_keywords(organic: &[String], position: usize) -> Vec<String> {
	let start = position.saturating_sub(CONTEXT_WINDOW);
	let end = (position + CONTEXT_WINDOW + 1).min(organic.len());
	let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
	let mut order = 0_usize;

	for result in &organic[start..end] {
		for token in result
			.split(|ch: char| !ch.is_ascii_alphanumeric())
			.filter(|token| token.len() >= 3)
			.map(str::to_ascii_lowercase)
		{
			if STOPWORDS.contains(&token.as_str()) {
				continue;
			}

			let entry = counts.entry(token).or_insert((0, order));

			entry.0 += 1;
			order += 1;
		}
	}

	let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();

	ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then_with(|| a.1.1.cmp(&b.1.1)));
	ranked.truncate(MAX_CONTEXT_KEYWORDS);

	ranked.into_iter().map(|(token, _)| token).collect()
}

fn contextual_intro(keywords: &[String]) -> String {
	let matches_family =
		|family: &[&str]| keywords.iter().any(|keyword| family.contains(&keyword.as_str()));

	if matches_family(&TECH_KEYWORDS) {
		"Perfect for your tech needs:".to_string()
	} else if matches_family(&MOBILE_KEYWORDS) {
		"Great mobile deals for you:".to_string()
	} else if matches_family(&BUSINESS_KEYWORDS) {
		"Boost your business with this offer:".to_string()
	} else if let Some(keyword) = keywords.first() {
		format!("Related to {keyword}:")
	} else {
		"You might be interested in this:".to_string()
	}
}
