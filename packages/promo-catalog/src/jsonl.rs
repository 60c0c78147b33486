use promo_domain::PromotionRecord;
use tracing::warn;

/// Parses a JSONL promotion file: one record per non-empty line. Malformed
/// lines are skipped and counted rather than failing the whole file.
pub fn parse_records(raw: &str) -> (Vec<PromotionRecord>, usize) {
	let mut records = Vec::new();
	let mut malformed = 0_usize;

	for (index, line) in raw.lines().enumerate() {
		let line = line.trim();

		if line.is_empty() {
			continue;
		}

		match serde_json::from_str::<PromotionRecord>(line) {
			Ok(record) => records.push(record),
			Err(err) => {
				warn!(line = index + 1, error = %err, "Skipping malformed promotion line.");
				malformed += 1;
			},
		}
	}

	(records, malformed)
}
