use super::types::SearchEntry;

/// Flattened full-text index over the leaf documents.
#[derive(Clone, Debug, Default)]
pub struct SearchIndex {
	entries: Vec<SearchEntry>,
}

impl SearchIndex {
	pub fn new(entries: Vec<SearchEntry>) -> Self {
		Self { entries }
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	#[cfg(test)]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Case-insensitive substring match on title or search text, in document
	/// order, at most `limit` hits.
	pub fn query(&self, term: &str, limit: usize) -> Vec<&SearchEntry> {
		let needle = term.trim().to_lowercase();
		if needle.is_empty() {
			return Vec::new();
		}
		self.entries
			.iter()
			.filter(|e| {
				e.title.to_lowercase().contains(&needle)
					|| e.search_text.to_lowercase().contains(&needle)
			})
			.take(limit)
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::policy::types::NodeKind;

	fn entry(slug: &str, title: &str, text: &str) -> SearchEntry {
		SearchEntry {
			slug: slug.into(),
			title: title.into(),
			summary: String::new(),
			kind: NodeKind::File,
			level: Some(slug.split('-').count() as u32),
			image: None,
			search_text: text.into(),
		}
	}

	#[test]
	fn matches_title_or_text_ignoring_case() {
		let index = SearchIndex::new(vec![
			entry("A-1-1", "Open Budget", "publish every line item"),
			entry("B-2-1", "Police reform", "civilian OVERSIGHT board"),
			entry("C-1-1", "Clean air", "pm2.5 limits"),
		]);
		let hits: Vec<_> = index.query("budget", 50).iter().map(|e| e.slug.as_str()).collect();
		assert_eq!(hits, ["A-1-1"]);
		let hits: Vec<_> = index.query("Oversight", 50).iter().map(|e| e.slug.as_str()).collect();
		assert_eq!(hits, ["B-2-1"]);
	}

	#[test]
	fn blank_term_returns_nothing() {
		let index = SearchIndex::new(vec![entry("A-1-1", "Open Budget", "")]);
		assert!(index.query("   ", 50).is_empty());
	}

	#[test]
	fn caps_results_in_document_order() {
		let entries = (0..80)
			.map(|i| entry(&format!("D-1-{i}"), &format!("Tax item {i}"), ""))
			.collect();
		let index = SearchIndex::new(entries);
		let hits = index.query("tax", 50);
		assert_eq!(hits.len(), 50);
		assert_eq!(hits[0].slug, "D-1-0");
		assert_eq!(hits[49].slug, "D-1-49");
	}
}
