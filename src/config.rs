use serde::Deserialize;

use crate::layout::LayoutKind;
use crate::policy::ImageResolver;

/// A top-level branch shown around the root before anything is fetched.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BranchSeed {
	pub slug: String,
	pub title: String,
	#[serde(default)]
	pub image: Option<String>,
}

impl BranchSeed {
	fn new(slug: &str, title: &str, image: Option<&str>) -> Self {
		Self {
			slug: slug.into(),
			title: title.into(),
			image: image.map(Into::into),
		}
	}
}

/// Runtime settings for the explorer. Every field has a default, so a partial
/// JSON object is enough to override a single value.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
	/// Directory of the per-node documents, relative to the site root.
	pub data_path: String,
	pub search_index_path: String,
	pub asset_base_url: String,
	pub asset_extension: String,
	pub placeholder_image: String,
	pub root_title: String,
	pub branches: Vec<BranchSeed>,
	pub layout: LayoutKind,
	/// Viewports narrower than this get the vertical force layout.
	pub narrow_viewport_width: f64,
	pub search_result_limit: usize,
}

impl Default for ExplorerConfig {
	fn default() -> Self {
		Self {
			data_path: "data/policy".into(),
			search_index_path: "search-index.json".into(),
			asset_base_url: "https://directus.pplethai.org/assets".into(),
			asset_extension: "jpg".into(),
			placeholder_image: "/pplepolicy/placeholder_policy.png".into(),
			root_title: "People's Party Policies".into(),
			branches: vec![
				BranchSeed::new("A", "ปฏิรูปรัฐและระบบราชการ", Some("/pplepolicy/A.webp")),
				BranchSeed::new("B", "ประชาธิปไตยและความมั่นคงใหม่", Some("/pplepolicy/B.webp")),
				BranchSeed::new("C", "คุณภาพชีวิต", Some("/pplepolicy/C.webp")),
				BranchSeed::new("D", "โมเดลเศรษฐกิจใหม่", Some("/pplepolicy/D.webp")),
			],
			layout: LayoutKind::Layered,
			narrow_viewport_width: 768.0,
			search_result_limit: 50,
		}
	}
}

impl ExplorerConfig {
	pub fn image_resolver(&self) -> ImageResolver {
		ImageResolver::new(
			&self.asset_base_url,
			&self.asset_extension,
			&self.placeholder_image,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let config: ExplorerConfig =
			serde_json::from_str(r#"{ "layout": "force", "search_result_limit": 10 }"#).unwrap();
		assert_eq!(config.layout, LayoutKind::Force);
		assert_eq!(config.search_result_limit, 10);
		assert_eq!(config.data_path, "data/policy");
		assert_eq!(config.branches.len(), 4);
	}
}
