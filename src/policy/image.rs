/// How a card's cover should be drawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cover {
	Image(String),
	/// Up to four child images tiled 2x2.
	Mosaic(Vec<String>),
	Placeholder(String),
}

/// Resolves `image` fields against the external asset host.
#[derive(Clone, Debug)]
pub struct ImageResolver {
	asset_base_url: String,
	asset_extension: String,
	placeholder: String,
}

pub const MOSAIC_TILES: usize = 4;

impl ImageResolver {
	pub fn new(asset_base_url: &str, asset_extension: &str, placeholder: &str) -> Self {
		Self {
			asset_base_url: asset_base_url.trim_end_matches('/').to_string(),
			asset_extension: asset_extension.trim_start_matches('.').to_string(),
			placeholder: placeholder.to_string(),
		}
	}

	/// Rooted and absolute URLs pass through; bare identifiers are asset ids.
	pub fn url(&self, image: &str) -> String {
		if image.starts_with('/') || image.starts_with("http") {
			image.to_string()
		} else {
			format!("{}/{}.{}", self.asset_base_url, image, self.asset_extension)
		}
	}

	/// URL of a record's own image, if it names one.
	pub fn image_url(&self, image: Option<&str>) -> Option<String> {
		image.filter(|i| !i.is_empty()).map(|i| self.url(i))
	}

	pub fn placeholder(&self) -> &str {
		&self.placeholder
	}

	pub fn cover(&self, image: Option<&str>, child_images: &[String]) -> Cover {
		match image.filter(|i| !i.is_empty()) {
			Some(image) => Cover::Image(self.url(image)),
			None if !child_images.is_empty() => Cover::Mosaic(
				child_images
					.iter()
					.take(MOSAIC_TILES)
					.map(|i| self.url(i))
					.collect(),
			),
			None => Cover::Placeholder(self.placeholder.clone()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn resolver() -> ImageResolver {
		ImageResolver::new("https://assets.example.org/assets/", "jpg", "/placeholder.png")
	}

	#[test]
	fn bare_ids_resolve_against_asset_host() {
		assert_eq!(
			resolver().url("5f2c"),
			"https://assets.example.org/assets/5f2c.jpg"
		);
	}

	#[test]
	fn rooted_and_absolute_urls_pass_through() {
		let r = resolver();
		assert_eq!(r.url("/images/A.webp"), "/images/A.webp");
		assert_eq!(r.url("https://cdn.example.org/x.png"), "https://cdn.example.org/x.png");
	}

	#[test]
	fn missing_or_blank_image_has_no_url() {
		let r = resolver();
		assert_eq!(r.image_url(None), None);
		assert_eq!(r.image_url(Some("")), None);
		assert_eq!(
			r.image_url(Some("5f2c")).as_deref(),
			Some("https://assets.example.org/assets/5f2c.jpg")
		);
	}

	#[test]
	fn folder_without_image_tiles_child_previews() {
		let children: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
		match resolver().cover(None, &children) {
			Cover::Mosaic(urls) => {
				assert_eq!(urls.len(), 4);
				assert!(urls[0].ends_with("/a.jpg"));
			}
			other => panic!("expected mosaic, got {other:?}"),
		}
		assert_eq!(
			resolver().cover(Some(""), &[]),
			Cover::Placeholder("/placeholder.png".into())
		);
	}
}
