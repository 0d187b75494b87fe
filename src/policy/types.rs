use serde::{Deserialize, Serialize};

/// Whether a policy document groups other documents or is a leaf.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
	#[default]
	Folder,
	File,
}

impl NodeKind {
	pub fn is_folder(self) -> bool {
		self == NodeKind::Folder
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
	#[serde(rename = "type", default)]
	pub kind: String,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub content: String,
}

/// A record of the static policy tree, as published under `{level}/{slug}.json`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyNode {
	#[serde(default)]
	pub id: Option<i64>,
	pub slug: String,
	pub title: String,
	#[serde(rename = "type", default)]
	pub kind: NodeKind,
	#[serde(default)]
	pub content: Option<String>,
	#[serde(default)]
	pub summary: Option<String>,
	#[serde(default)]
	pub image: Option<String>,
	#[serde(default)]
	pub content_blocks: Option<Vec<ContentBlock>>,
	#[serde(default)]
	pub children: Option<Vec<PolicyNode>>,
	#[serde(default)]
	pub level: Option<u32>,
}

impl PolicyNode {
	pub fn children(&self) -> &[PolicyNode] {
		self.children.as_deref().unwrap_or_default()
	}
}

/// Envelope of a per-node JSON document.
#[derive(Clone, Debug, Deserialize)]
pub struct PolicyResponse {
	pub policy: PolicyNode,
}

/// One flattened row of `search-index.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
	pub slug: String,
	pub title: String,
	#[serde(default)]
	pub summary: String,
	#[serde(rename = "type", default)]
	pub kind: NodeKind,
	#[serde(default)]
	pub level: Option<u32>,
	#[serde(default)]
	pub image: Option<String>,
	#[serde(default)]
	pub search_text: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_policy_document() {
		let raw = r#"{
			"policy": {
				"id": 12,
				"slug": "A-2",
				"title": "Civil service",
				"type": "Folder",
				"image": null,
				"children": [
					{ "id": 13, "slug": "A-2-1", "title": "Merit pay", "type": "File", "image": "abc" }
				]
			}
		}"#;
		let doc: PolicyResponse = serde_json::from_str(raw).unwrap();
		assert_eq!(doc.policy.kind, NodeKind::Folder);
		assert_eq!(doc.policy.children().len(), 1);
		assert_eq!(doc.policy.children()[0].image.as_deref(), Some("abc"));
		assert_eq!(doc.policy.children()[0].kind, NodeKind::File);
	}

	#[test]
	fn missing_children_reads_as_empty() {
		let raw = r#"{ "policy": { "slug": "C-1-4", "title": "Leaf", "type": "File",
			"contentBlocks": [{ "type": "text", "content": "<p>body</p>" }] } }"#;
		let doc: PolicyResponse = serde_json::from_str(raw).unwrap();
		assert!(doc.policy.children().is_empty());
		let blocks = doc.policy.content_blocks.unwrap();
		assert_eq!(blocks[0].content, "<p>body</p>");
		assert_eq!(blocks[0].title, None);
	}
}
