use std::collections::{HashMap, HashSet, VecDeque};

use log::{debug, error, warn};
use thiserror::Error;

use super::branch::{ROOT_ID, ancestor_slugs};
use crate::config::BranchSeed;
use crate::policy::{ContentBlock, NodeKind, PolicyNode};

const PREVIEW_IMAGES: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
	#[error("no node with id {0}")]
	UnknownNode(String),
	#[error("{0} is not a folder")]
	NotAFolder(String),
	#[error("{0} is already expanded")]
	AlreadyExpanded(String),
	#[error("{0} is not expanded")]
	NotExpanded(String),
	#[error("{0} is still loading")]
	Busy(String),
	#[error("the root cannot be collapsed")]
	RootPinned,
	#[error("edge {parent} -> {child} would close a cycle")]
	Cycle { parent: String, child: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub title: String,
	pub kind: NodeKind,
	pub level: u32,
	/// Center of the node's card.
	pub position: Point,
	pub expanded: bool,
	/// Children fetched at least once.
	pub loaded: bool,
	pub loading: bool,
	pub highlighted: bool,
	pub dimmed: bool,
	pub hidden: bool,
	pub image: Option<String>,
	pub child_preview_images: Vec<String>,
	pub summary: Option<String>,
	pub content_blocks: Vec<ContentBlock>,
}

impl GraphNode {
	fn new(id: &str, title: &str, kind: NodeKind, level: u32) -> Self {
		Self {
			id: id.to_string(),
			title: title.to_string(),
			kind,
			level,
			position: Point::default(),
			expanded: false,
			loaded: false,
			loading: false,
			highlighted: false,
			dimmed: false,
			hidden: false,
			image: None,
			child_preview_images: Vec::new(),
			summary: None,
			content_blocks: Vec::new(),
		}
	}

	fn from_policy(record: &PolicyNode, level: u32) -> Self {
		Self {
			image: record.image.clone(),
			summary: record.summary.clone(),
			content_blocks: record.content_blocks.clone().unwrap_or_default(),
			..Self::new(&record.slug, &record.title, record.kind, level)
		}
	}

	pub fn is_root(&self) -> bool {
		self.id == ROOT_ID
	}

	/// The record handed to the detail view.
	pub fn to_policy_node(&self) -> PolicyNode {
		PolicyNode {
			slug: self.id.clone(),
			title: self.title.clone(),
			kind: self.kind,
			summary: self.summary.clone(),
			image: self.image.clone(),
			content_blocks: (!self.content_blocks.is_empty()).then(|| self.content_blocks.clone()),
			level: Some(self.level),
			..PolicyNode::default()
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	pub id: String,
	pub source: String,
	pub target: String,
	pub hidden: bool,
	/// Outside the current focus; drawn translucent.
	pub faded: bool,
	/// Touches the hovered node.
	pub emphasized: bool,
}

/// Result of asking a folder to expand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpandStart {
	/// Children were already loaded and are visible again.
	Revealed,
	/// Children must be fetched first; the node is now `loading`.
	Fetch { level: u32, slug: String },
}

/// The materialized part of the policy tree plus per-node view state.
///
/// Nodes keep insertion order so every traversal, and the layout built on
/// top of it, is deterministic.
pub struct PolicyGraph {
	nodes: Vec<GraphNode>,
	index: HashMap<String, usize>,
	edges: Vec<GraphEdge>,
	children: HashMap<String, Vec<String>>,
	parents: HashMap<String, String>,
	selected: Option<String>,
	hovered: Option<String>,
}

impl PolicyGraph {
	pub fn new(root_title: &str, branches: &[BranchSeed]) -> Self {
		let mut root = GraphNode::new(ROOT_ID, root_title, NodeKind::Folder, 0);
		root.expanded = true;
		root.loaded = true;

		let mut graph = Self {
			nodes: vec![root],
			index: HashMap::from([(ROOT_ID.to_string(), 0)]),
			edges: Vec::new(),
			children: HashMap::new(),
			parents: HashMap::new(),
			selected: None,
			hovered: None,
		};
		for seed in branches {
			let mut node = GraphNode::new(&seed.slug, &seed.title, NodeKind::Folder, 1);
			node.image = seed.image.clone();
			if let Err(err) = graph.insert_child(ROOT_ID, node, false) {
				error!("skipping branch {}: {err}", seed.slug);
			}
		}
		graph
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	fn node_mut(&mut self, id: &str) -> Result<&mut GraphNode, GraphError> {
		match self.index.get(id) {
			Some(&i) => Ok(&mut self.nodes[i]),
			None => Err(GraphError::UnknownNode(id.to_string())),
		}
	}

	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	pub fn edges(&self) -> &[GraphEdge] {
		&self.edges
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	pub fn children_of(&self, id: &str) -> &[String] {
		self.children.get(id).map(Vec::as_slice).unwrap_or_default()
	}

	pub fn parent_of(&self, id: &str) -> Option<&str> {
		self.parents.get(id).map(String::as_str)
	}

	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	/// Ancestors of `id`, root first.
	pub fn ancestors(&self, id: &str) -> Vec<String> {
		let mut chain = Vec::new();
		let mut current = id;
		while let Some(parent) = self.parents.get(current) {
			chain.push(parent.clone());
			current = parent;
		}
		chain.reverse();
		chain
	}

	/// Every node reachable from `id` along edges, breadth first.
	pub fn descendants(&self, id: &str) -> Vec<String> {
		let mut out = Vec::new();
		let mut seen = HashSet::new();
		let mut queue: VecDeque<&str> = VecDeque::from([id]);
		while let Some(current) = queue.pop_front() {
			for child in self.children_of(current) {
				if seen.insert(child.as_str()) {
					out.push(child.clone());
					queue.push_back(child);
				}
			}
		}
		out
	}

	/// Root-to-node chain for the detail view, root excluded.
	pub fn breadcrumbs(&self, id: &str) -> Vec<&GraphNode> {
		let mut chain = self.ancestors(id);
		chain.push(id.to_string());
		chain
			.iter()
			.filter_map(|a| self.node(a))
			.filter(|n| !n.is_root())
			.collect()
	}

	fn is_ancestor(&self, candidate: &str, of: &str) -> bool {
		let mut current = of;
		while let Some(parent) = self.parents.get(current) {
			if parent == candidate {
				return true;
			}
			current = parent;
		}
		false
	}

	/// Adds `node` under `parent` unless it is already present. Returns
	/// whether anything was inserted.
	fn insert_child(&mut self, parent: &str, mut node: GraphNode, hidden: bool) -> Result<bool, GraphError> {
		if node.id == parent || self.is_ancestor(&node.id, parent) {
			return Err(GraphError::Cycle {
				parent: parent.to_string(),
				child: node.id,
			});
		}
		if self.index.contains_key(&node.id) {
			match self.parents.get(&node.id) {
				Some(existing) if existing != parent => {
					warn!("{} already hangs under {existing}, ignoring {parent}", node.id)
				}
				_ => {}
			}
			return Ok(false);
		}

		let id = node.id.clone();
		node.hidden = hidden;
		self.index.insert(id.clone(), self.nodes.len());
		self.nodes.push(node);

		let edge_id = format!("{parent}-{id}");
		self.edges.push(GraphEdge {
			id: edge_id,
			source: parent.to_string(),
			target: id.clone(),
			hidden,
			faded: false,
			emphasized: false,
		});
		self.children.entry(parent.to_string()).or_default().push(id.clone());
		self.parents.insert(id, parent.to_string());
		Ok(true)
	}

	/// Unhides the children of `id`, and theirs where they are expanded.
	fn reveal(&mut self, id: &str) {
		let mut stack = vec![id.to_string()];
		while let Some(current) = stack.pop() {
			if self.node(&current).is_none_or(|n| n.hidden || !n.expanded) {
				continue;
			}
			for child in self.children_of(&current).to_vec() {
				if let Ok(node) = self.node_mut(&child) {
					node.hidden = false;
				}
				let edge_id = format!("{current}-{child}");
				if let Some(edge) = self.edges.iter_mut().find(|e| e.id == edge_id) {
					edge.hidden = false;
				}
				stack.push(child);
			}
		}
	}

	fn conceal(&mut self, id: &str) {
		let descendants: HashSet<String> = self.descendants(id).into_iter().collect();
		for node in self.nodes.iter_mut().filter(|n| descendants.contains(&n.id)) {
			node.hidden = true;
		}
		for edge in self.edges.iter_mut() {
			if edge.source == id || descendants.contains(&edge.target) {
				edge.hidden = true;
			}
		}
	}

	pub fn begin_expand(&mut self, id: &str) -> Result<ExpandStart, GraphError> {
		let node = self.node_mut(id)?;
		if !node.kind.is_folder() {
			return Err(GraphError::NotAFolder(id.to_string()));
		}
		if node.expanded {
			return Err(GraphError::AlreadyExpanded(id.to_string()));
		}
		if node.loading {
			return Err(GraphError::Busy(id.to_string()));
		}
		if node.loaded {
			node.expanded = true;
			self.reveal(id);
			return Ok(ExpandStart::Revealed);
		}
		node.loading = true;
		Ok(ExpandStart::Fetch {
			level: node.level,
			slug: node.id.clone(),
		})
	}

	/// Merges fetched children under `id` and marks it expanded. Ids already
	/// present are left alone, so late or duplicate results are harmless.
	/// Returns how many nodes were added.
	pub fn finish_expand(&mut self, id: &str, children: &[PolicyNode]) -> usize {
		let Ok(node) = self.node_mut(id) else {
			warn!("fetched children for unknown node {id}");
			return 0;
		};
		node.expanded = true;
		node.loaded = true;
		node.loading = false;
		node.child_preview_images = preview_images(children);
		let (level, hidden) = (node.level + 1, node.hidden);

		let mut added = 0;
		for child in children {
			match self.insert_child(id, GraphNode::from_policy(child, level), hidden) {
				Ok(true) => added += 1,
				Ok(false) => {}
				Err(err) => error!("{err}"),
			}
		}
		self.reveal(id);
		debug!("expanded {id}: {added} new of {} children", children.len());
		added
	}

	/// Merges children that arrived after `id` was already settled by another
	/// route. Expansion state is kept; new children stay hidden unless `id` is
	/// open and visible. Returns how many nodes were added.
	pub fn merge_late(&mut self, id: &str, children: &[PolicyNode]) -> usize {
		let Ok(node) = self.node_mut(id) else {
			warn!("late children for unknown node {id}");
			return 0;
		};
		node.loaded = true;
		if node.child_preview_images.is_empty() {
			node.child_preview_images = preview_images(children);
		}
		let (level, hidden) = (node.level + 1, node.hidden || !node.expanded);

		let mut added = 0;
		for child in children {
			match self.insert_child(id, GraphNode::from_policy(child, level), hidden) {
				Ok(true) => added += 1,
				Ok(false) => {}
				Err(err) => error!("{err}"),
			}
		}
		debug!("late merge under {id}: {added} new of {} children", children.len());
		added
	}

	/// A fetch failed: the node goes back to collapsed and unloaded.
	pub fn abort_expand(&mut self, id: &str) {
		if let Ok(node) = self.node_mut(id) {
			node.loading = false;
		}
	}

	pub fn collapse(&mut self, id: &str) -> Result<(), GraphError> {
		if id == ROOT_ID {
			return Err(GraphError::RootPinned);
		}
		let node = self.node_mut(id)?;
		if !node.expanded {
			return Err(GraphError::NotExpanded(id.to_string()));
		}
		node.expanded = false;
		self.conceal(id);
		Ok(())
	}

	/// Records preview images for a node without expanding it.
	pub fn set_child_previews(&mut self, id: &str, children: &[PolicyNode]) {
		if let Ok(node) = self.node_mut(id) {
			node.child_preview_images = preview_images(children);
		}
	}

	/// Materializes every ancestor of `target` from fetched results, given in
	/// any order and keyed by ancestor slug, in one pass. Ancestors already
	/// loaded need no entry. Returns whether `target` is now in the graph.
	pub fn merge_path(&mut self, target: &str, fetched: Vec<(String, Option<Vec<PolicyNode>>)>) -> bool {
		let mut fetched: HashMap<String, Option<Vec<PolicyNode>>> = fetched.into_iter().collect();
		for slug in ancestor_slugs(target) {
			let Some(node) = self.node(&slug) else {
				warn!("{slug} is not materialized, path to {target} stops short");
				break;
			};
			if node.loaded {
				if let Ok(node) = self.node_mut(&slug) {
					node.expanded = true;
					node.loading = false;
				}
				self.reveal(&slug);
				continue;
			}
			match fetched.remove(&slug).flatten() {
				Some(children) => {
					self.finish_expand(&slug, &children);
				}
				None => {
					self.abort_expand(&slug);
					warn!("children of {slug} unavailable, path to {target} stops short");
					break;
				}
			}
		}
		self.index.contains_key(target)
	}

	/// Sets or clears the focused node and recomputes dim/highlight flags.
	pub fn select(&mut self, target: Option<&str>) {
		self.selected = target
			.filter(|id| self.index.contains_key(*id))
			.map(str::to_string);
		self.refresh_focus();
	}

	pub fn hover(&mut self, target: Option<&str>) {
		self.hovered = target
			.filter(|id| self.index.contains_key(*id))
			.map(str::to_string);
		self.refresh_focus();
	}

	/// Reapplies selection (or, without one, hover) flags; call after the
	/// node set changes.
	pub fn refresh_focus(&mut self) {
		if let Some(selected) = self.selected.clone() {
			let mut related: HashSet<String> = self.ancestors(&selected).into_iter().collect();
			related.extend(self.descendants(&selected));
			related.insert(selected.clone());
			for node in self.nodes.iter_mut() {
				node.dimmed = !related.contains(&node.id);
				node.highlighted = node.id == selected;
			}
			for edge in self.edges.iter_mut() {
				edge.faded = !(related.contains(&edge.source) && related.contains(&edge.target));
				edge.emphasized = false;
			}
		} else if let Some(hovered) = self.hovered.clone() {
			let mut lit: HashSet<String> = self.children_of(&hovered).iter().cloned().collect();
			lit.extend(self.parent_of(&hovered).map(str::to_string));
			lit.insert(hovered.clone());
			for node in self.nodes.iter_mut() {
				node.dimmed = false;
				node.highlighted = lit.contains(&node.id);
			}
			for edge in self.edges.iter_mut() {
				edge.emphasized = edge.source == hovered || edge.target == hovered;
				edge.faded = !edge.emphasized;
			}
		} else {
			for node in self.nodes.iter_mut() {
				node.dimmed = false;
				node.highlighted = false;
			}
			for edge in self.edges.iter_mut() {
				edge.faded = false;
				edge.emphasized = false;
			}
		}
	}

	pub fn apply_positions(&mut self, positions: &HashMap<String, Point>) {
		for node in self.nodes.iter_mut() {
			if let Some(p) = positions.get(&node.id) {
				node.position = *p;
			}
		}
	}
}

fn preview_images(children: &[PolicyNode]) -> Vec<String> {
	children
		.iter()
		.filter_map(|c| c.image.clone())
		.filter(|i| !i.is_empty())
		.take(PREVIEW_IMAGES)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ExplorerConfig;

	fn graph() -> PolicyGraph {
		let config = ExplorerConfig::default();
		PolicyGraph::new(&config.root_title, &config.branches)
	}

	fn record(slug: &str, kind: NodeKind) -> PolicyNode {
		PolicyNode {
			slug: slug.into(),
			title: format!("Policy {slug}"),
			kind,
			..PolicyNode::default()
		}
	}

	fn folders(slugs: &[&str]) -> Vec<PolicyNode> {
		slugs.iter().map(|s| record(s, NodeKind::Folder)).collect()
	}

	fn expand(g: &mut PolicyGraph, id: &str, children: &[&str]) {
		match g.begin_expand(id).unwrap() {
			ExpandStart::Fetch { .. } => {
				g.finish_expand(id, &folders(children));
			}
			ExpandStart::Revealed => {}
		}
	}

	fn assert_consistent(g: &PolicyGraph) {
		for edge in g.edges() {
			let source = g.node(&edge.source).expect("edge source exists");
			let target = g.node(&edge.target).expect("edge target exists");
			if source.hidden || target.hidden {
				assert!(edge.hidden, "edge {} touches a hidden node", edge.id);
			}
		}
		for node in g.nodes().iter().filter(|n| !n.is_root()) {
			let incoming = g.edges().iter().filter(|e| e.target == node.id).count();
			assert_eq!(incoming, 1, "{} has {incoming} parents", node.id);
		}
		let root = g.node(ROOT_ID).unwrap();
		assert!(root.expanded && !root.hidden && !root.loading);
	}

	fn visible(g: &PolicyGraph) -> Vec<&str> {
		g.nodes().iter().filter(|n| !n.hidden).map(|n| n.id.as_str()).collect()
	}

	#[test]
	fn starts_with_root_and_four_branches() {
		let g = graph();
		assert_eq!(g.node_count(), 5);
		assert_eq!(g.edge_count(), 4);
		assert!(g.edges().iter().all(|e| e.source == ROOT_ID));
		assert_eq!(g.children_of(ROOT_ID), ["A", "B", "C", "D"]);
		assert_eq!(g.node("C").unwrap().level, 1);
		assert_consistent(&g);
	}

	#[test]
	fn expand_marks_loading_then_merges_children() {
		let mut g = graph();
		assert_eq!(
			g.begin_expand("A"),
			Ok(ExpandStart::Fetch { level: 1, slug: "A".into() })
		);
		assert!(g.node("A").unwrap().loading);
		assert_eq!(g.begin_expand("A"), Err(GraphError::Busy("A".into())));

		let added = g.finish_expand("A", &folders(&["A-1", "A-2"]));
		assert_eq!(added, 2);
		let a = g.node("A").unwrap();
		assert!(a.expanded && a.loaded && !a.loading);
		assert_eq!(g.node("A-2").unwrap().level, 2);
		let child = g.node("A-2").unwrap();
		assert!(!child.expanded && !child.loaded && !child.loading && !child.hidden);
		assert_eq!(g.edge_count(), 6);
		assert!(g.edges().iter().any(|e| e.id == "A-A-2"));
		assert_consistent(&g);
	}

	#[test]
	fn empty_folder_still_expands() {
		let mut g = graph();
		expand(&mut g, "C", &[]);
		let c = g.node("C").unwrap();
		assert!(c.expanded && c.loaded);
		assert_eq!(g.node_count(), 5);
	}

	#[test]
	fn files_do_not_expand() {
		let mut g = graph();
		g.begin_expand("A").unwrap();
		g.finish_expand("A", &[record("A-3", NodeKind::File)]);
		assert_eq!(g.begin_expand("A-3"), Err(GraphError::NotAFolder("A-3".into())));
	}

	#[test]
	fn collapse_hides_every_descendant_and_keeps_data() {
		let mut g = graph();
		expand(&mut g, "A", &["A-1", "A-2"]);
		expand(&mut g, "A-2", &["A-2-1", "A-2-2"]);
		g.collapse("A").unwrap();

		assert_eq!(visible(&g), ["root", "A", "B", "C", "D"]);
		assert!(g.node("A-2").unwrap().expanded, "nested state is retained");
		assert_eq!(g.node_count(), 9);
		assert_consistent(&g);
		assert_eq!(g.collapse("A"), Err(GraphError::NotExpanded("A".into())));
	}

	#[test]
	fn reexpand_reveals_without_fetch_and_restores_nested_state() {
		let mut g = graph();
		expand(&mut g, "A", &["A-1", "A-2"]);
		expand(&mut g, "A-2", &["A-2-1"]);
		g.collapse("A").unwrap();

		assert_eq!(g.begin_expand("A"), Ok(ExpandStart::Revealed));
		assert_eq!(visible(&g), ["root", "A", "B", "C", "D", "A-1", "A-2", "A-2-1"]);
		assert_consistent(&g);
	}

	#[test]
	fn late_children_under_a_collapsed_ancestor_stay_hidden() {
		let mut g = graph();
		expand(&mut g, "A", &["A-1", "A-2"]);
		assert!(matches!(g.begin_expand("A-2"), Ok(ExpandStart::Fetch { .. })));
		g.collapse("A").unwrap();
		g.finish_expand("A-2", &folders(&["A-2-1"]));

		assert!(g.node("A-2-1").unwrap().hidden);
		assert_consistent(&g);
	}

	#[test]
	fn duplicate_results_merge_as_no_op() {
		let mut g = graph();
		expand(&mut g, "B", &["B-1", "B-2"]);
		let added = g.finish_expand("B", &folders(&["B-1", "B-2"]));
		assert_eq!(added, 0);
		assert_eq!(g.node_count(), 7);
		assert_eq!(g.edge_count(), 6);
	}

	#[test]
	fn late_merge_keeps_a_collapsed_node_closed() {
		let mut g = graph();
		expand(&mut g, "A", &["A-1"]);
		g.collapse("A").unwrap();

		let added = g.merge_late("A", &folders(&["A-1", "A-2"]));
		assert_eq!(added, 1);
		let a = g.node("A").unwrap();
		assert!(!a.expanded && a.loaded && !a.loading);
		assert!(g.node("A-1").unwrap().hidden);
		assert!(g.node("A-2").unwrap().hidden);
		assert_consistent(&g);

		assert_eq!(g.begin_expand("A"), Ok(ExpandStart::Revealed));
		assert_eq!(visible(&g), ["root", "A", "B", "C", "D", "A-1", "A-2"]);
	}

	#[test]
	fn abort_leaves_node_retryable() {
		let mut g = graph();
		g.begin_expand("D").unwrap();
		g.abort_expand("D");
		let d = g.node("D").unwrap();
		assert!(!d.loading && !d.loaded && !d.expanded);
		assert!(matches!(g.begin_expand("D"), Ok(ExpandStart::Fetch { .. })));
	}

	#[test]
	fn cyclic_edges_are_rejected() {
		let mut g = graph();
		expand(&mut g, "A", &["A-1"]);
		let err = g
			.insert_child("A-1", GraphNode::new("A", "loop", NodeKind::Folder, 3), false)
			.unwrap_err();
		assert_eq!(
			err,
			GraphError::Cycle { parent: "A-1".into(), child: "A".into() }
		);
		assert_eq!(g.edge_count(), 5);
	}

	#[test]
	fn select_dims_everything_outside_lineage() {
		let mut g = graph();
		expand(&mut g, "A", &["A-1", "A-2"]);
		expand(&mut g, "A-2", &["A-2-1"]);
		g.select(Some("A-2"));

		let dimmed: Vec<&str> = g.nodes().iter().filter(|n| n.dimmed).map(|n| n.id.as_str()).collect();
		assert_eq!(dimmed, ["B", "C", "D", "A-1"]);
		assert!(g.node("A-2").unwrap().highlighted);
		assert!(!g.node("A").unwrap().highlighted);
		let faded: Vec<&str> = g.edges().iter().filter(|e| e.faded).map(|e| e.id.as_str()).collect();
		assert_eq!(faded, ["root-B", "root-C", "root-D", "A-A-1"]);

		g.select(None);
		assert!(g.nodes().iter().all(|n| !n.dimmed && !n.highlighted));
		assert!(g.edges().iter().all(|e| !e.faded));
	}

	#[test]
	fn hover_lights_neighbours_until_a_selection_overrides() {
		let mut g = graph();
		expand(&mut g, "B", &["B-1", "B-2"]);
		g.hover(Some("B"));
		let lit: Vec<&str> = g.nodes().iter().filter(|n| n.highlighted).map(|n| n.id.as_str()).collect();
		assert_eq!(lit, ["root", "B", "B-1", "B-2"]);
		assert!(g.edges().iter().filter(|e| e.emphasized).count() == 3);
		assert!(g.edges().iter().find(|e| e.id == "root-A").unwrap().faded);

		g.select(Some("C"));
		g.hover(Some("B-1"));
		assert!(!g.node("B-1").unwrap().highlighted);
		assert!(g.node("C").unwrap().highlighted);

		g.select(None);
		assert!(g.node("B-1").unwrap().highlighted, "hover resumes once selection clears");
		g.hover(None);
		assert!(g.nodes().iter().all(|n| !n.highlighted));
	}

	#[test]
	fn merge_path_materializes_every_ancestor() {
		let mut g = graph();
		let fetched = vec![
			("A-2".to_string(), Some(vec![record("A-2-1", NodeKind::File)])),
			("A".to_string(), Some(folders(&["A-1", "A-2"]))),
		];
		assert!(g.merge_path("A-2-1", fetched));
		for slug in ["A", "A-2"] {
			let n = g.node(slug).unwrap();
			assert!(n.expanded && n.loaded && !n.hidden, "{slug}");
		}
		assert!(!g.node("A-2-1").unwrap().hidden);
		assert_consistent(&g);
	}

	#[test]
	fn merge_path_reopens_collapsed_ancestors() {
		let mut g = graph();
		expand(&mut g, "A", &["A-1", "A-2"]);
		expand(&mut g, "A-2", &["A-2-1"]);
		g.collapse("A").unwrap();

		assert!(g.merge_path("A-2-1", Vec::new()));
		assert!(!g.node("A-2-1").unwrap().hidden);
		assert_consistent(&g);
	}

	#[test]
	fn merge_path_stops_at_failed_ancestor() {
		let mut g = graph();
		let fetched = vec![
			("A".to_string(), None),
			("A-2".to_string(), Some(folders(&["A-2-1"]))),
		];
		assert!(!g.merge_path("A-2-1", fetched));
		assert_eq!(g.node_count(), 5);
		assert!(!g.node("A").unwrap().loaded);
	}

	#[test]
	fn breadcrumbs_run_root_to_leaf_without_root() {
		let mut g = graph();
		expand(&mut g, "A", &["A-2"]);
		g.begin_expand("A-2").unwrap();
		g.finish_expand("A-2", &[record("A-2-1", NodeKind::File)]);
		let crumbs: Vec<&str> = g.breadcrumbs("A-2-1").iter().map(|n| n.id.as_str()).collect();
		assert_eq!(crumbs, ["A", "A-2", "A-2-1"]);
	}
}
