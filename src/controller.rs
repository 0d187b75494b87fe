//! Interaction controller.
//!
//! Gestures are split in two halves around any fetch: a synchronous step
//! that mutates the graph and says what to load, and a merge step applied
//! once the data is back. The async drivers at the bottom only ever borrow
//! the explorer between awaits, so the UI stays responsive and every merge
//! lands as a single update.

use std::cell::RefCell;

use futures::future::join_all;
use log::{debug, error, warn};

use crate::config::ExplorerConfig;
use crate::graph::{ExpandStart, GraphError, PolicyGraph, ROOT_ID, ancestor_slugs, slug_level};
use crate::layout::LayoutEngine;
use crate::policy::{FetchError, NodeKind, PolicyFetcher, PolicyNode, Transport};

/// A leaf opened for the detail view, with its root-to-leaf lineage
/// (root excluded, the node itself last).
#[derive(Clone, Debug, PartialEq)]
pub struct DetailSelection {
	pub node: PolicyNode,
	pub breadcrumbs: Vec<PolicyNode>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
	pub slug: String,
	pub level: u32,
}

/// What a click ended up doing.
#[derive(Clone, Debug, PartialEq)]
pub enum Activation {
	Focused,
	Expanded,
	Collapsed,
	Detail(DetailSelection),
	/// Children could not be fetched; the node can be clicked again.
	Failed,
	Ignored,
}

pub enum Click {
	Done(Activation),
	Fetch(FetchRequest),
}

pub struct PolicyExplorer {
	graph: PolicyGraph,
	layout: Box<dyn LayoutEngine>,
	laid_out: Option<(usize, usize)>,
	/// Bumped on every change a view may need to redraw for.
	revision: u64,
}

impl PolicyExplorer {
	pub fn new(config: &ExplorerConfig) -> Self {
		let mut explorer = Self {
			graph: PolicyGraph::new(&config.root_title, &config.branches),
			layout: config.layout.engine(config.narrow_viewport_width),
			laid_out: None,
			revision: 0,
		};
		explorer.relayout();
		explorer
	}

	pub fn graph(&self) -> &PolicyGraph {
		&self.graph
	}

	pub fn revision(&self) -> u64 {
		self.revision
	}

	fn touch(&mut self) {
		self.revision = self.revision.wrapping_add(1);
	}

	/// Lays the graph out again if its shape changed since the last run.
	fn relayout(&mut self) {
		let shape = (self.graph.node_count(), self.graph.edge_count());
		if self.laid_out == Some(shape) {
			return;
		}
		match self.layout.compute(&self.graph) {
			Ok(positions) => {
				self.graph.apply_positions(&positions);
				self.laid_out = Some(shape);
			}
			Err(err) => error!("layout failed, keeping previous positions: {err}"),
		}
	}

	fn after_change(&mut self) {
		self.relayout();
		self.graph.refresh_focus();
	}

	fn detail_for(&self, id: &str) -> Option<DetailSelection> {
		let node = self.graph.node(id)?;
		Some(DetailSelection {
			node: node.to_policy_node(),
			breadcrumbs: self
				.graph
				.breadcrumbs(id)
				.into_iter()
				.map(|n| n.to_policy_node())
				.collect(),
		})
	}

	/// Synchronous half of a click. Every click also focuses the node.
	pub fn click(&mut self, id: &str) -> Click {
		let Some(node) = self.graph.node(id) else {
			warn!("click on unknown node {id}");
			return Click::Done(Activation::Ignored);
		};
		let (kind, expanded, loading) = (node.kind, node.expanded, node.loading);
		self.graph.select(Some(id));
		self.touch();

		if id == ROOT_ID {
			return Click::Done(Activation::Focused);
		}
		if kind == NodeKind::File {
			return Click::Done(match self.detail_for(id) {
				Some(detail) => Activation::Detail(detail),
				None => Activation::Ignored,
			});
		}
		if loading {
			return Click::Done(Activation::Ignored);
		}
		if expanded {
			return Click::Done(match self.graph.collapse(id) {
				Ok(()) => {
					self.after_change();
					Activation::Collapsed
				}
				Err(err) => {
					warn!("{err}");
					Activation::Ignored
				}
			});
		}
		match self.graph.begin_expand(id) {
			Ok(ExpandStart::Revealed) => {
				self.after_change();
				Click::Done(Activation::Expanded)
			}
			Ok(ExpandStart::Fetch { level, slug }) => Click::Fetch(FetchRequest { slug, level }),
			Err(err) => {
				warn!("{err}");
				Click::Done(Activation::Ignored)
			}
		}
	}

	/// Merge half of a click that needed a fetch. If another route (a search)
	/// settled the node meanwhile, the children are merged without touching
	/// its expansion state.
	pub fn finish_fetch(&mut self, request: &FetchRequest, result: Result<Vec<PolicyNode>, FetchError>) -> Activation {
		self.touch();
		let pending = self.graph.node(&request.slug).is_some_and(|n| n.loading);
		if !pending {
			match result {
				Ok(children) => {
					self.graph.merge_late(&request.slug, &children);
					self.after_change();
				}
				Err(err) => warn!("late fetch for {} failed: {err}", request.slug),
			}
			return Activation::Ignored;
		}
		match result {
			Ok(children) => {
				self.graph.finish_expand(&request.slug, &children);
				self.after_change();
				Activation::Expanded
			}
			Err(err) => {
				warn!("could not load children of {}: {err}", request.slug);
				self.graph.abort_expand(&request.slug);
				Activation::Failed
			}
		}
	}

	/// Lists the ancestors of `target` whose children still need fetching and
	/// marks the materialized ones as loading.
	pub fn plan_search(&mut self, target: &str) -> Vec<FetchRequest> {
		self.touch();
		let mut requests = Vec::new();
		for slug in ancestor_slugs(target) {
			if self.graph.node(&slug).is_some_and(|n| n.loaded) {
				continue;
			}
			if self.graph.node(&slug).is_some() {
				match self.graph.begin_expand(&slug) {
					Ok(_) | Err(GraphError::Busy(_)) => {}
					Err(err) => warn!("{err}"),
				}
			}
			requests.push(FetchRequest {
				level: slug_level(&slug),
				slug,
			});
		}
		debug!("search for {target} needs {} fetches", requests.len());
		requests
	}

	/// Merges every ancestor fetched for `target` at once, then focuses it.
	pub fn finish_search(
		&mut self,
		target: &str,
		results: Vec<(FetchRequest, Result<Vec<PolicyNode>, FetchError>)>,
	) -> Option<DetailSelection> {
		self.touch();
		let fetched = results
			.into_iter()
			.map(|(request, result)| {
				let children = result
					.map_err(|err| warn!("could not load children of {}: {err}", request.slug))
					.ok();
				(request.slug, children)
			})
			.collect();
		let found = self.graph.merge_path(target, fetched);
		self.relayout();
		if !found {
			warn!("search target {target} could not be materialized");
			self.graph.refresh_focus();
			return None;
		}
		self.graph.select(Some(target));
		self.detail_for(target)
	}

	pub fn hover(&mut self, id: Option<&str>) {
		self.graph.hover(id);
		self.touch();
	}

	/// Click on empty canvas.
	pub fn clear_selection(&mut self) {
		self.graph.select(None);
		self.touch();
	}

	/// Advances a running layout; returns whether positions moved.
	pub fn tick(&mut self, dt: f32) -> bool {
		match self.layout.tick(dt) {
			Some(positions) => {
				self.graph.apply_positions(&positions);
				self.touch();
				true
			}
			None => false,
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.layout.resize(width, height);
	}

	fn set_child_previews(&mut self, id: &str, children: &[PolicyNode]) {
		self.graph.set_child_previews(id, children);
		self.touch();
	}
}

/// Handles a node click end to end, fetching children if needed.
pub async fn activate<T: Transport>(
	explorer: &RefCell<PolicyExplorer>,
	fetcher: &PolicyFetcher<T>,
	id: &str,
) -> Activation {
	let click = explorer.borrow_mut().click(id);
	let request = match click {
		Click::Done(outcome) => return outcome,
		Click::Fetch(request) => request,
	};
	let result = fetcher.fetch_children(request.level, &request.slug).await;
	explorer.borrow_mut().finish_fetch(&request, result)
}

/// Materializes the path to a search hit: gathers the missing ancestors,
/// fetches them in parallel and merges everything in one step.
pub async fn resolve_search_target<T: Transport>(
	explorer: &RefCell<PolicyExplorer>,
	fetcher: &PolicyFetcher<T>,
	target: &str,
) -> Option<DetailSelection> {
	let requests = explorer.borrow_mut().plan_search(target);
	let results = join_all(requests.into_iter().map(|request| async move {
		let result = fetcher.fetch_children(request.level, &request.slug).await;
		(request, result)
	}))
	.await;
	explorer.borrow_mut().finish_search(target, results)
}

/// Gives image-less branches a mosaic of their children's images. The
/// fetched records stay cached, so expanding later costs no request.
pub async fn preload_branch_previews<T: Transport>(explorer: &RefCell<PolicyExplorer>, fetcher: &PolicyFetcher<T>) {
	let branches: Vec<(String, u32)> = {
		let explorer = explorer.borrow();
		let graph = explorer.graph();
		graph
			.children_of(ROOT_ID)
			.iter()
			.filter_map(|id| graph.node(id))
			.filter(|n| n.image.is_none())
			.map(|n| (n.id.clone(), n.level))
			.collect()
	};
	let results = join_all(branches.iter().map(|(id, level)| fetcher.fetch_children(*level, id))).await;

	let mut explorer = explorer.borrow_mut();
	for ((id, _), result) in branches.iter().zip(results) {
		match result {
			Ok(children) => explorer.set_child_previews(id, &children),
			Err(err) => warn!("no preview for branch {id}: {err}"),
		}
	}
}
