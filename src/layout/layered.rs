//! Per-branch layered layout.
//!
//! Each of the four branches is laid out on its own, away from the root:
//!   1. Rank assignment (longest path from the branch root)
//!   2. Ordering within ranks (DFS seed, barycenter sweeps)
//!   3. Coordinates: rank along the growth axis, subtree spans across it
//!   4. Rigid translation next to the root in the branch's direction

use std::collections::{HashMap, VecDeque};

use log::debug;

use super::{LayoutEngine, LayoutError, Positions, ROOT_SIZE, Size, node_size};
use crate::graph::{Branch, Direction, GraphEdge, GraphNode, Point, PolicyGraph, ROOT_ID};

/// Gap between siblings of one rank.
pub const NODE_SEP: f64 = 50.0;
/// Gap between consecutive ranks.
pub const RANK_SEP: f64 = 100.0;
/// Gap between the root card and each branch root.
pub const BRANCH_GAP: f64 = 120.0;
const SWEEPS: usize = 4;

#[derive(Clone, Copy, Debug, Default)]
pub struct LayeredLayout;

impl LayoutEngine for LayeredLayout {
	fn compute(&mut self, graph: &PolicyGraph) -> Result<Positions, LayoutError> {
		let mut positions = Positions::new();
		positions.insert(ROOT_ID.to_string(), Point::default());

		for branch in Branch::ALL {
			let members: Vec<&GraphNode> = graph
				.nodes()
				.iter()
				.filter(|n| Branch::of(&n.id) == Some(branch))
				.collect();
			if members.is_empty() {
				continue;
			}
			let sub = BranchGraph::new(branch, &members, graph.edges());
			let local = sub.layout()?;
			sub.place(&local, &mut positions);
		}

		let unplaced = graph.node_count() - positions.len();
		if unplaced > 0 {
			debug!("{unplaced} nodes belong to no branch and keep their position");
		}
		Ok(positions)
	}
}

/// One branch as a small indexed DAG.
struct BranchGraph<'a> {
	branch: Branch,
	ids: Vec<&'a str>,
	sizes: Vec<Size>,
	succ: Vec<Vec<usize>>,
	pred: Vec<Vec<usize>>,
}

/// Branch-local coordinates: `along` grows away from the root, `across`
/// spreads siblings.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Local {
	along: f64,
	across: f64,
}

impl<'a> BranchGraph<'a> {
	fn new(branch: Branch, members: &[&'a GraphNode], edges: &[GraphEdge]) -> Self {
		let index: HashMap<&str, usize> = members
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.as_str(), i))
			.collect();
		let mut succ = vec![Vec::new(); members.len()];
		let mut pred = vec![Vec::new(); members.len()];
		for edge in edges {
			if let (Some(&s), Some(&t)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str())) {
				succ[s].push(t);
				pred[t].push(s);
			}
		}
		Self {
			branch,
			ids: members.iter().map(|n| n.id.as_str()).collect(),
			sizes: members.iter().map(|n| node_size(n)).collect(),
			succ,
			pred,
		}
	}

	fn direction(&self) -> Direction {
		self.branch.direction()
	}

	fn layout(&self) -> Result<Vec<Local>, LayoutError> {
		let ranks = assign_ranks(&self.succ, &self.pred).map_err(|stuck| LayoutError::Cycle {
			branch: self.branch,
			node: self.ids[stuck].to_string(),
		})?;
		let mut layers = self.initial_order(&ranks);
		reorder(&mut layers, &self.succ, &self.pred);

		let along = self.rank_offsets(&layers);
		let across = self.spans(&layers);

		let mut local: Vec<Local> = (0..self.ids.len())
			.map(|v| Local {
				along: along[ranks[v]],
				across: across[v],
			})
			.collect();

		// Branch root sits at the local origin.
		let anchor = self
			.ids
			.iter()
			.position(|id| *id == self.branch.slug())
			.or_else(|| layers.first().and_then(|l| l.first().copied()));
		if let Some(anchor) = anchor {
			let origin = local[anchor];
			for p in local.iter_mut() {
				p.along -= origin.along;
				p.across -= origin.across;
			}
		}
		Ok(local)
	}

	/// Depth-first order from the sources, so siblings stay adjacent.
	fn initial_order(&self, ranks: &[usize]) -> Vec<Vec<usize>> {
		let depth = ranks.iter().copied().max().unwrap_or(0);
		let mut layers = vec![Vec::new(); depth + 1];
		let mut seen = vec![false; self.ids.len()];
		for source in (0..self.ids.len()).filter(|&v| self.pred[v].is_empty()) {
			let mut stack = vec![source];
			while let Some(v) = stack.pop() {
				if std::mem::replace(&mut seen[v], true) {
					continue;
				}
				layers[ranks[v]].push(v);
				stack.extend(self.succ[v].iter().rev());
			}
		}
		layers
	}

	fn rank_offsets(&self, layers: &[Vec<usize>]) -> Vec<f64> {
		let dir = self.direction();
		let extents: Vec<f64> = layers
			.iter()
			.map(|layer| {
				layer
					.iter()
					.map(|&v| self.sizes[v].along(dir))
					.fold(0.0, f64::max)
			})
			.collect();
		let mut offsets = vec![0.0; layers.len()];
		for r in 1..layers.len() {
			offsets[r] = offsets[r - 1] + extents[r - 1] / 2.0 + RANK_SEP + extents[r] / 2.0;
		}
		offsets
	}

	/// Across-axis centers. Every subtree owns a band no other subtree
	/// enters, and each parent is centered over its children.
	fn spans(&self, layers: &[Vec<usize>]) -> Vec<f64> {
		let slot: HashMap<usize, usize> = layers
			.iter()
			.flat_map(|l| l.iter().enumerate().map(|(i, &v)| (v, i)))
			.collect();

		// Tree parent = leftmost predecessor, children in layer order.
		let mut kids: Vec<Vec<usize>> = vec![Vec::new(); self.ids.len()];
		let mut roots = Vec::new();
		for layer in layers {
			for &v in layer {
				match self.pred[v].iter().min_by_key(|p| (slot_rank(layers, **p), slot[*p])) {
					Some(&p) => kids[p].push(v),
					None => roots.push(v),
				}
			}
		}

		let mut across = vec![0.0; self.ids.len()];
		let mut cursor = 0.0;
		for (i, &root) in roots.iter().enumerate() {
			if i > 0 {
				cursor += NODE_SEP;
			}
			cursor += self.place_subtree(root, cursor, &kids, &mut across);
		}
		across
	}

	/// Places the subtree under `v` starting at `left`; returns its width.
	fn place_subtree(&self, v: usize, left: f64, kids: &[Vec<usize>], across: &mut [f64]) -> f64 {
		let own = self.sizes[v].across(self.direction());
		let Some((&first, &last)) = kids[v].first().zip(kids[v].last()) else {
			across[v] = left + own / 2.0;
			return own;
		};

		let mut cursor = left;
		for (i, &k) in kids[v].iter().enumerate() {
			if i > 0 {
				cursor += NODE_SEP;
			}
			cursor += self.place_subtree(k, cursor, kids, across);
		}
		let span = cursor - left;
		if own > span {
			let shift = (own - span) / 2.0;
			for d in self.subtree(v, kids).into_iter().skip(1) {
				across[d] += shift;
			}
		}
		across[v] = (across[first] + across[last]) / 2.0;
		span.max(own)
	}

	fn subtree(&self, v: usize, kids: &[Vec<usize>]) -> Vec<usize> {
		let mut out = vec![v];
		let mut i = 0;
		while i < out.len() {
			out.extend(kids[out[i]].iter().copied());
			i += 1;
		}
		out
	}

	/// Maps local coordinates into the branch's direction next to the root.
	fn place(&self, local: &[Local], positions: &mut Positions) {
		let dir = self.direction();
		let (ax, ay) = dir.axis();
		let (cx, cy) = dir.cross_axis();
		let head = self
			.ids
			.iter()
			.position(|id| *id == self.branch.slug())
			.map(|i| self.sizes[i])
			.unwrap_or(super::BRANCH_SIZE);
		let offset = ROOT_SIZE.along(dir) / 2.0 + BRANCH_GAP + head.along(dir) / 2.0;

		for (id, p) in self.ids.iter().zip(local) {
			let along = offset + p.along;
			positions.insert(
				id.to_string(),
				Point::new(ax * along + cx * p.across, ay * along + cy * p.across),
			);
		}
	}
}

fn slot_rank(layers: &[Vec<usize>], v: usize) -> usize {
	layers.iter().position(|l| l.contains(&v)).unwrap_or(usize::MAX)
}

/// Longest-path ranks via Kahn's algorithm. On a cycle, returns a node that
/// could not be ranked.
fn assign_ranks(succ: &[Vec<usize>], pred: &[Vec<usize>]) -> Result<Vec<usize>, usize> {
	let mut indegree: Vec<usize> = pred.iter().map(Vec::len).collect();
	let mut rank = vec![0; succ.len()];
	let mut queue: VecDeque<usize> = (0..succ.len()).filter(|&v| indegree[v] == 0).collect();
	let mut ranked = 0;
	while let Some(v) = queue.pop_front() {
		ranked += 1;
		for &w in &succ[v] {
			rank[w] = rank[w].max(rank[v] + 1);
			indegree[w] -= 1;
			if indegree[w] == 0 {
				queue.push_back(w);
			}
		}
	}
	if ranked < succ.len() {
		return Err((0..succ.len()).find(|&v| indegree[v] > 0).unwrap_or(0));
	}
	Ok(rank)
}

/// Barycenter sweeps, keeping the ordering with the fewest crossings.
fn reorder(layers: &mut [Vec<usize>], succ: &[Vec<usize>], pred: &[Vec<usize>]) {
	let mut best = layers.to_vec();
	let mut best_crossings = count_crossings(layers, succ);
	if best_crossings == 0 {
		return;
	}
	for sweep in 0..SWEEPS {
		if sweep % 2 == 0 {
			for r in 1..layers.len() {
				sort_by_barycenter(layers, r, r - 1, pred);
			}
		} else {
			for r in (0..layers.len().saturating_sub(1)).rev() {
				sort_by_barycenter(layers, r, r + 1, succ);
			}
		}
		let crossings = count_crossings(layers, succ);
		if crossings < best_crossings {
			best = layers.to_vec();
			best_crossings = crossings;
		}
	}
	layers.clone_from_slice(&best);
}

fn sort_by_barycenter(layers: &mut [Vec<usize>], r: usize, fixed: usize, neighbours: &[Vec<usize>]) {
	let pos: HashMap<usize, usize> = layers[fixed].iter().enumerate().map(|(i, &v)| (v, i)).collect();
	let mut keyed: Vec<(f64, usize, usize)> = layers[r]
		.iter()
		.enumerate()
		.map(|(i, &v)| {
			let adjacent: Vec<f64> = neighbours[v]
				.iter()
				.filter_map(|w| pos.get(w))
				.map(|&p| p as f64)
				.collect();
			let center = if adjacent.is_empty() {
				i as f64
			} else {
				adjacent.iter().sum::<f64>() / adjacent.len() as f64
			};
			(center, i, v)
		})
		.collect();
	keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
	layers[r] = keyed.into_iter().map(|(_, _, v)| v).collect();
}

fn count_crossings(layers: &[Vec<usize>], succ: &[Vec<usize>]) -> usize {
	let mut total = 0;
	for pair in layers.windows(2) {
		let below: HashMap<usize, usize> = pair[1].iter().enumerate().map(|(i, &v)| (v, i)).collect();
		let mut segments = Vec::new();
		for (i, &v) in pair[0].iter().enumerate() {
			for w in &succ[v] {
				if let Some(&j) = below.get(w) {
					segments.push((i, j));
				}
			}
		}
		for (a, &(i1, j1)) in segments.iter().enumerate() {
			for &(i2, j2) in &segments[a + 1..] {
				if (i1 < i2 && j1 > j2) || (i1 > i2 && j1 < j2) {
					total += 1;
				}
			}
		}
	}
	total
}
