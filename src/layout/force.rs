use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;

use super::{LayoutEngine, LayoutError, Positions};
use crate::graph::{Point, PolicyGraph, ROOT_ID};

const NODE_MASS: f32 = 10.0;
/// Heavier root, stronger repulsion around it.
const ROOT_MASS: f32 = 20.0;
const ROOT_RADIUS: f64 = 250.0;
const NODE_RADIUS: f64 = 200.0;
const COLLIDE_ITERATIONS: usize = 2;
const SEED_DISTANCE: f64 = 80.0;

const ALPHA_START: f64 = 1.0;
const ALPHA_REHEAT: f64 = 0.3;
const ALPHA_MIN: f64 = 0.001;
const ALPHA_DECAY: f64 = 0.02;
/// Mean squared movement per tick below which the simulation idles.
const REST_ENERGY: f64 = 0.01;

/// Link and centering parameters for one viewport class.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Forces {
	link_distance: f64,
	link_strength: f64,
	/// Uniform pull of the centroid to the origin (wide viewports).
	center: f64,
	/// Per-node pull toward x = 0 and y = 0 (narrow viewports).
	pull_x: f64,
	pull_y: f64,
}

const WIDE: Forces = Forces {
	link_distance: 250.0,
	link_strength: 0.5,
	center: 0.05,
	pull_x: 0.0,
	pull_y: 0.0,
};

const NARROW: Forces = Forces {
	link_distance: 150.0,
	link_strength: 0.6,
	center: 0.0,
	pull_x: 0.15,
	pull_y: 0.05,
};

#[derive(Clone, Debug, Default)]
pub struct ForceNode {
	radius: f64,
}

struct Body {
	idx: DefaultNodeIdx,
	radius: f64,
	x: f64,
	y: f64,
}

/// Force-directed layout: charge repulsion from the simulation, then link
/// springs, collision and centering applied on top each tick. Runs until
/// movement dies down and re-heats whenever the graph changes shape.
pub struct ForceLayout {
	sim: ForceGraph<ForceNode, ()>,
	ids: HashMap<String, DefaultNodeIdx>,
	links: Vec<(DefaultNodeIdx, DefaultNodeIdx)>,
	forces: Forces,
	narrow_viewport_width: f64,
	alpha: f64,
	signature: Option<(usize, usize)>,
	last: Positions,
}

impl ForceLayout {
	pub fn new(narrow_viewport_width: f64) -> Self {
		Self {
			sim: ForceGraph::new(simulation_parameters()),
			ids: HashMap::new(),
			links: Vec::new(),
			forces: WIDE,
			narrow_viewport_width,
			alpha: 0.0,
			signature: None,
			last: Positions::new(),
		}
	}

	pub fn is_running(&self) -> bool {
		self.alpha >= ALPHA_MIN
	}

	fn rebuild(&mut self, graph: &PolicyGraph) {
		let mut sim = ForceGraph::new(simulation_parameters());
		let mut ids = HashMap::new();
		let mut seeded: Positions = Positions::new();

		for (i, node) in graph.nodes().iter().enumerate() {
			let p = self
				.last
				.get(&node.id)
				.copied()
				.unwrap_or_else(|| seed_position(i, graph.parent_of(&node.id).and_then(|p| seeded.get(p))));
			seeded.insert(node.id.clone(), p);

			let is_root = node.id == ROOT_ID;
			let idx = sim.add_node(NodeData {
				x: p.x as f32,
				y: p.y as f32,
				mass: if is_root { ROOT_MASS } else { NODE_MASS },
				is_anchor: false,
				user_data: ForceNode {
					radius: if is_root { ROOT_RADIUS } else { NODE_RADIUS },
				},
			});
			ids.insert(node.id.clone(), idx);
		}

		let mut links = Vec::new();
		for edge in graph.edges() {
			if let (Some(&s), Some(&t)) = (ids.get(&edge.source), ids.get(&edge.target)) {
				sim.add_edge(s, t, EdgeData::default());
				links.push((s, t));
			}
		}

		self.sim = sim;
		self.ids = ids;
		self.links = links;
		self.last = seeded;
	}

	fn bodies(&self) -> Vec<Body> {
		let mut bodies = Vec::with_capacity(self.ids.len());
		self.sim.visit_nodes(|node| {
			bodies.push(Body {
				idx: node.index(),
				radius: node.data.user_data.radius,
				x: node.x() as f64,
				y: node.y() as f64,
			});
		});
		bodies
	}

	fn apply_links(&self, bodies: &mut [Body]) {
		let slot: HashMap<DefaultNodeIdx, usize> =
			bodies.iter().enumerate().map(|(i, b)| (b.idx, i)).collect();
		let strength = self.forces.link_strength * self.alpha;
		for (s, t) in &self.links {
			let (Some(&i), Some(&j)) = (slot.get(s), slot.get(t)) else {
				continue;
			};
			let (dx, dy) = (bodies[j].x - bodies[i].x, bodies[j].y - bodies[i].y);
			let dist = (dx * dx + dy * dy).sqrt().max(1e-6);
			let k = (dist - self.forces.link_distance) / dist * strength * 0.5;
			bodies[i].x += dx * k;
			bodies[i].y += dy * k;
			bodies[j].x -= dx * k;
			bodies[j].y -= dy * k;
		}
	}

	fn apply_collisions(bodies: &mut [Body]) {
		for _ in 0..COLLIDE_ITERATIONS {
			for i in 0..bodies.len() {
				for j in (i + 1)..bodies.len() {
					let min = bodies[i].radius + bodies[j].radius;
					let (mut dx, mut dy) = (bodies[j].x - bodies[i].x, bodies[j].y - bodies[i].y);
					let mut dist = (dx * dx + dy * dy).sqrt();
					if dist >= min {
						continue;
					}
					if dist < 1e-6 {
						// Coincident: separate along a fixed per-pair angle.
						let angle = (i * 31 + j * 17) as f64;
						(dx, dy, dist) = (angle.cos(), angle.sin(), 1.0);
					}
					let push = (min - dist) / dist * 0.5;
					bodies[i].x -= dx * push;
					bodies[i].y -= dy * push;
					bodies[j].x += dx * push;
					bodies[j].y += dy * push;
				}
			}
		}
	}

	fn apply_centering(&self, bodies: &mut [Body]) {
		if bodies.is_empty() {
			return;
		}
		let n = bodies.len() as f64;
		let (mx, my) = bodies
			.iter()
			.fold((0.0, 0.0), |(x, y), b| (x + b.x / n, y + b.y / n));
		let f = self.forces;
		for b in bodies.iter_mut() {
			b.x -= mx * f.center + b.x * f.pull_x * self.alpha;
			b.y -= my * f.center + b.y * f.pull_y * self.alpha;
		}
	}

	fn positions(bodies: &[Body], names: &HashMap<DefaultNodeIdx, String>) -> Positions {
		bodies
			.iter()
			.filter_map(|b| names.get(&b.idx).map(|id| (id.clone(), Point::new(b.x, b.y))))
			.collect()
	}
}

impl LayoutEngine for ForceLayout {
	fn compute(&mut self, graph: &PolicyGraph) -> Result<Positions, LayoutError> {
		let signature = (graph.node_count(), graph.edge_count());
		if self.signature != Some(signature) {
			self.alpha = if self.signature.is_none() {
				ALPHA_START
			} else {
				self.alpha.max(ALPHA_REHEAT)
			};
			self.rebuild(graph);
			self.signature = Some(signature);
			debug!("force layout re-heated for {} nodes", signature.0);
		}
		Ok(self.last.clone())
	}

	fn tick(&mut self, dt: f32) -> Option<Positions> {
		if !self.is_running() {
			return None;
		}
		let before = self.bodies();
		self.sim.update(dt * self.alpha as f32);

		let mut bodies = self.bodies();
		for (b, prev) in bodies.iter_mut().zip(&before) {
			if !(b.x.is_finite() && b.y.is_finite()) {
				(b.x, b.y) = (prev.x, prev.y);
			}
		}
		self.apply_links(&mut bodies);
		Self::apply_collisions(&mut bodies);
		self.apply_centering(&mut bodies);

		let moved: HashMap<DefaultNodeIdx, (f64, f64)> =
			bodies.iter().map(|b| (b.idx, (b.x, b.y))).collect();
		self.sim.visit_nodes_mut(|node| {
			if let Some(&(x, y)) = moved.get(&node.index()) {
				node.data.x = x as f32;
				node.data.y = y as f32;
			}
		});

		let energy = bodies
			.iter()
			.zip(&before)
			.map(|(b, p)| (b.x - p.x).powi(2) + (b.y - p.y).powi(2))
			.sum::<f64>()
			/ bodies.len().max(1) as f64;
		self.alpha += (0.0 - self.alpha) * ALPHA_DECAY;
		if energy < REST_ENERGY {
			self.alpha = 0.0;
		}

		let names: HashMap<DefaultNodeIdx, String> =
			self.ids.iter().map(|(id, &idx)| (idx, id.clone())).collect();
		self.last = Self::positions(&bodies, &names);
		Some(self.last.clone())
	}

	fn resize(&mut self, width: f64, _height: f64) {
		let forces = if width < self.narrow_viewport_width { NARROW } else { WIDE };
		if forces != self.forces {
			self.forces = forces;
			self.alpha = self.alpha.max(ALPHA_REHEAT);
		}
	}
}

fn simulation_parameters() -> SimulationParameters {
	SimulationParameters {
		force_charge: 12000.0,
		force_spring: 0.01,
		force_max: 100.0,
		node_speed: 600.0,
		damping_factor: 0.9,
	}
}

/// New nodes start near their parent (or spiral out from the origin) so
/// existing nodes do not jump.
fn seed_position(i: usize, parent: Option<&Point>) -> Point {
	let angle = i as f64 * PI * (3.0 - 5f64.sqrt());
	match parent {
		Some(p) => Point::new(p.x + SEED_DISTANCE * angle.cos(), p.y + SEED_DISTANCE * angle.sin()),
		None => {
			let r = 10.0 * (i as f64 + 0.5).sqrt();
			Point::new(r * angle.cos(), r * angle.sin())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ExplorerConfig;
	use crate::graph::ExpandStart;
	use crate::policy::{NodeKind, PolicyNode};

	fn graph() -> PolicyGraph {
		let config = ExplorerConfig::default();
		PolicyGraph::new(&config.root_title, &config.branches)
	}

	fn grow(g: &mut PolicyGraph, id: &str, children: &[&str]) {
		if let Ok(ExpandStart::Fetch { .. }) = g.begin_expand(id) {
			let records: Vec<PolicyNode> = children
				.iter()
				.map(|s| PolicyNode {
					slug: s.to_string(),
					title: s.to_string(),
					kind: NodeKind::File,
					..PolicyNode::default()
				})
				.collect();
			g.finish_expand(id, &records);
		}
	}

	fn settle(layout: &mut ForceLayout) -> usize {
		let mut ticks = 0;
		while layout.tick(0.016).is_some() {
			ticks += 1;
			assert!(ticks < 2000, "simulation never came to rest");
		}
		ticks
	}

	fn distance(a: Point, b: Point) -> f64 {
		((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
	}

	#[test]
	fn relaxes_to_rest_with_finite_positions() {
		let g = graph();
		let mut layout = ForceLayout::new(768.0);
		let initial = layout.compute(&g).unwrap();
		assert_eq!(initial.len(), 5);
		assert!(layout.is_running());

		settle(&mut layout);
		assert!(!layout.is_running());
		assert!(layout.tick(0.016).is_none());
		let positions = layout.compute(&g).unwrap();
		assert!(positions.values().all(|p| p.x.is_finite() && p.y.is_finite()));
		for a in ["A", "B", "C", "D"] {
			for b in ["A", "B", "C", "D"] {
				if a < b {
					assert!(distance(positions[a], positions[b]) > 1.0, "{a} and {b} coincide");
				}
			}
		}
	}

	#[test]
	fn structural_change_reheats_and_keeps_existing_positions() {
		let mut g = graph();
		let mut layout = ForceLayout::new(768.0);
		layout.compute(&g).unwrap();
		settle(&mut layout);
		let rested = layout.compute(&g).unwrap();

		grow(&mut g, "A", &["A-1", "A-2"]);
		let reheated = layout.compute(&g).unwrap();
		assert!(layout.is_running());
		assert_eq!(reheated["B"], rested["B"]);
		assert!(distance(reheated["A-1"], rested["A"]) <= SEED_DISTANCE + 1e-9);
		assert_eq!(reheated.len(), 7);
	}

	#[test]
	fn unchanged_graph_does_not_restart() {
		let g = graph();
		let mut layout = ForceLayout::new(768.0);
		layout.compute(&g).unwrap();
		settle(&mut layout);
		layout.compute(&g).unwrap();
		assert!(!layout.is_running());
	}

	#[test]
	fn narrow_viewport_switches_forces_and_reheats() {
		let g = graph();
		let mut layout = ForceLayout::new(768.0);
		layout.compute(&g).unwrap();
		settle(&mut layout);

		layout.resize(1280.0, 800.0);
		assert!(!layout.is_running());
		layout.resize(420.0, 800.0);
		assert!(layout.is_running());
		assert_eq!(layout.forces, NARROW);
	}

	#[test]
	fn collisions_push_overlapping_bodies_apart() {
		let mut layout = ForceLayout::new(768.0);
		layout.compute(&graph()).unwrap();
		let mut bodies: Vec<Body> = layout.bodies().into_iter().skip(1).take(2).collect();
		(bodies[0].x, bodies[0].y) = (0.0, 0.0);
		(bodies[1].x, bodies[1].y) = (10.0, 0.0);
		ForceLayout::apply_collisions(&mut bodies);
		assert!((bodies[1].x - bodies[0].x) >= 2.0 * NODE_RADIUS - 1.0);
	}
}
