use crate::graph::{GraphNode, Point, PolicyGraph};
use crate::layout::node_size;

use super::render::ImageCache;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
/// Screen pixels kept free around the graph when fitting.
const FIT_PADDING: f64 = 40.0;
/// Fitting never magnifies past this.
const FIT_MAX_ZOOM: f64 = 1.0;
/// Pointer travel, in screen pixels, below which a press counts as a click.
const CLICK_SLOP: f64 = 4.0;

#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<String>,
	pub highlight_t: f64,
	delay_t: f64,
}

/// Everything about the canvas that is not graph data: camera, pointer
/// gestures, hover easing and loaded images.
pub struct ViewState {
	pub transform: ViewTransform,
	pub pan: PanState,
	pub hover: HoverState,
	pub images: ImageCache,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
	/// Fit the camera to the graph on the next frame.
	pub needs_fit: bool,
	/// Something on screen is still moving; keep drawing frames.
	pub animation_running: bool,
	/// Explorer revision last drawn.
	seen_revision: u64,
}

impl ViewState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			pan: PanState::default(),
			hover: HoverState::default(),
			images: ImageCache::default(),
			width,
			height,
			flow_time: 0.0,
			needs_fit: true,
			animation_running: true,
			seen_revision: 0,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost visible card under a screen point.
	pub fn node_at<'a>(&self, graph: &'a PolicyGraph, sx: f64, sy: f64) -> Option<&'a GraphNode> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		draw_order(graph).into_iter().rev().find(|node| {
			let size = node_size(node);
			(node.position.x - gx).abs() <= size.width / 2.0
				&& (node.position.y - gy).abs() <= size.height / 2.0
		})
	}

	/// Zooms by `factor` keeping the graph point under the cursor fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
		self.animation_running = true;
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			moved: false,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if !self.pan.active {
			return;
		}
		let (dx, dy) = (sx - self.pan.start_x, sy - self.pan.start_y);
		if !self.pan.moved && dx.hypot(dy) < CLICK_SLOP {
			return;
		}
		self.pan.moved = true;
		self.transform.x = self.pan.transform_start_x + dx;
		self.transform.y = self.pan.transform_start_y + dy;
		self.animation_running = true;
	}

	/// Ends a press; returns whether it was a click rather than a drag.
	pub fn end_pan(&mut self) -> bool {
		let clicked = self.pan.active && !self.pan.moved;
		self.pan.active = false;
		clicked
	}

	/// Frames every visible card, centred, zooming out as far as needed.
	pub fn fit(&mut self, graph: &PolicyGraph) {
		self.needs_fit = false;
		let Some((min, max)) = visible_bounds(graph) else {
			return;
		};
		let (bw, bh) = ((max.x - min.x).max(1.0), (max.y - min.y).max(1.0));
		let (aw, ah) = (
			(self.width - 2.0 * FIT_PADDING).max(1.0),
			(self.height - 2.0 * FIT_PADDING).max(1.0),
		);
		let k = (aw / bw).min(ah / bh).clamp(MIN_ZOOM, FIT_MAX_ZOOM);
		self.transform.k = k;
		self.center_on(Point::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0));
	}

	pub fn center_on(&mut self, point: Point) {
		self.transform.x = self.width / 2.0 - point.x * self.transform.k;
		self.transform.y = self.height / 2.0 - point.y * self.transform.k;
		self.animation_running = true;
	}

	/// Centres the camera on a node at the current zoom. Returns false if the
	/// node is unknown or hidden.
	pub fn focus_node(&mut self, graph: &PolicyGraph, id: &str) -> bool {
		match graph.node(id).filter(|n| !n.hidden) {
			Some(node) => {
				self.center_on(node.position);
				true
			}
			None => false,
		}
	}

	/// Returns whether the hovered node changed.
	pub fn set_hover(&mut self, node: Option<&str>) -> bool {
		if self.hover.node.as_deref() == node {
			return false;
		}
		if self.hover.node.is_none() {
			self.hover.delay_t = 0.0;
		}
		self.hover.node = node.map(str::to_string);
		self.animation_running = true;
		true
	}

	pub fn tick(&mut self, dt: f32) {
		let dt = dt as f64;
		self.flow_time += dt;

		if self.hover.node.is_some() {
			let (delay, speed) = (0.08, 1.8);
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (1.0 - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t -= self.hover.highlight_t * 1.26 * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.animation_running = true;
	}

	/// Whether this frame has to be drawn. A new explorer revision restarts
	/// the animation.
	pub fn wants_frame(&mut self, revision: u64) -> bool {
		if revision != self.seen_revision {
			self.seen_revision = revision;
			self.animation_running = true;
		}
		self.animation_running || self.needs_fit
	}

	/// Called after drawing; stops the loop once nothing on screen moves.
	pub fn settle(&mut self, graph: &PolicyGraph) {
		self.animation_running = self.hover.node.is_some()
			|| self.hover.highlight_t > 0.0
			|| graph.edges().iter().any(|e| e.emphasized && !e.hidden)
			|| graph.nodes().iter().any(|n| n.loading && !n.hidden)
			|| self.images.pending();
	}
}

/// Visible nodes back to front: dimmed cards first, highlighted ones last.
pub fn draw_order(graph: &PolicyGraph) -> Vec<&GraphNode> {
	let mut nodes: Vec<&GraphNode> = graph.nodes().iter().filter(|n| !n.hidden).collect();
	nodes.sort_by_key(|n| (!n.dimmed, n.highlighted));
	nodes
}

fn visible_bounds(graph: &PolicyGraph) -> Option<(Point, Point)> {
	graph.nodes().iter().filter(|n| !n.hidden).fold(None, |acc, node| {
		let size = node_size(node);
		let (lo, hi) = (
			Point::new(node.position.x - size.width / 2.0, node.position.y - size.height / 2.0),
			Point::new(node.position.x + size.width / 2.0, node.position.y + size.height / 2.0),
		);
		Some(match acc {
			None => (lo, hi),
			Some((min, max)) => (
				Point::new(min.x.min(lo.x), min.y.min(lo.y)),
				Point::new(max.x.max(hi.x), max.y.max(hi.y)),
			),
		})
	})
}
