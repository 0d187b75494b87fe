mod force;
mod layered;

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::graph::{Branch, Direction, GraphNode, Point, PolicyGraph};

pub use force::ForceLayout;
pub use layered::LayeredLayout;

/// Node id to card center.
pub type Positions = HashMap<String, Point>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

impl Size {
	/// Extent along a branch's growth axis.
	pub fn along(self, direction: Direction) -> f64 {
		if direction.is_vertical() { self.height } else { self.width }
	}

	/// Extent along the axis siblings spread on.
	pub fn across(self, direction: Direction) -> f64 {
		if direction.is_vertical() { self.width } else { self.height }
	}
}

pub const ROOT_SIZE: Size = Size { width: 320.0, height: 400.0 };
pub const BRANCH_SIZE: Size = Size { width: 280.0, height: 360.0 };
pub const NODE_SIZE: Size = Size { width: 240.0, height: 320.0 };

/// Card size of a node: the root is largest, then branch roots.
pub fn node_size(node: &GraphNode) -> Size {
	if node.is_root() {
		ROOT_SIZE
	} else if node.level <= 1 {
		BRANCH_SIZE
	} else {
		NODE_SIZE
	}
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
	#[error("branch {branch:?} has a cycle through {node}")]
	Cycle { branch: Branch, node: String },
}

/// Computes node positions from the current node and edge sets.
pub trait LayoutEngine {
	/// Recomputes positions after the node or edge set changed.
	fn compute(&mut self, graph: &PolicyGraph) -> Result<Positions, LayoutError>;

	/// Advances a continuous simulation by `dt` seconds. `None` while at rest.
	fn tick(&mut self, _dt: f32) -> Option<Positions> {
		None
	}

	fn resize(&mut self, _width: f64, _height: f64) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
	/// Deterministic per-branch layered layout.
	#[default]
	Layered,
	/// Continuously relaxing force simulation.
	Force,
}

impl LayoutKind {
	pub fn engine(self, narrow_viewport_width: f64) -> Box<dyn LayoutEngine> {
		match self {
			LayoutKind::Layered => Box::new(LayeredLayout),
			LayoutKind::Force => Box::new(ForceLayout::new(narrow_viewport_width)),
		}
	}
}
