mod branch;
mod model;

pub use branch::{Branch, Direction, ROOT_ID, ancestor_slugs, slug_level};
pub use model::{ExpandStart, GraphEdge, GraphError, GraphNode, Point, PolicyGraph};
