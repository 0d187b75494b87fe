/// Id of the synthetic node every branch hangs from.
pub const ROOT_ID: &str = "root";

/// The four top-level branches, named by the first slug segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Branch {
	A,
	B,
	C,
	D,
}

/// Direction a branch grows away from the root, in screen space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	Up,
	Right,
	Down,
	Left,
}

impl Branch {
	pub const ALL: [Branch; 4] = [Branch::A, Branch::B, Branch::C, Branch::D];

	pub fn of(id: &str) -> Option<Branch> {
		match id.split('-').next()? {
			"A" => Some(Branch::A),
			"B" => Some(Branch::B),
			"C" => Some(Branch::C),
			"D" => Some(Branch::D),
			_ => None,
		}
	}

	pub fn slug(self) -> &'static str {
		match self {
			Branch::A => "A",
			Branch::B => "B",
			Branch::C => "C",
			Branch::D => "D",
		}
	}

	pub fn direction(self) -> Direction {
		match self {
			Branch::A => Direction::Up,
			Branch::B => Direction::Right,
			Branch::C => Direction::Down,
			Branch::D => Direction::Left,
		}
	}
}

impl Direction {
	/// Unit vector of growth (y points down).
	pub fn axis(self) -> (f64, f64) {
		match self {
			Direction::Up => (0.0, -1.0),
			Direction::Right => (1.0, 0.0),
			Direction::Down => (0.0, 1.0),
			Direction::Left => (-1.0, 0.0),
		}
	}

	/// Unit vector along which siblings of one rank spread.
	pub fn cross_axis(self) -> (f64, f64) {
		if self.is_vertical() { (1.0, 0.0) } else { (0.0, 1.0) }
	}

	pub fn is_vertical(self) -> bool {
		matches!(self, Direction::Up | Direction::Down)
	}
}

/// Depth of a slug in the store: `A` is level 1, `A-2-1` level 3.
pub fn slug_level(slug: &str) -> u32 {
	slug.split('-').count() as u32
}

/// Ancestors of a slug from the branch down, e.g. `A-2-1` -> `["A", "A-2"]`.
pub fn ancestor_slugs(slug: &str) -> Vec<String> {
	let parts: Vec<&str> = slug.split('-').collect();
	(1..parts.len()).map(|i| parts[..i].join("-")).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn branch_comes_from_first_segment() {
		assert_eq!(Branch::of("B-3-1"), Some(Branch::B));
		assert_eq!(Branch::of("D"), Some(Branch::D));
		assert_eq!(Branch::of(ROOT_ID), None);
		assert_eq!(Branch::B.direction(), Direction::Right);
	}

	#[test]
	fn ancestor_chain_truncates_at_each_dash() {
		assert_eq!(ancestor_slugs("A-2-1"), ["A", "A-2"]);
		assert_eq!(ancestor_slugs("C-10-4-2"), ["C", "C-10", "C-10-4"]);
		assert!(ancestor_slugs("B").is_empty());
		assert_eq!(slug_level("A-2-1"), 3);
	}
}
