pub mod detail;
pub mod policy_graph;
pub mod search;
