//! Decision trees: the nested model, the frontier scan, and the
//! completion-service backed extractor/merger.

pub mod builder;
pub mod frontier;
pub mod model;

pub use builder::TreeBuilder;
pub use frontier::{FrontierPath, find_frontier_paths};
pub use model::{DecisionTree, Node, TreeParseError};
