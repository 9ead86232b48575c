pub mod directed;
pub mod generators;
pub mod hierarchy;
pub mod traits;

pub use directed::{DirectedGraph, GraphBuilder};
pub use hierarchy::{GraphHierarchy, GreedyGrowthPartitioner, Partitioner};
pub use traits::{Graph, Reversed, Weight};
