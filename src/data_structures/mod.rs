pub mod bucket_frontier;
pub mod distance_array;
pub mod priority_queue;

pub use bucket_frontier::BucketedFrontier;
pub use distance_array::{DistanceArray, NodeState};
pub use priority_queue::{BinaryHeapWrapper, BoundedHeap};
