pub mod cancel;
pub mod delta_stepping;
pub mod dijkstra;
pub mod landmarks;
pub mod min_finder;
pub mod relax;
pub mod traits;

pub use cancel::CancellationToken;
pub use delta_stepping::{DeltaStepping, Preprocessed};
pub use dijkstra::Dijkstra;
pub use landmarks::LandmarkOracle;
pub use min_finder::{BoundedHeapFinder, LinearScanFinder, MinimumFinder};
pub use traits::{RunStats, RunStatus, ShortestPathAlgorithm, ShortestPathResult};
