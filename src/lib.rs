//! Delta SSSP - exact single-source shortest paths without a global priority queue
//!
//! This library computes exact shortest-path distances and predecessor trees on
//! directed graphs with non-negative edge weights. Instead of a comparison-based
//! priority queue it processes nodes in buckets of width Δ (delta-stepping),
//! relaxing each bucket in batches that may run in parallel.
//!
//! Two optional accelerations never change the answer:
//! - a landmark oracle that skips relaxations proven useless by the triangle inequality;
//! - a graph hierarchy whose coarse-level distances seed lower bounds on the base graph.
//!
//! Minimum selection is isolated behind [`MinimumFinder`] so alternative selection
//! strategies can be swapped in without touching the engine.

pub mod algorithm;
pub mod config;
pub mod data_structures;
pub mod graph;

/// Re-export main types for convenient use
pub use algorithm::{
    BoundedHeapFinder, CancellationToken, DeltaStepping, Dijkstra, LandmarkOracle,
    LinearScanFinder, MinimumFinder, Preprocessed, RunStats, RunStatus, ShortestPathAlgorithm,
    ShortestPathResult,
};
pub use config::SsspConfig;
pub use graph::{DirectedGraph, Graph, GraphBuilder, GraphHierarchy, Weight};

/// Reasons a graph is rejected at construction time
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InvalidGraphError {
    #[error("negative edge weight {weight} on edge {from} -> {to}")]
    NegativeWeight { from: usize, to: usize, weight: f64 },

    #[error("non-finite edge weight on edge {from} -> {to}")]
    NonFiniteWeight { from: usize, to: usize },

    #[error("edge {from} -> {to} references a node outside 0..{node_count}")]
    NodeOutOfRange {
        from: usize,
        to: usize,
        node_count: usize,
    },
}

/// Error types for the library
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid graph: {0}")]
    InvalidGraph(#[from] InvalidGraphError),

    #[error("Source vertex {0} not found in graph")]
    SourceNotFound(usize),

    #[error("Partitioner failure: {0}")]
    PartitionerFailure(String),

    #[error("Landmark precomputation exceeded its budget after {selected} of {requested} landmarks")]
    LandmarkBudgetExceeded { selected: usize, requested: usize },

    #[error("Run cancelled after finalizing {finalized} nodes")]
    Cancelled { finalized: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for the library
pub type Result<T> = std::result::Result<T, Error>;
