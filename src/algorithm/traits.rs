use std::collections::HashSet;
use std::time::Duration;

use log::warn;

use crate::algorithm::min_finder::MinimumFinder;
use crate::graph::{Graph, Weight};
use crate::{Error, Result};

/// Whether a run processed every bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The frontier emptied; every reachable node is finalized
    Complete,
    /// Aborted between buckets; only finalized nodes carry distances
    Cancelled,
}

/// Counters collected during a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    /// Bucket width used
    pub delta: f64,
    /// Edges examined during relaxation
    pub relaxations: u64,
    /// Edges examined in light passes
    pub light_relaxations: u64,
    /// Edges examined in heavy passes
    pub heavy_relaxations: u64,
    /// Distance improvements applied
    pub improvements: u64,
    /// Relaxations skipped thanks to a landmark lower bound
    pub landmark_pruned: u64,
    /// Relaxations skipped because the target already met its hierarchy bound
    pub hierarchy_pruned: u64,
    /// Non-empty buckets processed
    pub buckets_processed: u64,
    /// Light-edge passes summed over all buckets
    pub light_passes: u64,
    /// Nodes finalized
    pub finalized: usize,
    /// Landmarks available to the pruning step
    pub landmarks_used: usize,
    /// Contracted levels consulted for seeding
    pub hierarchy_levels_used: usize,
    /// Wall-clock time of the main loop
    pub elapsed: Duration,
}

/// Result of a shortest path algorithm execution
#[derive(Debug, Clone)]
pub struct ShortestPathResult<W>
where
    W: Weight,
{
    /// Distances from source to each vertex; `None` for unreachable or unresolved nodes
    pub distances: Vec<Option<W>>,

    /// Predecessor vertices in the shortest path tree
    pub predecessors: Vec<Option<usize>>,

    /// Nodes whose distance is proven optimal
    pub finalized: Vec<bool>,

    /// Source vertex ID
    pub source: usize,

    pub status: RunStatus,

    pub stats: RunStats,

    /// Accepted `(node, distance)` updates in order, when recording was requested
    pub update_log: Option<Vec<(usize, W)>>,
}

impl<W> ShortestPathResult<W>
where
    W: Weight,
{
    pub fn distance(&self, node: usize) -> Option<W> {
        self.distances.get(node).copied().flatten()
    }

    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }

    /// Number of nodes with a known distance
    pub fn reachable(&self) -> usize {
        self.distances.iter().filter(|d| d.is_some()).count()
    }

    /// Ids of every finalized node, ascending
    pub fn finalized_nodes(&self) -> Vec<usize> {
        self.finalized
            .iter()
            .enumerate()
            .filter_map(|(v, &done)| done.then_some(v))
            .collect()
    }

    /// Returns the result if the run completed, otherwise [`Error::Cancelled`]
    pub fn into_complete(self) -> Result<Self> {
        match self.status {
            RunStatus::Complete => Ok(self),
            RunStatus::Cancelled => Err(Error::Cancelled {
                finalized: self.stats.finalized,
            }),
        }
    }

    /// Follows predecessors back from `target`; `None` if it has no distance
    pub fn path_to(&self, target: usize) -> Option<Vec<usize>> {
        if target >= self.predecessors.len() || self.distances[target].is_none() {
            return None;
        }

        let mut path = Vec::new();
        let mut current = target;
        let mut visited = HashSet::new();

        // Build path in reverse order
        while current != self.source {
            if !visited.insert(current) {
                warn!("Cycle detected in path reconstruction at vertex {}", current);
                return None;
            }

            path.push(current);
            match self.predecessors[current] {
                Some(pred) => current = pred,
                // A node other than the source without a predecessor breaks the path
                None => return None,
            }
        }

        path.push(self.source);
        path.reverse();

        Some(path)
    }

    /// The `k` finalized nodes closest to the source, ascending by `(distance, id)`
    pub fn nearest(&self, k: usize, finder: &dyn MinimumFinder<W>) -> Vec<(W, usize)> {
        let candidates: Vec<(W, usize)> = self
            .distances
            .iter()
            .enumerate()
            .filter(|(v, _)| self.finalized[*v])
            .filter_map(|(v, d)| d.map(|d| (d, v)))
            .collect();
        finder.find_k_min(&candidates, k)
    }
}

/// Trait for shortest path algorithms
pub trait ShortestPathAlgorithm<W, G>
where
    W: Weight,
    G: Graph<W> + ?Sized,
{
    /// Compute shortest paths from a source vertex to all other vertices
    fn compute_shortest_paths(&self, graph: &G, source: usize) -> Result<ShortestPathResult<W>>;

    /// Get the name of the algorithm
    fn name(&self) -> &'static str;

    /// Get the shortest path from source to target as a sequence of vertices
    fn get_path(&self, result: &ShortestPathResult<W>, target: usize) -> Option<Vec<usize>> {
        result.path_to(target)
    }
}
