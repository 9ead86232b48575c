use std::time::Instant;

use crate::algorithm::{RunStats, RunStatus, ShortestPathAlgorithm, ShortestPathResult};
use crate::data_structures::BinaryHeapWrapper;
use crate::graph::{Graph, Weight};
use crate::{Error, Result};

/// Classic Dijkstra's algorithm with a binary heap.
///
/// This is the exact comparison-based reference the bucketed engine is checked against.
/// Among equal-distance paths it keeps the first predecessor found.
#[derive(Debug, Default)]
pub struct Dijkstra;

impl Dijkstra {
    /// Creates a new Dijkstra algorithm instance
    pub fn new() -> Self {
        Dijkstra
    }
}

impl<W, G> ShortestPathAlgorithm<W, G> for Dijkstra
where
    W: Weight,
    G: Graph<W> + ?Sized,
{
    fn name(&self) -> &'static str {
        "Dijkstra"
    }

    fn compute_shortest_paths(&self, graph: &G, source: usize) -> Result<ShortestPathResult<W>> {
        if !graph.has_node(source) {
            return Err(Error::SourceNotFound(source));
        }

        let started = Instant::now();
        let n = graph.node_count();

        // Initialize distances and predecessors
        let mut distances: Vec<Option<W>> = vec![None; n];
        let mut predecessors: Vec<Option<usize>> = vec![None; n];
        let mut finalized = vec![false; n];
        let mut stats = RunStats::default();

        // Distance to source is 0
        distances[source] = Some(W::zero());

        let mut queue = BinaryHeapWrapper::new();
        queue.push(source, W::zero());

        while let Some((u, dist_u)) = queue.pop() {
            if finalized[u] {
                continue;
            }
            finalized[u] = true;
            stats.finalized += 1;

            // Relax all outgoing edges
            for (v, weight) in graph.neighbors(u) {
                stats.relaxations += 1;
                let new_dist = dist_u + weight;

                let should_update = match distances[v] {
                    None => true,
                    Some(current_dist) => new_dist < current_dist,
                };

                if should_update {
                    distances[v] = Some(new_dist);
                    predecessors[v] = Some(u);
                    stats.improvements += 1;
                    queue.push(v, new_dist);
                }
            }
        }
        stats.elapsed = started.elapsed();

        Ok(ShortestPathResult {
            distances,
            predecessors,
            finalized,
            source,
            status: RunStatus::Complete,
            stats,
            update_log: None,
        })
    }
}
