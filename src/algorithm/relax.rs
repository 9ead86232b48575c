//! Batch edge relaxation for one extracted bucket.
//!
//! A pass runs in three phases:
//! 1. every node of the batch proposes `(target, candidate, source)` requests, reading a
//!    stable snapshot of the distance array (in parallel on a rayon pool for large batches);
//! 2. requests are grouped by target and one winner per target is chosen through the
//!    [`MinimumFinder`], so equal candidates resolve to the lowest predecessor id;
//! 3. winners are applied through [`DistanceArray::relax`] and moved in the frontier.
//!
//! No phase depends on scheduling, so a pass gives the same result for any worker count.

use log::trace;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::algorithm::landmarks::LandmarkOracle;
use crate::algorithm::min_finder::MinimumFinder;
use crate::algorithm::traits::RunStats;
use crate::data_structures::{BucketedFrontier, DistanceArray};
use crate::graph::{Graph, Weight};

/// Which edges a pass relaxes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeClass {
    /// `weight <= Δ`
    Light,
    /// `weight > Δ`
    Heavy,
}

impl EdgeClass {
    #[inline]
    fn admits<W: Weight>(self, weight: W, delta: W) -> bool {
        match self {
            EdgeClass::Light => weight <= delta,
            EdgeClass::Heavy => weight > delta,
        }
    }
}

/// A proposed distance for `target`, reached through `source`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Request<W> {
    target: usize,
    candidate: W,
    source: usize,
}

/// Requests and counters produced by expanding a single node
#[derive(Debug)]
struct Expansion<W> {
    requests: Vec<Request<W>>,
    examined: u64,
    landmark_pruned: u64,
    hierarchy_pruned: u64,
}

/// Relaxes the edges of a batch of nodes.
///
/// Pruning inputs are optional and only ever skip requests that could not improve
/// their target.
#[derive(Debug)]
pub struct BatchRelaxer<'a, W>
where
    W: Weight,
{
    delta: W,
    finder: &'a dyn MinimumFinder<W>,
    pool: Option<&'a ThreadPool>,
    parallel_threshold: usize,
    landmarks: Option<&'a LandmarkOracle<W>>,
    bounds: Option<&'a [W]>,
}

impl<'a, W> BatchRelaxer<'a, W>
where
    W: Weight,
{
    pub fn new(delta: W, finder: &'a dyn MinimumFinder<W>) -> Self {
        BatchRelaxer {
            delta,
            finder,
            pool: None,
            parallel_threshold: usize::MAX,
            landmarks: None,
            bounds: None,
        }
    }

    /// Expand batches of at least `threshold` nodes on `pool`
    pub fn with_pool(mut self, pool: Option<&'a ThreadPool>, threshold: usize) -> Self {
        self.pool = pool;
        self.parallel_threshold = threshold.max(1);
        self
    }

    /// Skip relaxations the oracle proves useless
    pub fn with_landmarks(mut self, oracle: Option<&'a LandmarkOracle<W>>) -> Self {
        self.landmarks = oracle.filter(|oracle| !oracle.is_empty());
        self
    }

    /// Per-node lower bounds on the distance from the source
    pub fn with_bounds(mut self, bounds: Option<&'a [W]>) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn delta(&self) -> W {
        self.delta
    }

    /// Runs one pass over `nodes` and returns every `(node, bucket)` whose distance
    /// improved, in ascending node order.
    pub fn relax<G>(
        &self,
        graph: &G,
        nodes: &[usize],
        class: EdgeClass,
        distances: &mut DistanceArray<W>,
        frontier: &mut BucketedFrontier<W>,
        stats: &mut RunStats,
    ) -> Vec<(usize, usize)>
    where
        G: Graph<W> + ?Sized,
    {
        let snapshot: &DistanceArray<W> = distances;
        let expansions: Vec<Expansion<W>> = match self.pool {
            Some(pool) if nodes.len() >= self.parallel_threshold => pool.install(|| {
                nodes
                    .par_iter()
                    .map(|&u| self.expand(graph, snapshot, u, class))
                    .collect()
            }),
            _ => nodes
                .iter()
                .map(|&u| self.expand(graph, snapshot, u, class))
                .collect(),
        };

        let mut requests = Vec::new();
        for expansion in expansions {
            stats.relaxations += expansion.examined;
            match class {
                EdgeClass::Light => stats.light_relaxations += expansion.examined,
                EdgeClass::Heavy => stats.heavy_relaxations += expansion.examined,
            }
            stats.landmark_pruned += expansion.landmark_pruned;
            stats.hierarchy_pruned += expansion.hierarchy_pruned;
            requests.extend(expansion.requests);
        }

        let winners = self.resolve(requests);
        trace!(
            "{:?} pass over {} nodes produced {} winning updates",
            class,
            nodes.len(),
            winners.len()
        );

        let mut updated = Vec::with_capacity(winners.len());
        for request in winners {
            if distances.relax(request.target, request.candidate, Some(request.source)) {
                stats.improvements += 1;
                let bucket = frontier.insert_or_move(request.target, request.candidate);
                updated.push((request.target, bucket));
            }
        }
        updated
    }

    fn expand<G>(
        &self,
        graph: &G,
        distances: &DistanceArray<W>,
        u: usize,
        class: EdgeClass,
    ) -> Expansion<W>
    where
        G: Graph<W> + ?Sized,
    {
        let mut expansion = Expansion {
            requests: Vec::new(),
            examined: 0,
            landmark_pruned: 0,
            hierarchy_pruned: 0,
        };
        let du = distances.get(u);
        if !du.is_finite() {
            return expansion;
        }

        for (v, weight) in graph.neighbors(u) {
            if !class.admits(weight, self.delta) {
                continue;
            }
            expansion.examined += 1;
            if distances.is_finalized(v) {
                continue;
            }
            let current = distances.get(v);
            let candidate = du + weight;

            if let Some(oracle) = self.landmarks {
                let bound = oracle.lower_bound(u, v);
                if bound > W::zero() && current <= candidate - bound {
                    expansion.landmark_pruned += 1;
                    continue;
                }
            }
            if let Some(bounds) = self.bounds {
                if current <= bounds[v] {
                    expansion.hierarchy_pruned += 1;
                    continue;
                }
            }
            if candidate < current {
                expansion.requests.push(Request {
                    target: v,
                    candidate,
                    source: u,
                });
            }
        }
        expansion
    }

    /// One winner per target, ascending by target id
    fn resolve(&self, mut requests: Vec<Request<W>>) -> Vec<Request<W>> {
        requests.sort_unstable_by_key(|request| request.target);

        let mut winners = Vec::new();
        let mut proposals: Vec<(W, usize)> = Vec::new();
        let mut start = 0;
        while start < requests.len() {
            let target = requests[start].target;
            let mut end = start;
            proposals.clear();
            while end < requests.len() && requests[end].target == target {
                proposals.push((requests[end].candidate, requests[end].source));
                end += 1;
            }
            if let Some((candidate, source)) = self.finder.find_min(&proposals) {
                winners.push(Request {
                    target,
                    candidate,
                    source,
                });
            }
            start = end;
        }
        winners
    }
}
