use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use num_traits::{cast, ToPrimitive};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::algorithm::cancel::CancellationToken;
use crate::algorithm::landmarks::LandmarkOracle;
use crate::algorithm::min_finder::{LinearScanFinder, MinimumFinder};
use crate::algorithm::relax::{BatchRelaxer, EdgeClass};
use crate::algorithm::{RunStats, RunStatus, ShortestPathAlgorithm, ShortestPathResult};
use crate::config::SsspConfig;
use crate::data_structures::{BucketedFrontier, DistanceArray, NodeState};
use crate::graph::directed::average_edge_weight;
use crate::graph::hierarchy::{GraphHierarchy, GreedyGrowthPartitioner, Partitioner};
use crate::graph::{Graph, Weight};
use crate::{Error, Result};

/// Per-graph precomputation shared by every query on that graph
#[derive(Debug, Clone)]
pub struct Preprocessed<W>
where
    W: Weight,
{
    node_count: usize,
    delta: W,
    landmarks: Option<LandmarkOracle<W>>,
    hierarchy: Option<GraphHierarchy<W>>,
}

impl<W> Preprocessed<W>
where
    W: Weight,
{
    /// Bucket width resolved for this graph
    pub fn delta(&self) -> W {
        self.delta
    }

    pub fn landmarks(&self) -> Option<&LandmarkOracle<W>> {
        self.landmarks.as_ref()
    }

    pub fn hierarchy(&self) -> Option<&GraphHierarchy<W>> {
        self.hierarchy.as_ref()
    }
}

/// Exact SSSP by bucketed delta-stepping.
///
/// Nodes are processed bucket by bucket in increasing order of `⌊distance / Δ⌋`. Inside a
/// bucket, light edges are relaxed repeatedly until no node re-enters the bucket; only
/// then are the bucket's nodes finalized and their heavy edges relaxed once.
///
/// Landmark pruning and hierarchy seeding are optional and never change the distances.
#[derive(Debug, Clone)]
pub struct DeltaStepping<F = LinearScanFinder> {
    config: SsspConfig,
    finder: F,
}

impl DeltaStepping {
    /// Create a new engine with the default configuration
    pub fn new() -> Self {
        Self::with_config(SsspConfig::default())
    }

    pub fn with_config(config: SsspConfig) -> Self {
        DeltaStepping {
            config,
            finder: LinearScanFinder,
        }
    }
}

impl Default for DeltaStepping {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> DeltaStepping<F> {
    /// Swap the minimum-selection strategy used to resolve competing updates
    pub fn with_finder<F2>(self, finder: F2) -> DeltaStepping<F2> {
        DeltaStepping {
            config: self.config,
            finder,
        }
    }

    pub fn config(&self) -> &SsspConfig {
        &self.config
    }

    fn thread_pool(&self) -> Result<Option<ThreadPool>> {
        let workers = self.config.workers();
        if workers <= 1 {
            return Ok(None);
        }
        let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
        Ok(Some(pool))
    }

    /// Runs the landmark and hierarchy precomputation the configuration asks for,
    /// partitioning with [`GreedyGrowthPartitioner`].
    pub fn preprocess<W, G>(&self, graph: &G) -> Result<Preprocessed<W>>
    where
        W: Weight,
        G: Graph<W>,
        F: MinimumFinder<W>,
    {
        self.preprocess_with(graph, &GreedyGrowthPartitioner)
    }

    /// Like [`DeltaStepping::preprocess`] with a caller-supplied partitioner
    pub fn preprocess_with<W, G>(
        &self,
        graph: &G,
        partitioner: &dyn Partitioner<W>,
    ) -> Result<Preprocessed<W>>
    where
        W: Weight,
        G: Graph<W>,
        F: MinimumFinder<W>,
    {
        self.config.validate()?;
        let started = Instant::now();
        let pool = self.thread_pool()?;
        let delta = self.resolve_delta(graph)?;

        let landmarks = if self.config.pruning_enabled {
            let requested = self.config.effective_landmark_count(graph.node_count());
            let oracle = LandmarkOracle::build(
                graph,
                requested,
                self.config.landmark_time_budget,
                self.config.landmark_memory_budget,
                |g: &dyn Graph<W>, source: usize| {
                    let relaxer = BatchRelaxer::new(delta, &self.finder)
                        .with_pool(pool.as_ref(), self.config.parallel_batch_threshold);
                    self.settle_all(g, source, &relaxer)
                },
            )?;
            Some(oracle)
        } else {
            None
        };

        let hierarchy = if self.config.hierarchy_enabled {
            let hierarchy = GraphHierarchy::build(
                graph,
                partitioner,
                self.config.region_size_target,
                self.config.max_hierarchy_levels,
            )?;
            if !hierarchy.is_meaningful() {
                debug!("Hierarchy has fewer than two regions; seeding disabled");
            }
            Some(hierarchy)
        } else {
            None
        };

        info!(
            "Preprocessed {} nodes in {:?}: delta={:?}, landmarks={}, hierarchy depth={}",
            graph.node_count(),
            started.elapsed(),
            delta,
            landmarks.as_ref().map_or(0, LandmarkOracle::len),
            hierarchy.as_ref().map_or(0, GraphHierarchy::depth)
        );

        Ok(Preprocessed {
            node_count: graph.node_count(),
            delta,
            landmarks,
            hierarchy,
        })
    }

    /// Answers one query using precomputed data.
    ///
    /// `cancel` and the configured `time_limit` are checked between buckets; an aborted
    /// run returns a [`RunStatus::Cancelled`] result holding only finalized distances.
    pub fn solve<W, G>(
        &self,
        graph: &G,
        source: usize,
        prep: &Preprocessed<W>,
        cancel: Option<&CancellationToken>,
    ) -> Result<ShortestPathResult<W>>
    where
        W: Weight,
        G: Graph<W>,
        F: MinimumFinder<W>,
    {
        if !graph.has_node(source) {
            return Err(Error::SourceNotFound(source));
        }
        if prep.node_count != graph.node_count() {
            return Err(Error::InvalidConfig(format!(
                "preprocessing was built for {} nodes, graph has {}",
                prep.node_count,
                graph.node_count()
            )));
        }

        let pool = self.thread_pool()?;
        let mut stats = RunStats {
            delta: prep.delta.to_f64().unwrap_or(f64::NAN),
            ..RunStats::default()
        };

        let bounds = match prep.hierarchy.as_ref() {
            Some(hierarchy) if hierarchy.is_meaningful() => {
                stats.hierarchy_levels_used = hierarchy.depth();
                Some(self.hierarchy_bounds(hierarchy, source, pool.as_ref())?)
            }
            _ => None,
        };
        stats.landmarks_used = prep.landmarks.as_ref().map_or(0, LandmarkOracle::len);

        let relaxer = BatchRelaxer::new(prep.delta, &self.finder)
            .with_pool(pool.as_ref(), self.config.parallel_batch_threshold)
            .with_landmarks(prep.landmarks.as_ref())
            .with_bounds(bounds.as_deref());

        let started = Instant::now();
        let (mut distances, status) = self.run(
            graph,
            source,
            &relaxer,
            self.config.record_updates,
            cancel,
            self.config.time_limit,
            &mut stats,
        )?;
        stats.elapsed = started.elapsed();
        stats.finalized = distances.finalized_count();

        info!(
            "Delta-stepping from {} finished ({:?}): {} buckets, {} light passes, {} relaxations, {} finalized in {:?}",
            source,
            status,
            stats.buckets_processed,
            stats.light_passes,
            stats.relaxations,
            stats.finalized,
            stats.elapsed
        );

        let update_log = distances.take_update_log();
        let (raw, raw_predecessors, states) = distances.into_parts();
        let finalized: Vec<bool> = states.iter().map(|&s| s == NodeState::Finalized).collect();
        let keep = |v: usize| status == RunStatus::Complete || finalized[v];
        let distances = raw
            .iter()
            .enumerate()
            .map(|(v, &d)| (d.is_finite() && keep(v)).then_some(d))
            .collect();
        let predecessors = raw_predecessors
            .iter()
            .enumerate()
            .map(|(v, &p)| if keep(v) { p } else { None })
            .collect();

        Ok(ShortestPathResult {
            distances,
            predecessors,
            finalized,
            source,
            status,
            stats,
            update_log,
        })
    }

    /// Runs a query that can be aborted through `token`
    pub fn compute_with_cancellation<W, G>(
        &self,
        graph: &G,
        source: usize,
        token: &CancellationToken,
    ) -> Result<ShortestPathResult<W>>
    where
        W: Weight,
        G: Graph<W>,
        F: MinimumFinder<W>,
    {
        let prep = self.preprocess(graph)?;
        self.solve(graph, source, &prep, Some(token))
    }

    fn resolve_delta<W, G>(&self, graph: &G) -> Result<W>
    where
        W: Weight,
        G: Graph<W> + ?Sized,
    {
        let delta = match self.config.delta {
            Some(delta) => cast::<f64, W>(delta).ok_or_else(|| {
                Error::InvalidConfig(format!("delta {} is not representable", delta))
            })?,
            None => heuristic_delta(graph),
        };
        Ok(bucket_safe_delta(graph, delta))
    }

    /// Solves every hierarchy level coarsest first and returns base-level bounds
    fn hierarchy_bounds<W>(
        &self,
        hierarchy: &GraphHierarchy<W>,
        source: usize,
        pool: Option<&ThreadPool>,
    ) -> Result<Vec<W>>
    where
        W: Weight,
        F: MinimumFinder<W>,
    {
        hierarchy.lower_bounds(source, |coarse, coarse_source, bounds| {
            let relaxer = BatchRelaxer::new(heuristic_delta(coarse), &self.finder)
                .with_pool(pool, self.config.parallel_batch_threshold)
                .with_bounds(bounds);
            self.settle_all(coarse, coarse_source, &relaxer)
        })
    }

    /// Unpruned, uncancellable run returning raw distances (infinite when unreachable)
    fn settle_all<W, G>(&self, graph: &G, source: usize, relaxer: &BatchRelaxer<'_, W>) -> Result<Vec<W>>
    where
        W: Weight,
        G: Graph<W> + ?Sized,
    {
        let mut stats = RunStats::default();
        let (distances, _) = self.run(graph, source, relaxer, false, None, None, &mut stats)?;
        Ok(distances.into_parts().0)
    }

    #[allow(clippy::too_many_arguments)]
    fn run<W, G>(
        &self,
        graph: &G,
        source: usize,
        relaxer: &BatchRelaxer<'_, W>,
        record_updates: bool,
        cancel: Option<&CancellationToken>,
        time_limit: Option<Duration>,
        stats: &mut RunStats,
    ) -> Result<(DistanceArray<W>, RunStatus)>
    where
        W: Weight,
        G: Graph<W> + ?Sized,
    {
        let n = graph.node_count();
        let mut distances = DistanceArray::new(n, record_updates);
        let mut frontier = BucketedFrontier::new(n, relaxer.delta())?;
        distances.relax(source, W::zero(), None);
        frontier.insert_or_move(source, W::zero());

        let started = Instant::now();
        let mut status = RunStatus::Complete;

        while let Some((bucket, mut active)) = frontier.extract_min_bucket() {
            let timed_out = time_limit.map_or(false, |limit| started.elapsed() >= limit);
            if timed_out || cancel.map_or(false, CancellationToken::is_cancelled) {
                info!(
                    "Run from {} aborted before bucket {} ({} nodes finalized)",
                    source,
                    bucket,
                    distances.finalized_count()
                );
                status = RunStatus::Cancelled;
                break;
            }
            stats.buckets_processed += 1;

            while !active.is_empty() {
                stats.light_passes += 1;
                let updated = relaxer.relax(
                    graph,
                    &active,
                    EdgeClass::Light,
                    &mut distances,
                    &mut frontier,
                    stats,
                );
                active = updated
                    .into_iter()
                    .filter(|&(_, landed)| landed == bucket)
                    .map(|(node, _)| node)
                    .collect();
            }

            let settled = frontier.clear_bucket(bucket);
            for &node in &settled {
                distances.finalize(node);
            }
            trace!("Bucket {} settled {} nodes", bucket, settled.len());

            relaxer.relax(
                graph,
                &settled,
                EdgeClass::Heavy,
                &mut distances,
                &mut frontier,
                stats,
            );
        }

        Ok((distances, status))
    }
}

impl<W, G, F> ShortestPathAlgorithm<W, G> for DeltaStepping<F>
where
    W: Weight,
    G: Graph<W>,
    F: MinimumFinder<W>,
{
    fn name(&self) -> &'static str {
        "DeltaStepping"
    }

    fn compute_shortest_paths(&self, graph: &G, source: usize) -> Result<ShortestPathResult<W>> {
        if !graph.has_node(source) {
            return Err(Error::SourceNotFound(source));
        }
        let prep = self.preprocess(graph)?;
        self.solve(graph, source, &prep, None)
    }
}

/// Half the average edge weight, or one when that is zero or there are no edges
fn heuristic_delta<W, G>(graph: &G) -> W
where
    W: Weight,
    G: Graph<W> + ?Sized,
{
    let two = W::one() + W::one();
    let delta = match average_edge_weight(graph) {
        Some(average) if average > W::zero() => average / two,
        _ => W::one(),
    };
    bucket_safe_delta(graph, delta)
}

/// Highest bucket index a run should produce. f64 still counts integers exactly here.
const MAX_BUCKET_INDEX: f64 = 4_503_599_627_370_496.0;

/// Widens `delta` until no finite distance in `graph` maps past [`MAX_BUCKET_INDEX`].
///
/// The total edge weight bounds every shortest distance, and any positive width keeps
/// results exact, so only the bucket granularity changes.
fn bucket_safe_delta<W, G>(graph: &G, delta: W) -> W
where
    W: Weight,
    G: Graph<W> + ?Sized,
{
    let total = (0..graph.node_count())
        .flat_map(|v| graph.neighbors(v))
        .fold(W::zero(), |acc, (_, w)| acc + w);
    let reach = if total.is_finite() { total } else { W::max_value() };
    let limit = MAX_BUCKET_INDEX.min(usize::MAX as f64 / 2.0);
    let Some(limit) = cast::<f64, W>(limit) else {
        return delta;
    };
    let narrowest = reach / limit;
    if delta < narrowest {
        warn!(
            "delta {:?} would overflow bucket indices (total weight {:?}); widening to {:?}",
            delta, reach, narrowest
        );
        narrowest
    } else {
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Float;
    use crate::algorithm::dijkstra::Dijkstra;
    use crate::algorithm::min_finder::BoundedHeapFinder;
    use crate::graph::DirectedGraph;
    use ordered_float::OrderedFloat;

    type W = OrderedFloat<f64>;

    fn graph(n: usize, edges: &[(usize, usize, f64)]) -> DirectedGraph<W> {
        DirectedGraph::from_edges(n, edges.iter().map(|&(u, v, w)| (u, v, OrderedFloat(w))))
            .unwrap()
    }

    #[test]
    fn two_hops_beat_direct_edge() {
        // A=0, B=1, C=2
        let g = graph(3, &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, 3.0)]);
        for delta in [0.5, 1.0, 2.0, 10.0] {
            let engine = DeltaStepping::with_config(SsspConfig::new().with_delta(delta));
            let result = engine.compute_shortest_paths(&g, 0).unwrap();
            assert_eq!(result.distance(2), Some(OrderedFloat(2.0)), "delta {}", delta);
            assert_eq!(result.predecessors[2], Some(1));
            assert_eq!(result.path_to(2), Some(vec![0, 1, 2]));
        }
    }

    #[test]
    fn two_cycle_terminates() {
        let g = graph(2, &[(0, 1, 5.0), (1, 0, 5.0)]);
        let result = DeltaStepping::new().compute_shortest_paths(&g, 0).unwrap();
        assert_eq!(result.distance(1), Some(OrderedFloat(5.0)));
        assert_eq!(result.distance(0), Some(OrderedFloat(0.0)));
        assert!(result.is_complete());
        assert_eq!(result.stats.finalized, 2);
    }

    #[test]
    fn single_node_graph() {
        let g = DirectedGraph::<W>::empty(1);
        let result = DeltaStepping::new().compute_shortest_paths(&g, 0).unwrap();
        assert_eq!(result.distances, vec![Some(OrderedFloat(0.0))]);
        assert_eq!(result.predecessors, vec![None]);
        assert_eq!(result.stats.delta, 1.0);
    }

    #[test]
    fn same_bucket_cascade_is_resolved_before_finalizing() {
        // every edge is light for delta = 10; 0 -> 3 directly is worse than 0 -> 1 -> 2 -> 3
        let g = graph(4, &[(0, 3, 3.0), (0, 1, 0.5), (1, 2, 0.5), (2, 3, 0.5)]);
        let engine = DeltaStepping::with_config(SsspConfig::new().with_delta(10.0));
        let result = engine.compute_shortest_paths(&g, 0).unwrap();
        assert_eq!(result.distance(3), Some(OrderedFloat(1.5)));
        assert_eq!(result.predecessors[3], Some(2));
        assert_eq!(result.stats.buckets_processed, 1);
        assert!(result.stats.light_passes >= 3);
    }

    #[test]
    fn zero_weight_edges_and_unreachable_nodes() {
        let g = graph(4, &[(0, 1, 0.0), (1, 2, 0.0)]);
        let result = DeltaStepping::new().compute_shortest_paths(&g, 0).unwrap();
        assert_eq!(result.distance(2), Some(OrderedFloat(0.0)));
        assert_eq!(result.distance(3), None);
        assert!(!result.finalized[3]);
        assert_eq!(result.reachable(), 3);
    }

    #[test]
    fn cancelled_before_start_finalizes_nothing() {
        let g = graph(3, &[(0, 1, 1.0), (1, 2, 1.0)]);
        let token = CancellationToken::new();
        token.cancel();
        let engine = DeltaStepping::new();
        let result = engine.compute_with_cancellation(&g, 0, &token).unwrap();
        assert_eq!(result.status, RunStatus::Cancelled);
        assert!(result.distances.iter().all(Option::is_none));
        assert!(matches!(
            result.into_complete(),
            Err(Error::Cancelled { finalized: 0 })
        ));
    }

    #[test]
    fn zero_time_limit_stops_at_first_bucket() {
        let g = graph(3, &[(0, 1, 1.0), (1, 2, 1.0)]);
        let engine = DeltaStepping::with_config(SsspConfig::new().with_time_limit(Duration::ZERO));
        let result = engine.compute_shortest_paths(&g, 0).unwrap();
        assert!(!result.is_complete());
        assert_eq!(result.stats.buckets_processed, 0);
    }

    #[test]
    fn update_log_is_monotone_per_node() {
        let g = crate::graph::generators::generate_random_connected(200, 1200, 0.5..8.0, 9).unwrap();
        let engine = DeltaStepping::with_config(SsspConfig::new().with_update_recording(true));
        let result = engine.compute_shortest_paths(&g, 0).unwrap();
        let log = result.update_log.as_ref().unwrap();
        assert_eq!(log.len() as u64, result.stats.improvements + 1);

        let mut last = vec![W::infinity(); 200];
        for &(node, d) in log {
            assert!(d < last[node]);
            last[node] = d;
        }
        for v in 0..200 {
            assert_eq!(Some(last[v]), result.distance(v));
        }
    }

    #[test]
    fn finders_agree() {
        let g = crate::graph::generators::generate_random_connected(300, 2000, 1.0..3.0, 4).unwrap();
        let linear = DeltaStepping::new().compute_shortest_paths(&g, 0).unwrap();
        let heap = DeltaStepping::new()
            .with_finder(BoundedHeapFinder)
            .compute_shortest_paths(&g, 0)
            .unwrap();
        assert_eq!(linear.distances, heap.distances);
        assert_eq!(linear.predecessors, heap.predecessors);
    }

    #[test]
    fn preprocessing_is_reused_across_sources() {
        let g = crate::graph::generators::generate_grid(12, 12, 1.0..5.0, 3).unwrap();
        let engine = DeltaStepping::with_config(
            SsspConfig::new()
                .with_pruning(true)
                .with_hierarchy(true)
                .with_region_size_target(20),
        );
        let prep = engine.preprocess(&g).unwrap();
        assert_eq!(prep.landmarks().map(LandmarkOracle::len), Some(12));
        assert!(prep.hierarchy().map_or(false, GraphHierarchy::is_meaningful));

        for source in [0, 77, 143] {
            let fast = engine.solve(&g, source, &prep, None).unwrap();
            let plain = DeltaStepping::new().compute_shortest_paths(&g, source).unwrap();
            assert_eq!(fast.distances, plain.distances);
            assert_eq!(fast.stats.landmarks_used, 12);
            assert!(fast.stats.hierarchy_levels_used >= 1);
        }
    }

    #[test]
    fn huge_weights_do_not_share_a_bucket() {
        let g = graph(3, &[(0, 1, 2e19), (0, 2, 4e19), (1, 2, 1e19)]);
        let engine = DeltaStepping::with_config(SsspConfig::new().with_delta(1.0));
        let result = engine.compute_shortest_paths(&g, 0).unwrap();
        let expected = Dijkstra::new().compute_shortest_paths(&g, 0).unwrap();

        assert_eq!(result.distances, expected.distances);
        assert_eq!(result.distance(2), Some(OrderedFloat(3e19)));
        assert_eq!(result.predecessors[2], Some(1));
        assert!(result.stats.delta > 1.0, "delta was not widened: {}", result.stats.delta);
    }

    #[test]
    fn rounded_heavy_target_is_not_sent_back_into_drained_bucket() {
        // 8.4 / 0.2 is exactly 42, but (8.4 + 0.20000000000000012) / 0.2 rounds below 43
        let g = graph(3, &[(0, 1, 8.4), (1, 2, 0.20000000000000012)]);
        let engine = DeltaStepping::with_config(SsspConfig::new().with_delta(0.2));
        let result = engine.compute_shortest_paths(&g, 0).unwrap();
        let expected = Dijkstra::new().compute_shortest_paths(&g, 0).unwrap();

        assert_eq!(result.distances, expected.distances);
        assert_eq!(result.predecessors, expected.predecessors);
        assert!(result.is_complete());
        assert_eq!(result.stats.finalized, 3);
    }

    #[test]
    fn preprocessing_for_another_graph_is_rejected() {
        let small = graph(2, &[(0, 1, 1.0)]);
        let large = graph(3, &[(0, 1, 1.0)]);
        let engine = DeltaStepping::new();
        let prep = engine.preprocess(&small).unwrap();
        assert!(matches!(
            engine.solve(&large, 0, &prep, None),
            Err(Error::InvalidConfig(_))
        ));
    }
}
