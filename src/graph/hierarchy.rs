//! Multi-level graph contraction used to seed lower bounds.
//!
//! Each level partitions the nodes of the level below into regions and contracts every
//! region into one supernode. An edge between two supernodes carries the lightest weight
//! of any edge crossing that pair of regions, so a distance in a coarse graph never
//! exceeds the matching distance in the finer graph.

use std::collections::HashMap;

use log::{debug, warn};

use crate::data_structures::BinaryHeapWrapper;
use crate::graph::directed::DirectedGraph;
use crate::graph::traits::{Graph, Weight};
use crate::{Error, Result};

/// Splits a graph into regions. Any algorithm that roughly minimizes the weight of
/// cross-region edges is acceptable; a trivial single-region answer is tolerated.
pub trait Partitioner<W>: Send + Sync
where
    W: Weight,
{
    /// Returns one region id per node. Region ids need not be dense.
    fn partition(&self, graph: &dyn Graph<W>, target_regions: usize) -> Result<Vec<usize>>;
}

impl<W, F> Partitioner<W> for F
where
    W: Weight,
    F: Fn(&dyn Graph<W>, usize) -> Result<Vec<usize>> + Send + Sync,
{
    fn partition(&self, graph: &dyn Graph<W>, target_regions: usize) -> Result<Vec<usize>> {
        self(graph, target_regions)
    }
}

/// Deterministic region growing.
///
/// Seeds are taken in node-id order; each region absorbs its lightest boundary edge
/// (ignoring direction) until it reaches `⌈n / target_regions⌉` nodes or runs out of
/// unassigned neighbours. Disconnected leftovers become extra regions.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyGrowthPartitioner;

impl<W> Partitioner<W> for GreedyGrowthPartitioner
where
    W: Weight,
{
    fn partition(&self, graph: &dyn Graph<W>, target_regions: usize) -> Result<Vec<usize>> {
        let n = graph.node_count();
        if target_regions == 0 {
            return Err(Error::PartitionerFailure(
                "requested zero regions".to_string(),
            ));
        }
        let capacity = n.div_ceil(target_regions).max(1);

        let mut region = vec![usize::MAX; n];
        let mut next_region = 0;

        for seed in 0..n {
            if region[seed] != usize::MAX {
                continue;
            }
            let id = next_region;
            next_region += 1;

            let mut boundary = BinaryHeapWrapper::new();
            boundary.push(seed, W::zero());
            let mut size = 0;

            while size < capacity {
                let Some((node, _)) = boundary.pop() else {
                    break;
                };
                if region[node] != usize::MAX {
                    continue;
                }
                region[node] = id;
                size += 1;

                for (other, weight) in graph.neighbors(node).chain(graph.incoming(node)) {
                    if region[other] == usize::MAX {
                        boundary.push(other, weight);
                    }
                }
            }
        }
        Ok(region)
    }
}

/// One contraction step: the finer graph's nodes mapped onto the supernodes of `graph`
#[derive(Debug, Clone)]
pub struct HierarchyLevel<W>
where
    W: Weight,
{
    /// The contracted graph, one node per region
    pub graph: DirectedGraph<W>,
    /// Finer node -> region (supernode) id
    pub region_of: Vec<usize>,
    /// Finer node -> has an edge to or from another region
    pub is_portal: Vec<bool>,
    /// Region -> its portal nodes in the finer graph
    pub portals: Vec<Vec<usize>>,
}

impl<W> HierarchyLevel<W>
where
    W: Weight,
{
    pub fn region_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn portal_count(&self) -> usize {
        self.portals.iter().map(Vec::len).sum()
    }
}

/// A tower of contracted graphs `G₁ … G_L` above a base graph `G₀`.
#[derive(Debug, Clone)]
pub struct GraphHierarchy<W>
where
    W: Weight,
{
    base_node_count: usize,
    /// `levels[i]` contracts the graph at depth `i` into the graph at depth `i + 1`
    levels: Vec<HierarchyLevel<W>>,
    /// The partitioner failed and construction stopped early
    degraded: bool,
}

impl<W> GraphHierarchy<W>
where
    W: Weight,
{
    /// Builds levels until a level holds at most `region_size_target` nodes, the
    /// partitioner stops contracting, or `max_levels` levels exist.
    ///
    /// Partitioner failures are logged and end construction; the hierarchy built so far
    /// (possibly none) is kept.
    pub fn build<G>(
        graph: &G,
        partitioner: &dyn Partitioner<W>,
        region_size_target: usize,
        max_levels: usize,
    ) -> Result<Self>
    where
        G: Graph<W>,
    {
        let region_size_target = region_size_target.max(1);
        let mut levels: Vec<HierarchyLevel<W>> = Vec::new();
        let mut degraded = false;

        while levels.len() < max_levels {
            let next = {
                let current: &dyn Graph<W> = match levels.last() {
                    Some(level) => &level.graph,
                    None => graph,
                };
                let n = current.node_count();
                let target_regions = n.div_ceil(region_size_target);
                if n <= region_size_target || target_regions < 2 {
                    break;
                }

                let assignment = partitioner
                    .partition(current, target_regions)
                    .and_then(|raw| normalize_assignment(raw, n));
                let (region_of, regions) = match assignment {
                    Ok(assignment) => assignment,
                    Err(err) => {
                        warn!(
                            "{}; falling back to single-region hierarchy at depth {}",
                            err,
                            levels.len()
                        );
                        degraded = true;
                        break;
                    }
                };
                if regions < 2 || regions >= n {
                    debug!(
                        "Partition at depth {} produced {} regions for {} nodes, stopping",
                        levels.len(),
                        regions,
                        n
                    );
                    break;
                }

                contract(current, region_of, regions)?
            };

            debug!(
                "Hierarchy depth {}: {} regions, {} coarse edges, {} portals",
                levels.len() + 1,
                next.region_count(),
                next.graph.edge_count(),
                next.portal_count()
            );
            levels.push(next);
        }

        Ok(GraphHierarchy {
            base_node_count: graph.node_count(),
            levels,
            degraded,
        })
    }

    /// Number of contracted levels above the base graph
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[HierarchyLevel<W>] {
        &self.levels
    }

    /// True when at least one level splits the base graph into two or more regions.
    /// A hierarchy that is not meaningful is a pass-through and should not be consulted.
    pub fn is_meaningful(&self) -> bool {
        self.levels
            .first()
            .map_or(false, |level| level.region_count() >= 2)
    }

    /// True if the partitioner failed during construction
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Supernode holding base node `node` at every depth, starting with `node` itself
    pub fn images(&self, node: usize) -> Vec<usize> {
        let mut images = Vec::with_capacity(self.levels.len() + 1);
        images.push(node);
        for level in &self.levels {
            let below = images[images.len() - 1];
            images.push(level.region_of[below]);
        }
        images
    }

    /// Computes a lower bound on `d(source, v)` for every base node `v`.
    ///
    /// Levels are solved coarsest first with `solve(graph, source, bounds)`, which must
    /// return exact distances (`W::infinity()` when unreachable) and may use `bounds`
    /// only for pruning. Each level's portal distances become the bounds of the level
    /// below; non-portal nodes get a bound of zero.
    pub fn lower_bounds<F>(&self, source: usize, mut solve: F) -> Result<Vec<W>>
    where
        F: FnMut(&DirectedGraph<W>, usize, Option<&[W]>) -> Result<Vec<W>>,
    {
        let images = self.images(source);
        let mut bounds: Option<Vec<W>> = None;

        for (depth, level) in self.levels.iter().enumerate().rev() {
            let distances = solve(&level.graph, images[depth + 1], bounds.as_deref())?;
            let finer: Vec<W> = level
                .region_of
                .iter()
                .zip(&level.is_portal)
                .map(|(&region, &portal)| {
                    let d = distances[region];
                    if portal && d.is_finite() {
                        d
                    } else {
                        W::zero()
                    }
                })
                .collect();
            bounds = Some(finer);
        }

        Ok(bounds.unwrap_or_else(|| vec![W::zero(); self.base_node_count]))
    }
}

/// Validates a raw assignment and renumbers regions densely in order of first use
fn normalize_assignment(raw: Vec<usize>, n: usize) -> Result<(Vec<usize>, usize)> {
    if raw.len() != n {
        return Err(Error::PartitionerFailure(format!(
            "expected {} region ids, got {}",
            n,
            raw.len()
        )));
    }
    let mut dense: HashMap<usize, usize> = HashMap::new();
    let region_of: Vec<usize> = raw
        .into_iter()
        .map(|id| {
            let next = dense.len();
            *dense.entry(id).or_insert(next)
        })
        .collect();
    Ok((region_of, dense.len()))
}

fn contract<W>(
    graph: &dyn Graph<W>,
    region_of: Vec<usize>,
    regions: usize,
) -> Result<HierarchyLevel<W>>
where
    W: Weight,
{
    let n = graph.node_count();
    let mut crossing: HashMap<(usize, usize), W> = HashMap::new();
    let mut is_portal = vec![false; n];

    for u in 0..n {
        let ru = region_of[u];
        for (v, weight) in graph.neighbors(u) {
            let rv = region_of[v];
            if ru == rv {
                continue;
            }
            is_portal[u] = true;
            is_portal[v] = true;
            let lightest = crossing.entry((ru, rv)).or_insert(weight);
            if weight < *lightest {
                *lightest = weight;
            }
        }
    }

    let mut edges: Vec<(usize, usize, W)> = crossing
        .into_iter()
        .map(|((ru, rv), w)| (ru, rv, w))
        .collect();
    edges.sort_unstable();

    let mut portals = vec![Vec::new(); regions];
    for (node, &portal) in is_portal.iter().enumerate() {
        if portal {
            portals[region_of[node]].push(node);
        }
    }

    Ok(HierarchyLevel {
        graph: DirectedGraph::from_edges(regions, edges)?,
        region_of,
        is_portal,
        portals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::directed::GraphBuilder;
    use crate::graph::generators::{generate_grid, generate_star};
    use ordered_float::OrderedFloat;

    type W = OrderedFloat<f64>;

    /// Two triangles joined by a single bridge of weight 10
    fn two_clusters() -> DirectedGraph<W> {
        let mut b = GraphBuilder::new(6);
        for &(u, v) in &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)] {
            b.add_undirected_edge(u, v, OrderedFloat(1.0));
        }
        b.add_edge(2, 3, OrderedFloat(10.0));
        b.build().unwrap()
    }

    #[test]
    fn greedy_partitioner_respects_capacity() {
        let g = two_clusters();
        let regions = Partitioner::<W>::partition(&GreedyGrowthPartitioner, &g, 2).unwrap();
        assert_eq!(regions, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn contraction_keeps_min_crossing_weight_and_portals() {
        let g = two_clusters();
        let h = GraphHierarchy::build(&g, &GreedyGrowthPartitioner, 3, 4).unwrap();
        assert!(h.is_meaningful());
        assert_eq!(h.depth(), 1);
        let level = &h.levels()[0];
        assert_eq!(level.region_count(), 2);
        assert_eq!(level.graph.edge_weight(0, 1), Some(OrderedFloat(10.0)));
        assert!(!level.graph.has_edge(1, 0));
        assert_eq!(level.portals, vec![vec![2], vec![3]]);
        assert_eq!(h.images(4), vec![4, 1]);
    }

    #[test]
    fn star_graph_degenerates_to_pass_through() {
        let star = generate_star(10, 1.0).unwrap();
        let h = GraphHierarchy::build(&star, &GreedyGrowthPartitioner, 100, 4).unwrap();
        assert!(!h.is_meaningful());
        assert_eq!(h.depth(), 0);
        let bounds = h.lower_bounds(0, |_, _, _| unreachable!()).unwrap();
        assert_eq!(bounds, vec![OrderedFloat(0.0); 11]);
    }

    #[test]
    fn partitioner_failure_falls_back() {
        let g = two_clusters();
        let broken = |_: &dyn Graph<W>, _: usize| -> Result<Vec<usize>> { Ok(vec![0; 2]) };
        let h = GraphHierarchy::build(&g, &broken, 3, 4).unwrap();
        assert!(h.is_degraded());
        assert!(!h.is_meaningful());

        let failing = |_: &dyn Graph<W>, _: usize| -> Result<Vec<usize>> {
            Err(Error::PartitionerFailure("boom".to_string()))
        };
        let h = GraphHierarchy::build(&g, &failing, 3, 4).unwrap();
        assert!(h.is_degraded());
        assert_eq!(h.depth(), 0);
    }

    #[test]
    fn single_region_partition_is_tolerated() {
        let g = two_clusters();
        let trivial = |graph: &dyn Graph<W>, _: usize| -> Result<Vec<usize>> {
            Ok(vec![7; graph.node_count()])
        };
        let h = GraphHierarchy::build(&g, &trivial, 3, 4).unwrap();
        assert!(!h.is_degraded());
        assert!(!h.is_meaningful());
    }

    #[test]
    fn lower_bounds_come_from_portals() {
        let g = two_clusters();
        let h = GraphHierarchy::build(&g, &GreedyGrowthPartitioner, 3, 4).unwrap();
        // coarse distances from region 0: [0, 10]
        let bounds = h
            .lower_bounds(0, |coarse, source, _| {
                assert_eq!(source, 0);
                assert_eq!(coarse.node_count(), 2);
                Ok(vec![OrderedFloat(0.0), OrderedFloat(10.0)])
            })
            .unwrap();
        let expected: Vec<W> = [0.0, 0.0, 0.0, 10.0, 0.0, 0.0]
            .iter()
            .map(|&x| OrderedFloat(x))
            .collect();
        assert_eq!(bounds, expected);
    }

    #[test]
    fn grid_builds_multiple_levels() {
        let g = generate_grid(20, 20, 1.0..2.0, 5).unwrap();
        let h = GraphHierarchy::build(&g, &GreedyGrowthPartitioner, 10, 4).unwrap();
        assert!(h.is_meaningful());
        assert!(h.depth() >= 2);
        let images = h.images(0);
        assert_eq!(images.len(), h.depth() + 1);
    }
}
