//! Landmark (ALT-style) lower bounds.
//!
//! For every landmark `l` the oracle stores `d(l, ·)` and `d(·, l)`. The triangle
//! inequality then gives, for any pair `(u, v)`:
//!
//! ```text
//! d(u, v) >= d(l, v) - d(l, u)
//! d(u, v) >= d(u, l) - d(v, l)
//! ```
//!
//! Only finite entries contribute, so a bound is always valid, just not always tight.

use std::mem::size_of;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::graph::traits::Reversed;
use crate::graph::{Graph, Weight};
use crate::{Error, Result};

/// Precomputed landmark distance rows, immutable once built
#[derive(Debug, Clone)]
pub struct LandmarkOracle<W>
where
    W: Weight,
{
    landmarks: Vec<usize>,
    /// `forward[i][v] = d(landmarks[i], v)`
    forward: Vec<Vec<W>>,
    /// `backward[i][v] = d(v, landmarks[i])`
    backward: Vec<Vec<W>>,
    requested: usize,
    truncated: bool,
}

impl<W> LandmarkOracle<W>
where
    W: Weight,
{
    /// An oracle with no landmarks; every bound is zero
    pub fn empty() -> Self {
        LandmarkOracle {
            landmarks: Vec::new(),
            forward: Vec::new(),
            backward: Vec::new(),
            requested: 0,
            truncated: false,
        }
    }

    /// Selects up to `requested` landmarks by farthest-point sampling and computes
    /// their distance rows with `solve(graph, source)`, which must return exact
    /// distances with `W::infinity()` for unreachable nodes.
    ///
    /// Sampling starts at node 0 and then repeatedly takes the node whose minimum
    /// distance from the chosen landmarks is largest (unreachable counts as farthest,
    /// ties go to the lowest id). If either budget would be exceeded, selection stops
    /// early and the oracle is marked truncated instead of failing.
    pub fn build<G, F>(
        graph: &G,
        requested: usize,
        time_budget: Option<Duration>,
        memory_budget: Option<usize>,
        mut solve: F,
    ) -> Result<Self>
    where
        G: Graph<W>,
        F: FnMut(&dyn Graph<W>, usize) -> Result<Vec<W>>,
    {
        let n = graph.node_count();
        let requested = requested.min(n);
        let mut oracle = LandmarkOracle::empty();
        oracle.requested = requested;
        if requested == 0 {
            return Ok(oracle);
        }

        let started = Instant::now();
        let row_bytes = 2 * n * size_of::<W>();
        let reversed = Reversed::new(graph);
        let mut nearest = vec![W::infinity(); n];
        let mut selected = vec![false; n];
        let mut next = Some(0);

        while let Some(landmark) = next {
            if oracle.landmarks.len() >= requested {
                break;
            }
            let over_time = time_budget.map_or(false, |budget| started.elapsed() >= budget);
            let over_memory = memory_budget
                .map_or(false, |budget| (oracle.landmarks.len() + 1) * row_bytes > budget);
            if over_time || over_memory {
                let err = Error::LandmarkBudgetExceeded {
                    selected: oracle.landmarks.len(),
                    requested,
                };
                warn!("{}; continuing with weaker pruning", err);
                oracle.truncated = true;
                break;
            }

            let forward = solve(graph, landmark)?;
            let backward = solve(&reversed, landmark)?;
            for (best, &d) in nearest.iter_mut().zip(&forward) {
                if d < *best {
                    *best = d;
                }
            }
            selected[landmark] = true;
            oracle.landmarks.push(landmark);
            oracle.forward.push(forward);
            oracle.backward.push(backward);

            next = farthest_unselected(&nearest, &selected);
        }

        debug!(
            "Selected {} of {} landmarks in {:?}",
            oracle.landmarks.len(),
            requested,
            started.elapsed()
        );
        Ok(oracle)
    }

    /// Lower bound on `d(u, v)`; zero when nothing is known
    pub fn lower_bound(&self, u: usize, v: usize) -> W {
        let mut best = W::zero();
        for (forward, backward) in self.forward.iter().zip(&self.backward) {
            let (lu, lv) = (forward[u], forward[v]);
            if lu.is_finite() && lv.is_finite() && lv - lu > best {
                best = lv - lu;
            }
            let (ul, vl) = (backward[u], backward[v]);
            if ul.is_finite() && vl.is_finite() && ul - vl > best {
                best = ul - vl;
            }
        }
        best
    }

    pub fn landmarks(&self) -> &[usize] {
        &self.landmarks
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Landmarks asked for (after clamping to the node count)
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// True if a budget cut selection short
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// `d(landmarks[index], ·)`
    pub fn distances_from(&self, index: usize) -> Option<&[W]> {
        self.forward.get(index).map(Vec::as_slice)
    }

    /// `d(·, landmarks[index])`
    pub fn distances_to(&self, index: usize) -> Option<&[W]> {
        self.backward.get(index).map(Vec::as_slice)
    }
}

fn farthest_unselected<W: Weight>(nearest: &[W], selected: &[bool]) -> Option<usize> {
    let mut best: Option<(W, usize)> = None;
    for (v, &d) in nearest.iter().enumerate() {
        if selected[v] {
            continue;
        }
        match best {
            Some((far, _)) if d <= far => {}
            _ => best = Some((d, v)),
        }
    }
    best.map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Float;
    use crate::algorithm::{Dijkstra, ShortestPathAlgorithm};
    use crate::graph::generators::generate_random_connected;
    use crate::graph::DirectedGraph;
    use ordered_float::OrderedFloat;

    type W = OrderedFloat<f64>;

    fn dijkstra_rows(graph: &dyn Graph<W>, source: usize) -> Result<Vec<W>> {
        let result = Dijkstra::new().compute_shortest_paths(graph, source)?;
        Ok(result
            .distances
            .into_iter()
            .map(|d| d.unwrap_or_else(W::infinity))
            .collect())
    }

    #[test]
    fn bounds_never_exceed_true_distance() {
        let g = generate_random_connected(60, 240, 1.0..20.0, 21).unwrap();
        let oracle = LandmarkOracle::build(&g, 6, None, None, dijkstra_rows).unwrap();
        assert_eq!(oracle.len(), 6);
        assert!(!oracle.is_truncated());

        let mut tight = 0;
        for u in 0..g.node_count() {
            let truth = dijkstra_rows(&g, u).unwrap();
            for v in 0..g.node_count() {
                let bound = oracle.lower_bound(u, v);
                assert!(bound >= OrderedFloat(0.0));
                assert!(bound <= truth[v], "bound {:?} > d({}, {}) = {:?}", bound, u, v, truth[v]);
                if bound > OrderedFloat(0.0) {
                    tight += 1;
                }
            }
        }
        assert!(tight > 0);
    }

    #[test]
    fn farthest_point_sampling_reaches_other_components() {
        // 0 -> 1 -> 2, and an isolated node 3
        let g: DirectedGraph<W> = DirectedGraph::from_edges(
            4,
            vec![(0, 1, OrderedFloat(1.0)), (1, 2, OrderedFloat(5.0))],
        )
        .unwrap();
        let oracle = LandmarkOracle::build(&g, 3, None, None, dijkstra_rows).unwrap();
        // node 3 is unreachable from 0, so it is picked second; then 2 is farthest
        assert_eq!(oracle.landmarks(), &[0, 3, 2]);
        assert_eq!(oracle.distances_from(0).unwrap()[2], OrderedFloat(6.0));
        assert_eq!(oracle.distances_to(2).unwrap()[0], OrderedFloat(6.0));
        assert_eq!(oracle.lower_bound(0, 2), OrderedFloat(6.0));
        // no finite information about node 3
        assert_eq!(oracle.lower_bound(3, 0), OrderedFloat(0.0));
    }

    #[test]
    fn memory_budget_truncates_selection() {
        let g = generate_random_connected(50, 150, 1.0..5.0, 2).unwrap();
        let row_bytes = 2 * 50 * size_of::<W>();
        let oracle =
            LandmarkOracle::build(&g, 5, None, Some(2 * row_bytes), dijkstra_rows).unwrap();
        assert_eq!(oracle.len(), 2);
        assert_eq!(oracle.requested(), 5);
        assert!(oracle.is_truncated());

        let none = LandmarkOracle::build(&g, 5, None, Some(0), dijkstra_rows).unwrap();
        assert!(none.is_empty());
        assert_eq!(none.lower_bound(0, 10), OrderedFloat(0.0));
    }

    #[test]
    fn time_budget_truncates_selection() {
        let g = generate_random_connected(50, 150, 1.0..5.0, 2).unwrap();
        let oracle =
            LandmarkOracle::build(&g, 5, Some(Duration::ZERO), None, dijkstra_rows).unwrap();
        assert!(oracle.is_truncated());
        assert!(oracle.len() < oracle.requested());
        assert_eq!(oracle.lower_bound(0, 10), OrderedFloat(0.0));

        let roomy =
            LandmarkOracle::build(&g, 5, Some(Duration::from_secs(60)), None, dijkstra_rows)
                .unwrap();
        assert_eq!(roomy.len(), 5);
        assert!(!roomy.is_truncated());
    }

    #[test]
    fn zero_landmarks_is_a_no_op() {
        let g = generate_random_connected(10, 20, 1.0..5.0, 2).unwrap();
        let oracle = LandmarkOracle::build(&g, 0, None, None, |_: &dyn Graph<W>, _: usize| {
            unreachable!()
        })
        .unwrap();
        assert!(oracle.is_empty());
        assert!(!oracle.is_truncated());
    }
}
