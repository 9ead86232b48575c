use crate::graph::directed::{DirectedGraph, GraphBuilder};
use crate::Result;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand::rngs::StdRng;

/// Generates a random directed graph with `n` nodes and roughly `m` edges.
///
/// A Hamiltonian path `0 -> 1 -> ... -> n-1` is added first so every node is reachable
/// from node 0; the remaining edges are uniform random pairs (self-loops skipped).
/// Weights are drawn uniformly from `weight_range`.
pub fn generate_random_connected(
    n: usize,
    m: usize,
    weight_range: std::ops::Range<f64>,
    seed: u64,
) -> Result<DirectedGraph<OrderedFloat<f64>>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = GraphBuilder::new(n);

    for v in 1..n {
        let weight = OrderedFloat(rng.gen_range(weight_range.clone()));
        builder.add_edge(v - 1, v, weight);
    }

    if n > 1 {
        for _ in n.saturating_sub(1)..m {
            let u = rng.gen_range(0..n);
            let v = rng.gen_range(0..n);
            if u == v {
                continue;
            }
            let weight = OrderedFloat(rng.gen_range(weight_range.clone()));
            builder.add_edge(u, v, weight);
        }
    }

    builder.build()
}

/// Generates a random directed graph where each of the `m` edges picks its endpoints
/// uniformly, so some nodes may be unreachable.
pub fn generate_random(
    n: usize,
    m: usize,
    weight_range: std::ops::Range<f64>,
    seed: u64,
) -> Result<DirectedGraph<OrderedFloat<f64>>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = GraphBuilder::new(n);

    if n > 1 {
        for _ in 0..m {
            let u = rng.gen_range(0..n);
            let v = rng.gen_range(0..n);
            if u != v {
                let weight = OrderedFloat(rng.gen_range(weight_range.clone()));
                builder.add_edge(u, v, weight);
            }
        }
    }

    builder.build()
}

/// Generates a `width x height` grid with 4-connectivity in both directions.
/// Weights come from `weight_range` (pass `1.0..1.0 + f64::EPSILON` for near-unit weights).
pub fn generate_grid(
    width: usize,
    height: usize,
    weight_range: std::ops::Range<f64>,
    seed: u64,
) -> Result<DirectedGraph<OrderedFloat<f64>>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = GraphBuilder::new(width * height);

    // Helper function to get node index from 2D coordinates
    let index = |x: usize, y: usize| -> usize { y * width + x };

    for y in 0..height {
        for x in 0..width {
            if x + 1 < width {
                let weight = OrderedFloat(rng.gen_range(weight_range.clone()));
                builder.add_undirected_edge(index(x, y), index(x + 1, y), weight);
            }
            if y + 1 < height {
                let weight = OrderedFloat(rng.gen_range(weight_range.clone()));
                builder.add_undirected_edge(index(x, y), index(x, y + 1), weight);
            }
        }
    }

    builder.build()
}

/// Generates a star: node 0 is the center, nodes `1..=leaves` are connected to it in
/// both directions with the same weight.
pub fn generate_star(leaves: usize, weight: f64) -> Result<DirectedGraph<OrderedFloat<f64>>> {
    let mut builder = GraphBuilder::new(leaves + 1);
    for leaf in 1..=leaves {
        builder.add_undirected_edge(0, leaf, OrderedFloat(weight));
    }
    builder.build()
}
