use crate::graph::traits::{Graph, Weight};
use crate::{InvalidGraphError, Result};

/// An immutable directed graph stored as forward and reverse CSR adjacency arrays
#[derive(Debug, Clone)]
pub struct DirectedGraph<W>
where
    W: Weight,
{
    /// Number of nodes in the graph
    node_count: usize,

    /// `out_offsets[v]..out_offsets[v + 1]` indexes the outgoing edges of `v`
    out_offsets: Vec<usize>,

    /// Outgoing edges, grouped by source: (target, weight)
    out_edges: Vec<(usize, W)>,

    /// `in_offsets[v]..in_offsets[v + 1]` indexes the incoming edges of `v`
    in_offsets: Vec<usize>,

    /// Incoming edges, grouped by target: (source, weight)
    in_edges: Vec<(usize, W)>,
}

impl<W> DirectedGraph<W>
where
    W: Weight,
{
    /// Builds a graph from a node count and an edge list.
    ///
    /// Fails with [`InvalidGraphError`] on the first negative or non-finite weight or
    /// out-of-range node id; no partial graph is returned.
    pub fn from_edges<I>(node_count: usize, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, W)>,
    {
        let edges: Vec<(usize, usize, W)> = edges.into_iter().collect();

        for &(from, to, weight) in &edges {
            if from >= node_count || to >= node_count {
                return Err(InvalidGraphError::NodeOutOfRange {
                    from,
                    to,
                    node_count,
                }
                .into());
            }
            if !weight.is_finite() {
                return Err(InvalidGraphError::NonFiniteWeight { from, to }.into());
            }
            if weight < W::zero() {
                return Err(InvalidGraphError::NegativeWeight {
                    from,
                    to,
                    weight: weight.to_f64().unwrap_or(f64::NAN),
                }
                .into());
            }
        }

        let (out_offsets, out_edges) =
            Self::build_csr(node_count, edges.iter().map(|&(u, v, w)| (u, v, w)));
        let (in_offsets, in_edges) =
            Self::build_csr(node_count, edges.iter().map(|&(u, v, w)| (v, u, w)));

        Ok(DirectedGraph {
            node_count,
            out_offsets,
            out_edges,
            in_offsets,
            in_edges,
        })
    }

    /// Creates a graph with the given number of nodes and no edges
    pub fn empty(node_count: usize) -> Self {
        DirectedGraph {
            node_count,
            out_offsets: vec![0; node_count + 1],
            out_edges: Vec::new(),
            in_offsets: vec![0; node_count + 1],
            in_edges: Vec::new(),
        }
    }

    // Counting sort by key keeps each node's edges in insertion order.
    fn build_csr(
        node_count: usize,
        edges: impl Iterator<Item = (usize, usize, W)> + Clone,
    ) -> (Vec<usize>, Vec<(usize, W)>) {
        let mut offsets = vec![0usize; node_count + 1];
        for (key, _, _) in edges.clone() {
            offsets[key + 1] += 1;
        }
        for i in 0..node_count {
            offsets[i + 1] += offsets[i];
        }

        let mut cursor = offsets.clone();
        let mut adjacency = vec![(0usize, W::zero()); offsets[node_count]];
        for (key, other, weight) in edges {
            adjacency[cursor[key]] = (other, weight);
            cursor[key] += 1;
        }

        (offsets, adjacency)
    }

    /// Outgoing edges of `node` as a slice (empty for unknown nodes)
    pub fn out_slice(&self, node: usize) -> &[(usize, W)] {
        if node >= self.node_count {
            return &[];
        }
        &self.out_edges[self.out_offsets[node]..self.out_offsets[node + 1]]
    }

    /// Incoming edges of `node` as a slice (empty for unknown nodes)
    pub fn in_slice(&self, node: usize) -> &[(usize, W)] {
        if node >= self.node_count {
            return &[];
        }
        &self.in_edges[self.in_offsets[node]..self.in_offsets[node + 1]]
    }

    /// Returns a copy of this graph with every edge reversed
    pub fn reversed(&self) -> Self {
        DirectedGraph {
            node_count: self.node_count,
            out_offsets: self.in_offsets.clone(),
            out_edges: self.in_edges.clone(),
            in_offsets: self.out_offsets.clone(),
            in_edges: self.out_edges.clone(),
        }
    }

    /// Mean edge weight, or `None` for an edgeless graph
    pub fn average_edge_weight(&self) -> Option<W> {
        average_edge_weight(self)
    }
}

/// Mean edge weight of any graph, or `None` if it has no edges
pub fn average_edge_weight<W, G>(graph: &G) -> Option<W>
where
    W: Weight,
    G: Graph<W> + ?Sized,
{
    let m = graph.edge_count();
    if m == 0 {
        return None;
    }
    let total = (0..graph.node_count())
        .flat_map(|v| graph.neighbors(v))
        .fold(W::zero(), |acc, (_, w)| acc + w);
    num_traits::cast::<usize, W>(m).map(|count| total / count)
}

impl<W> Graph<W> for DirectedGraph<W>
where
    W: Weight,
{
    fn node_count(&self) -> usize {
        self.node_count
    }

    fn edge_count(&self) -> usize {
        self.out_edges.len()
    }

    fn neighbors(&self, node: usize) -> Box<dyn Iterator<Item = (usize, W)> + '_> {
        Box::new(self.out_slice(node).iter().copied())
    }

    fn incoming(&self, node: usize) -> Box<dyn Iterator<Item = (usize, W)> + '_> {
        Box::new(self.in_slice(node).iter().copied())
    }
}

/// Accumulates edges and produces a validated [`DirectedGraph`]
#[derive(Debug, Clone)]
pub struct GraphBuilder<W>
where
    W: Weight,
{
    node_count: usize,
    edges: Vec<(usize, usize, W)>,
}

impl<W> GraphBuilder<W>
where
    W: Weight,
{
    /// Creates a builder for a graph with `node_count` nodes
    pub fn new(node_count: usize) -> Self {
        GraphBuilder {
            node_count,
            edges: Vec::new(),
        }
    }

    /// Adds a node and returns its id
    pub fn add_node(&mut self) -> usize {
        self.node_count += 1;
        self.node_count - 1
    }

    /// Adds a directed edge; validation happens in [`GraphBuilder::build`]
    pub fn add_edge(&mut self, from: usize, to: usize, weight: W) -> &mut Self {
        self.edges.push((from, to, weight));
        self
    }

    /// Adds an edge in both directions with the same weight
    pub fn add_undirected_edge(&mut self, a: usize, b: usize, weight: W) -> &mut Self {
        self.add_edge(a, b, weight).add_edge(b, a, weight)
    }

    pub fn build(self) -> Result<DirectedGraph<W>> {
        DirectedGraph::from_edges(self.node_count, self.edges)
    }
}
