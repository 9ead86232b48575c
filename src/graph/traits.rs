use num_traits::Float;
use std::fmt::Debug;

/// Edge weight / distance type.
///
/// `Ord` gives the total order needed for deterministic tie-breaking, which is why
/// `ordered_float::OrderedFloat<f64>` is the canonical choice.
pub trait Weight: Float + Ord + Debug + Send + Sync + 'static {}

impl<T> Weight for T where T: Float + Ord + Debug + Send + Sync + 'static {}

/// Trait representing an immutable weighted directed graph
pub trait Graph<W>: Debug + Sync
where
    W: Weight,
{
    /// Returns the number of nodes in the graph
    fn node_count(&self) -> usize;

    /// Returns the number of edges in the graph
    fn edge_count(&self) -> usize;

    /// Returns an iterator over the outgoing edges `(target, weight)` of a node
    fn neighbors(&self, node: usize) -> Box<dyn Iterator<Item = (usize, W)> + '_>;

    /// Returns an iterator over the incoming edges `(source, weight)` of a node
    fn incoming(&self, node: usize) -> Box<dyn Iterator<Item = (usize, W)> + '_>;

    /// Returns true if the node exists in the graph
    fn has_node(&self, node: usize) -> bool {
        node < self.node_count()
    }

    /// Returns true if there's an edge between the two nodes
    fn has_edge(&self, from: usize, to: usize) -> bool {
        self.edge_weight(from, to).is_some()
    }

    /// Gets the lightest weight among parallel edges `from -> to`, if any exist
    fn edge_weight(&self, from: usize, to: usize) -> Option<W> {
        if !self.has_node(from) {
            return None;
        }
        self.neighbors(from)
            .filter(|(target, _)| *target == to)
            .map(|(_, weight)| weight)
            .min()
    }
}

/// View of a graph with every edge reversed.
///
/// Running a single-source search on the reversed graph yields distances *to* the
/// source in the original graph.
#[derive(Debug)]
pub struct Reversed<'a, G: ?Sized> {
    inner: &'a G,
}

impl<'a, G: ?Sized> Reversed<'a, G> {
    pub fn new(inner: &'a G) -> Self {
        Reversed { inner }
    }
}

impl<'a, W, G> Graph<W> for Reversed<'a, G>
where
    W: Weight,
    G: Graph<W> + ?Sized,
{
    fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    fn neighbors(&self, node: usize) -> Box<dyn Iterator<Item = (usize, W)> + '_> {
        self.inner.incoming(node)
    }

    fn incoming(&self, node: usize) -> Box<dyn Iterator<Item = (usize, W)> + '_> {
        self.inner.neighbors(node)
    }
}
