use crate::graph::Weight;

/// Lifecycle of a node during a run. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Distance is still infinite
    Unvisited,
    /// Finite distance that may still improve
    Tentative,
    /// Optimal distance; never changes again
    Finalized,
}

/// Per-node tentative distances, predecessors and lifecycle states for one run.
///
/// Distances only ever decrease, and only through [`DistanceArray::relax`].
#[derive(Debug, Clone)]
pub struct DistanceArray<W>
where
    W: Weight,
{
    distances: Vec<W>,
    predecessors: Vec<Option<usize>>,
    states: Vec<NodeState>,
    finalized: usize,
    /// Every accepted update, in order, when recording is enabled
    update_log: Option<Vec<(usize, W)>>,
}

impl<W> DistanceArray<W>
where
    W: Weight,
{
    pub fn new(node_count: usize, record_updates: bool) -> Self {
        DistanceArray {
            distances: vec![W::infinity(); node_count],
            predecessors: vec![None; node_count],
            states: vec![NodeState::Unvisited; node_count],
            finalized: 0,
            update_log: record_updates.then(Vec::new),
        }
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Current distance of `node` (infinite while unvisited)
    #[inline]
    pub fn get(&self, node: usize) -> W {
        self.distances[node]
    }

    #[inline]
    pub fn state(&self, node: usize) -> NodeState {
        self.states[node]
    }

    #[inline]
    pub fn is_finalized(&self, node: usize) -> bool {
        self.states[node] == NodeState::Finalized
    }

    pub fn predecessor(&self, node: usize) -> Option<usize> {
        self.predecessors[node]
    }

    pub fn finalized_count(&self) -> usize {
        self.finalized
    }

    /// Lowers `node`'s distance to `candidate` if that is a strict improvement.
    ///
    /// Finalized nodes are never touched. Returns true if the update was applied.
    pub fn relax(&mut self, node: usize, candidate: W, predecessor: Option<usize>) -> bool {
        if self.states[node] == NodeState::Finalized || candidate >= self.distances[node] {
            return false;
        }
        self.distances[node] = candidate;
        self.predecessors[node] = predecessor;
        self.states[node] = NodeState::Tentative;
        if let Some(log) = self.update_log.as_mut() {
            log.push((node, candidate));
        }
        true
    }

    /// Marks a tentative node as finalized. Returns false if it was not tentative.
    pub fn finalize(&mut self, node: usize) -> bool {
        if self.states[node] != NodeState::Tentative {
            return false;
        }
        self.states[node] = NodeState::Finalized;
        self.finalized += 1;
        true
    }

    pub fn take_update_log(&mut self) -> Option<Vec<(usize, W)>> {
        self.update_log.take()
    }

    /// Splits into `(distances, predecessors, states)`
    pub fn into_parts(self) -> (Vec<W>, Vec<Option<usize>>, Vec<NodeState>) {
        (self.distances, self.predecessors, self.states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordered_float::OrderedFloat;

    #[test]
    fn relax_only_lowers() {
        let mut dist = DistanceArray::<OrderedFloat<f64>>::new(2, true);
        assert_eq!(dist.state(1), NodeState::Unvisited);
        assert!(dist.relax(1, OrderedFloat(5.0), Some(0)));
        assert!(!dist.relax(1, OrderedFloat(6.0), Some(0)));
        assert!(!dist.relax(1, OrderedFloat(5.0), Some(0)));
        assert!(dist.relax(1, OrderedFloat(4.0), None));
        assert_eq!(dist.get(1), OrderedFloat(4.0));
        assert_eq!(dist.predecessor(1), None);
        assert_eq!(
            dist.take_update_log().unwrap(),
            vec![(1, OrderedFloat(5.0)), (1, OrderedFloat(4.0))]
        );
    }

    #[test]
    fn finalized_nodes_are_frozen() {
        let mut dist = DistanceArray::<OrderedFloat<f64>>::new(2, false);
        assert!(!dist.finalize(0));
        dist.relax(0, OrderedFloat(0.0), None);
        assert!(dist.finalize(0));
        assert!(!dist.finalize(0));
        assert!(!dist.relax(0, OrderedFloat(-1.0), Some(1)));
        assert_eq!(dist.finalized_count(), 1);
        assert!(dist.take_update_log().is_none());
    }
}
