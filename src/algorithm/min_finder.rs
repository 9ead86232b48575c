//! Pluggable minimum selection over small candidate sets.
//!
//! A finder sees only the candidates it is handed: no graph, no distance array, no
//! frontier. Any implementation honouring the contract below can be swapped into the
//! engine without affecting correctness.

use std::fmt::Debug;

use crate::data_structures::BoundedHeap;
use crate::graph::Weight;

/// Selects minimum `(distance, node)` tuples.
///
/// Contract for every implementation:
/// - ties on distance go to the lowest node id, so results are reproducible;
/// - the candidate slice is never modified.
pub trait MinimumFinder<W>: Debug + Send + Sync
where
    W: Weight,
{
    /// Returns the smallest candidate, or `None` for an empty slice
    fn find_min(&self, candidates: &[(W, usize)]) -> Option<(W, usize)>;

    /// Returns the `k` smallest candidates in ascending order
    fn find_k_min(&self, candidates: &[(W, usize)], k: usize) -> Vec<(W, usize)>;

    /// Get the name of the strategy
    fn name(&self) -> &'static str;
}

/// O(n) scan for the minimum; selection plus a partial sort for k-minimum.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearScanFinder;

impl<W> MinimumFinder<W> for LinearScanFinder
where
    W: Weight,
{
    fn find_min(&self, candidates: &[(W, usize)]) -> Option<(W, usize)> {
        let mut best: Option<(W, usize)> = None;
        for &candidate in candidates {
            match best {
                Some(current) if current <= candidate => {}
                _ => best = Some(candidate),
            }
        }
        best
    }

    fn find_k_min(&self, candidates: &[(W, usize)], k: usize) -> Vec<(W, usize)> {
        if k == 0 || candidates.is_empty() {
            return Vec::new();
        }
        let mut scratch = candidates.to_vec();
        if k < scratch.len() {
            scratch.select_nth_unstable(k - 1);
            scratch.truncate(k);
        }
        scratch.sort_unstable();
        scratch
    }

    fn name(&self) -> &'static str {
        "linear-scan"
    }
}

/// Keeps a bounded max-heap of the best `k` seen so far; O(n log k).
#[derive(Debug, Default, Clone, Copy)]
pub struct BoundedHeapFinder;

impl<W> MinimumFinder<W> for BoundedHeapFinder
where
    W: Weight,
{
    fn find_min(&self, candidates: &[(W, usize)]) -> Option<(W, usize)> {
        self.find_k_min(candidates, 1).into_iter().next()
    }

    fn find_k_min(&self, candidates: &[(W, usize)], k: usize) -> Vec<(W, usize)> {
        let mut heap = BoundedHeap::new(k.min(candidates.len()));
        for &candidate in candidates {
            heap.push(candidate);
        }
        heap.into_sorted_vec()
    }

    fn name(&self) -> &'static str {
        "bounded-heap"
    }
}
