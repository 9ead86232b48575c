use std::collections::BTreeMap;

use crate::graph::Weight;
use crate::{Error, Result};

/// The set of tentative nodes, grouped into buckets of width Δ.
///
/// A node lives in bucket `⌊distance / Δ⌋`, always recomputed from the distance passed
/// in. Each node has at most one slot, so moving between buckets is an O(1) swap-remove
/// plus a push; locating the smallest non-empty bucket is a `BTreeMap` lookup over the
/// non-empty buckets only.
#[derive(Debug, Clone)]
pub struct BucketedFrontier<W>
where
    W: Weight,
{
    delta: W,
    /// Non-empty buckets only
    buckets: BTreeMap<usize, Vec<usize>>,
    /// node -> (bucket index, position inside that bucket)
    slots: Vec<Option<(usize, usize)>>,
    len: usize,
    /// Buckets below this index have been drained for good
    floor: usize,
}

impl<W> BucketedFrontier<W>
where
    W: Weight,
{
    /// Creates an empty frontier for `node_count` nodes. Δ must be positive and finite.
    pub fn new(node_count: usize, delta: W) -> Result<Self> {
        if !(delta.is_finite() && delta > W::zero()) {
            return Err(Error::InvalidConfig(format!(
                "bucket width must be positive and finite, got {:?}",
                delta
            )));
        }
        Ok(BucketedFrontier {
            delta,
            buckets: BTreeMap::new(),
            slots: vec![None; node_count],
            len: 0,
            floor: 0,
        })
    }

    pub fn delta(&self) -> W {
        self.delta
    }

    /// Bucket index for a distance. A quotient past `usize::MAX` saturates, so callers
    /// size Δ to keep every finite distance well below that.
    #[inline]
    pub fn bucket_index(&self, distance: W) -> usize {
        (distance / self.delta)
            .floor()
            .to_usize()
            .unwrap_or(usize::MAX)
    }

    /// Places `node` in the bucket for `distance`, removing it from its previous bucket.
    /// Returns the bucket index it now lives in.
    ///
    /// Rounding in `d + w` can compute an index below a bucket that was already
    /// cleared; such nodes land in the lowest bucket still open instead.
    pub fn insert_or_move(&mut self, node: usize, distance: W) -> usize {
        let target = self.bucket_index(distance).max(self.floor);

        if let Some((current, _)) = self.slots[node] {
            if current == target {
                return target;
            }
            self.detach(node);
        }

        let bucket = self.buckets.entry(target).or_default();
        bucket.push(node);
        self.slots[node] = Some((target, bucket.len() - 1));
        self.len += 1;
        target
    }

    fn detach(&mut self, node: usize) {
        let Some((index, position)) = self.slots[node].take() else {
            return;
        };
        let mut now_empty = false;
        if let Some(bucket) = self.buckets.get_mut(&index) {
            bucket.swap_remove(position);
            if let Some(&moved) = bucket.get(position) {
                self.slots[moved] = Some((index, position));
            }
            now_empty = bucket.is_empty();
        }
        if now_empty {
            self.buckets.remove(&index);
        }
        self.len -= 1;
    }

    /// Index of the lowest non-empty bucket
    pub fn min_bucket(&self) -> Option<usize> {
        self.buckets.keys().next().copied()
    }

    /// Returns the lowest non-empty bucket and a copy of its members.
    ///
    /// Membership is left intact; call [`BucketedFrontier::clear_bucket`] once the bucket
    /// has been fully drained.
    pub fn extract_min_bucket(&self) -> Option<(usize, Vec<usize>)> {
        self.buckets
            .iter()
            .next()
            .map(|(&index, members)| (index, members.clone()))
    }

    /// Current members of bucket `index`
    pub fn members(&self, index: usize) -> &[usize] {
        self.buckets.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Removes every member of bucket `index` and returns them. No later insert may
    /// target this bucket or any lower one.
    pub fn clear_bucket(&mut self, index: usize) -> Vec<usize> {
        let members = self.buckets.remove(&index).unwrap_or_default();
        for &node in &members {
            self.slots[node] = None;
        }
        self.len -= members.len();
        self.floor = self.floor.max(index.saturating_add(1));
        members
    }

    /// Bucket currently holding `node`, if any
    pub fn bucket_of(&self, node: usize) -> Option<usize> {
        self.slots.get(node).copied().flatten().map(|(index, _)| index)
    }

    pub fn contains(&self, node: usize) -> bool {
        self.bucket_of(node).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of non-empty buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
