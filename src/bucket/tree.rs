//! BucketTree - arena owning every bucket of one aggregation run.
//!
//! Buckets live in a single `Vec` and refer to each other by `BucketId`.
//! `layers[0]` holds the leaves in ascending start order; `layers[n]` holds
//! the groups produced by the n-th granularity in slice order. The tree also
//! owns the domain items so leaves can point at them by index.

use super::id::{BucketId, ItemIndex};
use super::types::{Bucket, GroupBucket, LeafBucket};

/// Bookkeeping from one pass of the aggregation sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStats {
    /// Layer that was built.
    pub layer: u32,
    /// Number of slices (and therefore groups) emitted.
    pub slices: usize,
    /// Buckets of the previous layer attached to some group.
    pub claimed: usize,
    /// Buckets of the previous layer left without a parent.
    pub dropped: usize,
}

/// Result of leaf collection and aggregation.
#[derive(Debug, Clone)]
pub struct BucketTree<T> {
    items: Vec<T>,
    buckets: Vec<Bucket>,
    layers: Vec<Vec<BucketId>>,
    stats: Vec<LayerStats>,
}

impl<T> BucketTree<T> {
    pub(crate) fn with_items(items: Vec<T>) -> Self {
        Self {
            items,
            buckets: Vec::new(),
            layers: Vec::new(),
            stats: Vec::new(),
        }
    }

    // =========================================================================
    // Construction (crate-internal)
    // =========================================================================

    /// # Panics
    ///
    /// If the arena already holds `u32::MAX + 1` buckets.
    pub(crate) fn push(&mut self, bucket: Bucket) -> BucketId {
        let Some(id) = BucketId::from_slot(self.buckets.len()) else {
            panic!("bucket arena is limited to {} buckets", u64::from(u32::MAX) + 1);
        };
        self.buckets.push(bucket);
        id
    }

    /// Lookup for ids this tree handed out.
    pub(crate) fn get(&self, id: BucketId) -> &Bucket {
        &self.buckets[id.slot()]
    }

    pub(crate) fn bucket_mut(&mut self, id: BucketId) -> &mut Bucket {
        &mut self.buckets[id.slot()]
    }

    /// Append a finished layer and stamp `index_in_layer` on its members.
    ///
    /// The first layer pushed is the leaf layer.
    pub(crate) fn push_layer(&mut self, ids: Vec<BucketId>) {
        for (position, &id) in ids.iter().enumerate() {
            self.buckets[id.slot()].meta_mut().index_in_layer = Some(position);
        }
        self.layers.push(ids);
    }

    pub(crate) fn push_stats(&mut self, stats: LayerStats) {
        self.stats.push(stats);
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Total number of buckets (leaves and groups).
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Get a bucket by id.
    pub fn bucket(&self, id: BucketId) -> Option<&Bucket> {
        self.buckets.get(id.slot())
    }

    /// All buckets in arena order.
    pub fn buckets(&self) -> impl Iterator<Item = (BucketId, &Bucket)> {
        self.buckets
            .iter()
            .enumerate()
            .map(|(slot, bucket)| (BucketId(slot as u32), bucket))
    }

    /// Number of layers, including the leaf layer.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Ids of one layer in `index_in_layer` order. Empty if out of range.
    pub fn layer(&self, layer: usize) -> &[BucketId] {
        self.layers.get(layer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Leaf ids sorted by start.
    pub fn leaf_ids(&self) -> &[BucketId] {
        self.layer(0)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &LeafBucket> {
        self.leaf_ids()
            .iter()
            .filter_map(|&id| self.bucket(id).and_then(Bucket::as_leaf))
    }

    /// Every group across all layers, in creation order.
    pub fn groups(&self) -> impl Iterator<Item = &GroupBucket> {
        self.buckets.iter().filter_map(Bucket::as_group)
    }

    pub fn group_ids(&self) -> Vec<BucketId> {
        self.buckets()
            .filter(|(_, bucket)| !bucket.is_leaf())
            .map(|(id, _)| id)
            .collect()
    }

    /// Buckets of the coarsest non-empty layer.
    pub fn roots(&self) -> &[BucketId] {
        self.layers
            .iter()
            .rev()
            .find(|layer| !layer.is_empty())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sweep statistics, one entry per aggregation layer.
    pub fn layer_stats(&self) -> &[LayerStats] {
        &self.stats
    }

    // =========================================================================
    // Items
    // =========================================================================

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Resolve a leaf's domain item.
    pub fn item(&self, leaf: &LeafBucket) -> Option<&T> {
        self.items.get(leaf.item.raw() as usize)
    }

    /// Items under a bucket in left-to-right (chronological) order.
    ///
    /// A leaf yields its own item. Unknown ids yield nothing.
    pub fn leaves_of(&self, id: BucketId) -> Vec<&T> {
        let mut items = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.bucket(current) {
                Some(Bucket::Leaf(leaf)) => items.extend(self.item(leaf)),
                Some(Bucket::Group(group)) => stack.extend(group.children.iter().rev()),
                None => {}
            }
        }
        items
    }

    /// Item indices under a bucket, same order as `leaves_of`.
    pub fn leaf_item_indices(&self, id: BucketId) -> Vec<ItemIndex> {
        let mut indices = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.bucket(current) {
                Some(Bucket::Leaf(leaf)) => indices.push(leaf.item),
                Some(Bucket::Group(group)) => stack.extend(group.children.iter().rev()),
                None => {}
            }
        }
        indices
    }
}
