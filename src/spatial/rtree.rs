//! R-tree based spatial index using the rstar crate.
//!
//! Buckets are indexed as rectangles on the timeline plane:
//! x spans `[start, end]`, y is the layer. Provides:
//! - Point hits (which bucket of a layer covers a time)
//! - Range queries (everything overlapping a time window)
//! - Nearest bucket within a layer

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::bucket::{BucketId, BucketTree};

/// A bucket's footprint on the timeline plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketRect {
    /// The bucket identifier.
    pub id: BucketId,
    /// Start time (ms).
    pub start: f64,
    /// End time (ms).
    pub end: f64,
    /// Layer as a y coordinate.
    pub layer: f64,
}

impl BucketRect {
    /// Create a new BucketRect.
    pub fn new(id: BucketId, start: i64, end: i64, layer: u32) -> Self {
        Self {
            id,
            start: start as f64,
            end: end as f64,
            layer: f64::from(layer),
        }
    }
}

impl RTreeObject for BucketRect {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.start, self.layer], [self.end, self.layer])
    }
}

impl PointDistance for BucketRect {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = (self.start - point[0]).max(point[0] - self.end).max(0.0);
        let dy = self.layer - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.start <= point[0] && point[0] <= self.end && self.layer == point[1]
    }
}

/// Spatial index over the buckets of one tree.
///
/// Uses an R*-tree for efficient timeline hit testing.
pub struct BucketIndex {
    tree: RTree<BucketRect>,
}

impl BucketIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk load every bucket of `tree`.
    pub fn from_tree<T>(tree: &BucketTree<T>) -> Self {
        let mut index = Self::new();
        index.rebuild(tree);
        index
    }

    /// Insert a single bucket footprint.
    pub fn insert(&mut self, rect: BucketRect) {
        self.tree.insert(rect);
    }

    /// Buckets of `layer` whose span contains `time`, ordered by id.
    ///
    /// Neighbouring slices share their boundary, so a time on a boundary
    /// hits both.
    pub fn buckets_at(&self, time: i64, layer: u32) -> Vec<BucketId> {
        let mut hits: Vec<BucketId> = self
            .tree
            .locate_all_at_point(&[time as f64, f64::from(layer)])
            .map(|rect| rect.id)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Buckets in layers `min_layer..=max_layer` overlapping `[start, end]`, ordered by id.
    pub fn buckets_in_range(
        &self,
        start: i64,
        end: i64,
        min_layer: u32,
        max_layer: u32,
    ) -> Vec<BucketId> {
        let envelope = AABB::from_corners(
            [start as f64, f64::from(min_layer)],
            [end as f64, f64::from(max_layer)],
        );
        let mut hits: Vec<BucketId> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|rect| rect.id)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Closest bucket of `layer` to `time`.
    pub fn nearest_in_layer(&self, time: i64, layer: u32) -> Option<BucketId> {
        let y = f64::from(layer);
        self.tree
            .nearest_neighbor_iter(&[time as f64, y])
            .find(|rect| rect.layer == y)
            .map(|rect| rect.id)
    }

    /// Rebuild the index from a tree.
    ///
    /// This is more efficient than incremental inserts for bulk updates.
    pub fn rebuild<T>(&mut self, tree: &BucketTree<T>) {
        let rects: Vec<_> = tree
            .buckets()
            .map(|(id, bucket)| BucketRect::new(id, bucket.start(), bucket.end(), bucket.layer()))
            .collect();

        self.tree = RTree::bulk_load(rects);
    }

    /// Clear all buckets from the index.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    /// Get the number of buckets in the index.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for BucketIndex {
    fn default() -> Self {
        Self::new()
    }
}
