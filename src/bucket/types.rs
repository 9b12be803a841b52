//! Bucket variants.
//!
//! A bucket is either a leaf (one domain item at one point in time) or a group
//! (the buckets of the previous layer that fall inside one time slice). Both
//! share a `BucketMeta` header.

use serde::Serialize;

use super::id::{BucketId, ItemIndex};

/// Fields common to leaves and groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketMeta {
    /// 0 for leaves, `n` for the layer built by the n-th granularity.
    pub layer: u32,
    /// Position among the buckets of the same layer. `None` until the whole
    /// layer has been built.
    pub index_in_layer: Option<usize>,
    /// Inclusive start, milliseconds since the Unix epoch.
    pub start: i64,
    /// Inclusive end, milliseconds since the Unix epoch.
    pub end: i64,
    pub label: Option<String>,
    /// 1 for a leaf, the sum over the children for a group.
    pub aggregated_value: u64,
    /// Group this bucket was attached to, if any.
    pub parent: Option<BucketId>,
    /// Position within the parent's children.
    pub index: Option<usize>,
}

impl BucketMeta {
    pub(crate) fn new(layer: u32, start: i64, end: i64, label: Option<String>) -> Self {
        Self {
            layer,
            index_in_layer: None,
            start,
            end,
            label,
            aggregated_value: 0,
            parent: None,
            index: None,
        }
    }

    /// Whether `[start, end]` lies entirely inside `[slice_start, slice_end]`.
    #[inline]
    pub fn is_within(&self, slice_start: i64, slice_end: i64) -> bool {
        slice_start <= self.start && self.end <= slice_end
    }
}

/// A bucket wrapping one domain item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafBucket {
    #[serde(flatten)]
    pub meta: BucketMeta,
    /// The item this leaf was extracted from, resolved through `BucketTree::item`.
    pub item: ItemIndex,
}

/// A bucket aggregating the previous layer over one time slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBucket {
    #[serde(flatten)]
    pub meta: BucketMeta,
    /// Children in chronological order.
    pub children: Vec<BucketId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Bucket {
    Leaf(LeafBucket),
    Group(GroupBucket),
}

impl Bucket {
    #[inline]
    pub fn meta(&self) -> &BucketMeta {
        match self {
            Bucket::Leaf(leaf) => &leaf.meta,
            Bucket::Group(group) => &group.meta,
        }
    }

    #[inline]
    pub(crate) fn meta_mut(&mut self) -> &mut BucketMeta {
        match self {
            Bucket::Leaf(leaf) => &mut leaf.meta,
            Bucket::Group(group) => &mut group.meta,
        }
    }

    #[inline]
    pub fn start(&self) -> i64 {
        self.meta().start
    }

    #[inline]
    pub fn end(&self) -> i64 {
        self.meta().end
    }

    #[inline]
    pub fn layer(&self) -> u32 {
        self.meta().layer
    }

    #[inline]
    pub fn aggregated_value(&self) -> u64 {
        self.meta().aggregated_value
    }

    #[inline]
    pub fn parent(&self) -> Option<BucketId> {
        self.meta().parent
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Bucket::Leaf(_))
    }

    pub fn as_group(&self) -> Option<&GroupBucket> {
        match self {
            Bucket::Group(group) => Some(group),
            Bucket::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafBucket> {
        match self {
            Bucket::Leaf(leaf) => Some(leaf),
            Bucket::Group(_) => None,
        }
    }

    /// Children ids; empty for leaves.
    pub fn children(&self) -> &[BucketId] {
        match self {
            Bucket::Group(group) => &group.children,
            Bucket::Leaf(_) => &[],
        }
    }
}
