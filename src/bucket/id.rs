//! Arena identifiers for buckets and the domain items they wrap.
//!
//! Buckets never hold references to each other. Parent and child links are
//! `BucketId`s into the owning `BucketTree`, and leaves point at their item
//! through an `ItemIndex`.

use std::fmt;

use serde::Serialize;

/// Stable bucket identifier.
///
/// Indexes the bucket arena of a single `BucketTree`. Ids are only meaningful
/// for the tree that produced them; a fresh aggregation starts again at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct BucketId(pub u32);

impl BucketId {
    /// Create a new BucketId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Position in the arena.
    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }

    /// Id for an arena position, `None` past `u32::MAX`.
    #[inline]
    pub(crate) fn from_slot(slot: usize) -> Option<Self> {
        u32::try_from(slot).ok().map(Self)
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bucket({})", self.0)
    }
}

impl From<u32> for BucketId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<BucketId> for u32 {
    #[inline]
    fn from(id: BucketId) -> Self {
        id.0
    }
}

/// Position of a domain item in the order it was handed to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemIndex(pub u32);

impl ItemIndex {
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Index for an input position, `None` past `u32::MAX`.
    #[inline]
    pub(crate) fn from_position(position: usize) -> Option<Self> {
        u32::try_from(position).ok().map(Self)
    }
}

impl fmt::Display for ItemIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Item({})", self.0)
    }
}
