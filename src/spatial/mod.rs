//! Spatial indexing for O(log n) timeline hit testing.
//!
//! This module provides an R-tree based index over bucket spans for
//! point, range and nearest queries.

mod rtree;

pub use rtree::{BucketIndex, BucketRect};
