//! Bucket data structures.
//!
//! Buckets are stored in an arena (`BucketTree`) and linked by `BucketId`,
//! so the parent/child graph carries no reference cycles.

mod id;
mod tree;
mod types;

pub use id::{BucketId, ItemIndex};
pub use tree::{BucketTree, LayerStats};
pub use types::{Bucket, BucketMeta, GroupBucket, LeafBucket};
