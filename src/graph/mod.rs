//! Graph view of a bucket tree.
//!
//! Mirrors the parent/child links of a `BucketTree` in petgraph's
//! StableGraph so the renderer can address buckets by node index.

mod bucket_graph;

pub use bucket_graph::BucketGraph;
