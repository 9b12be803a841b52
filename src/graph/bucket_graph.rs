//! BucketGraph - petgraph view of a bucket tree for the rendering layer.
//!
//! The renderer works on graph nodes (bars) and edges (parent to child
//! connectors). Each node's weight is the `BucketId` it displays, so going
//! from a visual node back to its bucket is a plain weight lookup. Edge
//! weights hold the child's position within its parent.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences, NodeIndexable};
use petgraph::{Directed, Direction};

use crate::bucket::{BucketId, BucketTree};

/// Directed parent → child graph over the buckets of one tree.
pub struct BucketGraph {
    /// Nodes store their BucketId, edges store the child's index in its parent.
    graph: StableGraph<BucketId, u32, Directed>,

    /// Map from BucketId to petgraph NodeIndex
    bucket_to_node: HashMap<BucketId, NodeIndex>,
}

impl BucketGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            bucket_to_node: HashMap::new(),
        }
    }

    /// Mirror every bucket of `tree` as a node, and every parent link as an edge.
    ///
    /// Nodes are added in arena order, edges in child order.
    pub fn from_tree<T>(tree: &BucketTree<T>) -> Self {
        let edge_capacity = tree.len().saturating_sub(tree.roots().len());
        let mut graph = StableGraph::with_capacity(tree.len(), edge_capacity);
        let mut bucket_to_node = HashMap::with_capacity(tree.len());

        for (id, _) in tree.buckets() {
            bucket_to_node.insert(id, graph.add_node(id));
        }
        for (id, bucket) in tree.buckets() {
            let parent = bucket_to_node[&id];
            for (index, child) in bucket.children().iter().enumerate() {
                graph.add_edge(parent, bucket_to_node[child], index as u32);
            }
        }

        Self {
            graph,
            bucket_to_node,
        }
    }

    pub fn node_count(&self) -> u32 {
        self.graph.node_count() as u32
    }

    pub fn edge_count(&self) -> u32 {
        self.graph.edge_count() as u32
    }

    /// The bucket a visual node stands for.
    pub fn get_bucket(&self, node: NodeIndex) -> Option<BucketId> {
        self.graph.node_weight(node).copied()
    }

    /// The visual node of a bucket.
    pub fn node_for(&self, id: BucketId) -> Option<NodeIndex> {
        self.bucket_to_node.get(&id).copied()
    }

    /// Child nodes in chronological order.
    pub fn children_of(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<(u32, NodeIndex)> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| (*edge.weight(), edge.target()))
            .collect();
        children.sort_unstable_by_key(|&(index, _)| index);
        children.into_iter().map(|(_, child)| child).collect()
    }

    pub fn parent_of(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(node, Direction::Incoming)
            .next()
    }

    /// Flat `[parent0, child0, parent1, child1, ...]` bucket id pairs.
    pub fn edge_pairs(&self) -> Vec<u32> {
        let mut pairs = Vec::with_capacity(self.graph.edge_count() * 2);
        for edge in self.graph.edge_references() {
            pairs.push(self.graph[edge.source()].raw());
            pairs.push(self.graph[edge.target()].raw());
        }
        pairs
    }

    /// Children in CSR format.
    ///
    /// Returns [offsets..., targets...] where offsets has node_bound + 1 elements.
    pub fn children_csr(&self) -> Vec<u32> {
        let node_bound = self.graph.node_bound();
        let mut offsets = vec![0u32; node_bound + 1];
        let mut targets = vec![0u32; self.graph.edge_count()];

        for edge in self.graph.edge_references() {
            offsets[edge.source().index() + 1] += 1;
        }
        for i in 1..=node_bound {
            offsets[i] += offsets[i - 1];
        }

        // Edges were inserted in child order, so targets stay chronological.
        let mut current_offsets = offsets[..node_bound].to_vec();
        for edge in self.graph.edge_references() {
            let source = edge.source().index();
            targets[current_offsets[source] as usize] = edge.target().index() as u32;
            current_offsets[source] += 1;
        }

        let mut result = Vec::with_capacity(offsets.len() + targets.len());
        result.extend(offsets);
        result.extend(targets);
        result
    }

    /// Remove all nodes and edges.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.bucket_to_node.clear();
    }
}

impl Default for BucketGraph {
    fn default() -> Self {
        Self::new()
    }
}
