//! Bucket Timeline - WASM Module
//!
//! This module provides hierarchical time-bucket aggregation for timeline
//! visualizations. It is compiled to WebAssembly and exposes a
//! JavaScript-friendly API via wasm-bindgen.
//!
//! # Architecture
//!
//! - `bucket`: Arena of leaf and group buckets linked by id
//! - `aggregation`: Leaf collection, granularities and the layer sweep
//! - `graph`: petgraph view of a bucket tree for rendering
//! - `spatial`: R-tree index over bucket spans for O(log n) hit testing
//! - `config`: Serializable timeline configuration

use js_sys::{Array, Function};
use petgraph::stable_graph::NodeIndex;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod aggregation;
pub mod bucket;
pub mod config;
pub mod error;
pub mod graph;
mod js;
pub mod spatial;

pub use aggregation::{
    aggregate, collect_leaves, BucketAggregator, Calendar, CalendarUnit, FixedStep, Granularity,
    TimeEntries, TimeEntry, TimeFrame, TimeSlice,
};
pub use bucket::{Bucket, BucketId, BucketMeta, BucketTree, GroupBucket, LayerStats, LeafBucket};
pub use config::{GranularitySpec, TimelineConfig};
pub use error::{TimelineError, TimelineResult};

use graph::BucketGraph;
use js::JsGranularity;
use spatial::BucketIndex;

/// Initialize the WASM module.
///
/// Routes panics and `tracing` events to the browser console. Safe to call
/// more than once.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    #[cfg(target_arch = "wasm32")]
    let _ = tracing_wasm::try_set_as_global_default();
}

/// Main entry point for timeline aggregation.
///
/// Holds the tree from the latest run together with its graph and spatial
/// views. Items are kept as the original JS values.
#[wasm_bindgen]
pub struct BucketTimelineWasm {
    config: TimelineConfig,
    tree: BucketTree<JsValue>,
    graph: BucketGraph,
    index: BucketIndex,
}

#[wasm_bindgen]
impl BucketTimelineWasm {
    /// Create a timeline.
    ///
    /// `config` may be omitted; see `TimelineConfig` for the accepted fields.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<BucketTimelineWasm, JsValue> {
        let config = if config.is_null() || config.is_undefined() {
            TimelineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|err| TimelineError::InvalidConfig(err.to_string()))?
        };
        config.validate()?;

        Ok(Self {
            config,
            tree: BucketTree::with_items(Vec::new()),
            graph: BucketGraph::new(),
            index: BucketIndex::new(),
        })
    }

    // =========================================================================
    // Aggregation
    // =========================================================================

    /// Build only the leaf layer.
    ///
    /// Returns the number of leaves.
    #[wasm_bindgen(js_name = collectLeaves)]
    pub fn collect_leaves(
        &mut self,
        items: Array,
        get_time_entry: &Function,
    ) -> Result<u32, JsValue> {
        let aggregator = self.config.aggregator()?;
        let tree =
            aggregator.try_collect_leaves(items.iter(), js::time_accessor(get_time_entry))?;
        self.install(tree);
        Ok(self.tree.leaf_ids().len() as u32)
    }

    /// Aggregate with the configured granularities.
    ///
    /// Returns the ids of every group, finest layer first.
    pub fn aggregate(&mut self, items: Array, get_time_entry: &Function) -> Result<Vec<u32>, JsValue> {
        let aggregator = self.config.aggregator()?;
        let granularities = self.config.build_granularities()?;
        let refs: Vec<&dyn Granularity> = granularities.iter().map(|g| g.as_ref()).collect();

        let tree =
            aggregator.try_aggregate(items.iter(), js::time_accessor(get_time_entry), &refs)?;
        self.install(tree);
        Ok(self.get_group_ids())
    }

    /// Aggregate with JS granularity functions.
    ///
    /// Each function receives `(min, max)` and returns the slices covering
    /// that range as `[start, end, label?]` or `{start, end, label?}`.
    #[wasm_bindgen(js_name = aggregateWith)]
    pub fn aggregate_with(
        &mut self,
        items: Array,
        get_time_entry: &Function,
        granularity_fns: Array,
    ) -> Result<Vec<u32>, JsValue> {
        let aggregator = self.config.aggregator()?;
        let granularities = granularity_fns
            .iter()
            .map(JsGranularity::from_js)
            .collect::<TimelineResult<Vec<_>>>()?;
        let refs: Vec<&dyn Granularity> = granularities
            .iter()
            .map(|g| g as &dyn Granularity)
            .collect();

        let tree =
            aggregator.try_aggregate(items.iter(), js::time_accessor(get_time_entry), &refs)?;
        if let Some(err) = granularities.iter().find_map(JsGranularity::take_error) {
            return Err(err.into());
        }
        self.install(tree);
        Ok(self.get_group_ids())
    }

    // =========================================================================
    // Tree Access
    // =========================================================================

    /// Get the total number of buckets (leaves and groups).
    #[wasm_bindgen(js_name = bucketCount)]
    pub fn bucket_count(&self) -> u32 {
        self.tree.len() as u32
    }

    /// Get the number of layers, leaves included.
    #[wasm_bindgen(js_name = layerCount)]
    pub fn layer_count(&self) -> u32 {
        self.tree.layer_count() as u32
    }

    /// Get the bucket ids of one layer in time order.
    #[wasm_bindgen(js_name = getLayer)]
    pub fn get_layer(&self, layer: u32) -> Vec<u32> {
        raw_ids(self.tree.layer(layer as usize))
    }

    #[wasm_bindgen(js_name = getGroupIds)]
    pub fn get_group_ids(&self) -> Vec<u32> {
        raw_ids(&self.tree.group_ids())
    }

    /// Get the ids of the coarsest non-empty layer.
    #[wasm_bindgen(js_name = getRootIds)]
    pub fn get_root_ids(&self) -> Vec<u32> {
        raw_ids(self.tree.roots())
    }

    /// Get a bucket as a plain JS object.
    #[wasm_bindgen(js_name = getBucket)]
    pub fn get_bucket(&self, id: u32) -> Result<JsValue, JsValue> {
        let bucket = self
            .tree
            .bucket(BucketId(id))
            .ok_or(TimelineError::UnknownBucket(id))?;
        let value = bucket
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(TimelineError::from)?;
        Ok(value)
    }

    /// Get the original items below a bucket, in time order.
    #[wasm_bindgen(js_name = getLeavesOf)]
    pub fn get_leaves_of(&self, id: u32) -> Result<Array, JsValue> {
        let id = BucketId(id);
        if self.tree.bucket(id).is_none() {
            return Err(TimelineError::UnknownBucket(id.raw()).into());
        }
        Ok(self.tree.leaves_of(id).into_iter().cloned().collect())
    }

    /// Per-layer sweep bookkeeping, one entry per granularity.
    #[wasm_bindgen(js_name = getLayerStats)]
    pub fn get_layer_stats(&self) -> Result<JsValue, JsValue> {
        let value = serde_wasm_bindgen::to_value(self.tree.layer_stats())
            .map_err(TimelineError::from)?;
        Ok(value)
    }

    // =========================================================================
    // Graph Access
    // =========================================================================

    /// Map a render node back to the bucket it displays.
    #[wasm_bindgen(js_name = getBucketForNode)]
    pub fn get_bucket_for_node(&self, node_index: u32) -> Option<u32> {
        self.graph
            .get_bucket(NodeIndex::new(node_index as usize))
            .map(BucketId::raw)
    }

    /// Get parent → child links as [parent0, child0, parent1, child1, ...].
    #[wasm_bindgen(js_name = getEdgePairs)]
    pub fn get_edge_pairs(&self) -> Vec<u32> {
        self.graph.edge_pairs()
    }

    /// Get the child lists in CSR format for GPU upload.
    ///
    /// Returns [offsets..., targets...] where offsets has bucketCount + 1 elements.
    #[wasm_bindgen(js_name = getChildrenCsr)]
    pub fn get_children_csr(&self) -> Vec<u32> {
        self.graph.children_csr()
    }

    // =========================================================================
    // Spatial Queries
    // =========================================================================

    /// Find the buckets of `layer` whose span contains `time`.
    #[wasm_bindgen(js_name = findBucketsAt)]
    pub fn find_buckets_at(&self, time: f64, layer: u32) -> Vec<u32> {
        raw_ids(&self.index.buckets_at(time as i64, layer))
    }

    /// Find all buckets, in any layer, overlapping `[start, end]`.
    #[wasm_bindgen(js_name = findBucketsInRange)]
    pub fn find_buckets_in_range(&self, start: f64, end: f64) -> Vec<u32> {
        let top = self.tree.layer_count().saturating_sub(1) as u32;
        raw_ids(&self.index.buckets_in_range(start as i64, end as i64, 0, top))
    }

    /// Find the bucket of `layer` closest to `time`.
    #[wasm_bindgen(js_name = findNearestBucket)]
    pub fn find_nearest_bucket(&self, time: f64, layer: u32) -> Option<u32> {
        self.index
            .nearest_in_layer(time as i64, layer)
            .map(BucketId::raw)
    }

    /// Drop the current tree and its views.
    pub fn clear(&mut self) {
        self.tree = BucketTree::with_items(Vec::new());
        self.graph.clear();
        self.index.clear();
    }
}

impl BucketTimelineWasm {
    fn install(&mut self, tree: BucketTree<JsValue>) {
        self.graph = BucketGraph::from_tree(&tree);
        self.index = BucketIndex::from_tree(&tree);
        if self.config.log_summary {
            log_summary(&tree);
        }
        self.tree = tree;
    }
}

fn raw_ids(ids: &[BucketId]) -> Vec<u32> {
    ids.iter().map(|id| id.raw()).collect()
}

fn log_summary<T>(tree: &BucketTree<T>) {
    web_sys::console::log_1(&JsValue::from_str(&format!(
        "bucket-timeline: {} items, {} leaves",
        tree.items().len(),
        tree.leaf_ids().len()
    )));
    for stats in tree.layer_stats() {
        web_sys::console::log_1(&JsValue::from_str(&format!(
            "bucket-timeline: layer {} slices={} claimed={} dropped={}",
            stats.layer, stats.slices, stats.claimed, stats.dropped
        )));
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    const MINUTE: i64 = 60_000;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;
    /// 2024-03-10T00:00:00Z
    const MARCH_10: i64 = 1_710_028_800_000;

    #[derive(Debug, Clone, PartialEq)]
    struct Event {
        name: &'static str,
        at: Option<i64>,
    }

    fn events() -> Vec<Event> {
        vec![
            Event { name: "deploy", at: Some(MARCH_10 + 9 * HOUR) },
            Event { name: "rollback", at: Some(MARCH_10 + 9 * HOUR + 20 * MINUTE) },
            Event { name: "draft", at: None },
            Event { name: "retro", at: Some(MARCH_10 + DAY + 14 * HOUR) },
            Event { name: "release", at: Some(MARCH_10 + 25 * DAY) },
        ]
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    }

    /// Test the full pipeline: config → tree → graph → spatial index.
    /// This mirrors what aggregate does, but without wasm_bindgen JS types.
    #[test]
    fn test_config_tree_graph_index() {
        init_tracing();

        let config = TimelineConfig {
            granularities: vec![GranularitySpec::Hour, GranularitySpec::Day, GranularitySpec::Month],
            ..Default::default()
        };
        let aggregator = config.aggregator().unwrap();
        let granularities = config.build_granularities().unwrap();
        let refs: Vec<&dyn Granularity> = granularities.iter().map(|g| g.as_ref()).collect();

        let tree = aggregator.aggregate(events(), |event: &Event| event.at, &refs);
        assert_eq!(tree.leaf_ids().len(), 4, "the undated event has no leaf");
        assert_eq!(tree.layer_count(), 4);

        let roots = tree.roots();
        let total: u64 = roots
            .iter()
            .map(|&id| tree.bucket(id).unwrap().aggregated_value())
            .sum();
        assert_eq!(total, 4, "every leaf should reach the month layer");

        let graph = BucketGraph::from_tree(&tree);
        assert_eq!(graph.node_count() as usize, tree.len());

        // Walking the graph from a root reaches the same items as the tree.
        let root = roots[0];
        let mut stack = vec![graph.node_for(root).unwrap()];
        let mut leaf_names = Vec::new();
        while let Some(node) = stack.pop() {
            let id = graph.get_bucket(node).unwrap();
            if let Some(leaf) = tree.bucket(id).and_then(Bucket::as_leaf) {
                leaf_names.push(tree.item(leaf).unwrap().name);
            }
            stack.extend(graph.children_of(node).into_iter().rev());
        }
        let expected: Vec<&str> = tree.leaves_of(root).iter().map(|event| event.name).collect();
        assert_eq!(leaf_names, expected);

        let index = BucketIndex::from_tree(&tree);
        assert_eq!(index.len(), tree.len());

        // The hour layer holds one bucket covering 09:00.
        let hits = index.buckets_at(MARCH_10 + 9 * HOUR + 30 * MINUTE, 1);
        assert_eq!(hits.len(), 1);
        let hour = tree.bucket(hits[0]).unwrap();
        assert_eq!(hour.aggregated_value(), 2);
        assert_eq!(hour.meta().label.as_deref(), Some("9:00"));

        let nearest = index.nearest_in_layer(MARCH_10 + 20 * DAY, 0).unwrap();
        let release = tree.bucket(nearest).and_then(Bucket::as_leaf).unwrap();
        assert_eq!(tree.item(release).unwrap().name, "release");
    }

    #[test]
    fn test_offset_config_shifts_labels() {
        let config = TimelineConfig {
            granularities: vec![GranularitySpec::Day],
            utc_offset_minutes: -5 * 60,
            ..Default::default()
        };
        let aggregator = config.aggregator().unwrap();
        let granularities = config.build_granularities().unwrap();
        let refs: Vec<&dyn Granularity> = granularities.iter().map(|g| g.as_ref()).collect();

        // 02:00 UTC on March 10 is still March 9 five hours west.
        let tree = aggregator.aggregate(vec![MARCH_10 + 2 * HOUR], |&t: &i64| Some(t), &refs);
        let leaf = tree.leaves().next().unwrap();
        assert_eq!(leaf.meta.label.as_deref(), Some("21:0"));

        let day = tree.bucket(tree.layer(1)[0]).unwrap();
        assert_eq!(day.meta().label.as_deref(), Some("2024-03-09"));
    }

    #[test]
    fn test_empty_run_has_empty_views() {
        let tree = aggregate(Vec::<i64>::new(), |&t| Some(t), &[]);
        let graph = BucketGraph::from_tree(&tree);
        let index = BucketIndex::from_tree(&tree);
        assert_eq!(graph.node_count(), 0);
        assert!(index.is_empty());
        assert!(graph.children_csr().iter().all(|&x| x == 0));
    }
}
