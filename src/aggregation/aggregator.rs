//! BucketAggregator - entry points for leaf collection and aggregation.
//!
//! Every call builds a fresh `BucketTree`; nothing is shared between runs.

use std::convert::Infallible;

use tracing::debug;

use super::granularity::Granularity;
use super::leaves;
use super::sweep;
use super::time::{TimeEntries, TimeFrame};
use crate::bucket::{BucketId, BucketTree, LayerStats};

/// Hierarchical time-bucket aggregator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketAggregator {
    frame: TimeFrame,
}

impl BucketAggregator {
    /// Create an aggregator computing labels and day boundaries in `frame`.
    pub fn new(frame: TimeFrame) -> Self {
        Self { frame }
    }

    /// Create an aggregator working in UTC.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> TimeFrame {
        self.frame
    }

    /// Turn items into a tree holding only the sorted leaf layer.
    pub fn collect_leaves<T, F, E>(
        &self,
        items: impl IntoIterator<Item = T>,
        mut get_time_entry: F,
    ) -> BucketTree<T>
    where
        F: FnMut(&T) -> Option<E>,
        E: Into<TimeEntries>,
    {
        match self.try_collect_leaves(items, |item| Ok::<_, Infallible>(get_time_entry(item))) {
            Ok(tree) => tree,
            Err(never) => match never {},
        }
    }

    /// `collect_leaves` with a fallible accessor; the first error aborts.
    pub fn try_collect_leaves<T, F, E, X>(
        &self,
        items: impl IntoIterator<Item = T>,
        get_time_entry: F,
    ) -> Result<BucketTree<T>, X>
    where
        F: FnMut(&T) -> Result<Option<E>, X>,
        E: Into<TimeEntries>,
    {
        leaves::collect(self.frame, items.into_iter().collect(), get_time_entry)
    }

    /// Collect leaves, then build one layer per granularity.
    ///
    /// All groups across layers are available through `BucketTree::groups`.
    pub fn aggregate<T, F, E>(
        &self,
        items: impl IntoIterator<Item = T>,
        get_time_entry: F,
        granularities: &[&dyn Granularity],
    ) -> BucketTree<T>
    where
        F: FnMut(&T) -> Option<E>,
        E: Into<TimeEntries>,
    {
        let mut tree = self.collect_leaves(items, get_time_entry);
        self.extend(&mut tree, granularities);
        tree
    }

    /// `aggregate` with a fallible accessor.
    pub fn try_aggregate<T, F, E, X>(
        &self,
        items: impl IntoIterator<Item = T>,
        get_time_entry: F,
        granularities: &[&dyn Granularity],
    ) -> Result<BucketTree<T>, X>
    where
        F: FnMut(&T) -> Result<Option<E>, X>,
        E: Into<TimeEntries>,
    {
        let mut tree = self.try_collect_leaves(items, get_time_entry)?;
        self.extend(&mut tree, granularities);
        Ok(tree)
    }

    /// Stack one layer per granularity on top of the tree's coarsest layer.
    ///
    /// Returns the ids of every group created, layer by layer. Once a layer
    /// comes out empty, the remaining granularities are not consulted and
    /// each gets an empty layer.
    pub fn extend<T>(
        &self,
        tree: &mut BucketTree<T>,
        granularities: &[&dyn Granularity],
    ) -> Vec<BucketId> {
        let mut created = Vec::new();
        for granularity in granularities {
            let layer = tree.layer_count() as u32;
            let input = tree.layer(layer.saturating_sub(1) as usize).to_vec();
            if input.is_empty() {
                debug!(layer, "previous layer is empty, skipping granularity");
                tree.push_layer(Vec::new());
                tree.push_stats(LayerStats {
                    layer,
                    ..LayerStats::default()
                });
                continue;
            }

            let (groups, stats) = sweep::build_layer(tree, layer, &input, *granularity);
            created.extend_from_slice(&groups);
            tree.push_layer(groups);
            tree.push_stats(stats);
        }
        created
    }
}

/// Leaves of `items` in UTC.
pub fn collect_leaves<T, F, E>(items: impl IntoIterator<Item = T>, get_time_entry: F) -> BucketTree<T>
where
    F: FnMut(&T) -> Option<E>,
    E: Into<TimeEntries>,
{
    BucketAggregator::with_defaults().collect_leaves(items, get_time_entry)
}

/// Full aggregation of `items` in UTC.
pub fn aggregate<T, F, E>(
    items: impl IntoIterator<Item = T>,
    get_time_entry: F,
    granularities: &[&dyn Granularity],
) -> BucketTree<T>
where
    F: FnMut(&T) -> Option<E>,
    E: Into<TimeEntries>,
{
    BucketAggregator::with_defaults().aggregate(items, get_time_entry, granularities)
}
