//! One pass of the multi-level aggregation sweep.
//!
//! Input buckets are sorted by start and slices arrive in chronological
//! order, so a single forward pass suffices. Two pointers delimit the
//! working window over the input: `cursor` admits every bucket starting
//! before the current slice's end, and `window_start` marks the first
//! bucket not yet resolved. Each slice resolves its whole window: buckets
//! fully inside the slice become its children, everything else is evicted.
//! Both pointers only move forward, so a pass is linear in
//! `input.len() + slices`.

use tracing::{debug, trace};

use super::granularity::Granularity;
use crate::bucket::{Bucket, BucketId, BucketMeta, BucketTree, GroupBucket, LayerStats};

/// Group `input` (the previous layer) into layer number `layer`.
///
/// Returns the new groups in slice order. `index_in_layer` is left unset;
/// the caller stamps it once the layer is complete.
pub(crate) fn build_layer<T>(
    tree: &mut BucketTree<T>,
    layer: u32,
    input: &[BucketId],
    granularity: &dyn Granularity,
) -> (Vec<BucketId>, LayerStats) {
    let mut stats = LayerStats {
        layer,
        ..LayerStats::default()
    };
    let (Some(&first), Some(&last)) = (input.first(), input.last()) else {
        return (Vec::new(), stats);
    };
    let min = tree.get(first).start();
    let max = tree.get(last).end();

    let mut output = Vec::new();
    let mut cursor = 0;
    let mut window_start = 0;

    for slice in granularity.slices(min, max) {
        while cursor < input.len() && tree.get(input[cursor]).start() < slice.end {
            cursor += 1;
        }

        let children: Vec<BucketId> = input[window_start..cursor]
            .iter()
            .copied()
            .filter(|&id| tree.get(id).meta().is_within(slice.start, slice.end))
            .collect();
        let evicted = (cursor - window_start) - children.len();
        window_start = cursor;

        let group = tree.push(Bucket::Group(GroupBucket {
            meta: BucketMeta::new(layer, slice.start, slice.end, slice.label),
            children: Vec::new(),
        }));

        let mut total = 0;
        for (index, &child) in children.iter().enumerate() {
            let meta = tree.bucket_mut(child).meta_mut();
            meta.parent = Some(group);
            meta.index = Some(index);
            total += meta.aggregated_value;
        }

        trace!(
            layer,
            start = slice.start,
            end = slice.end,
            children = children.len(),
            evicted,
            "slice built"
        );

        stats.claimed += children.len();
        if let Bucket::Group(built) = tree.bucket_mut(group) {
            built.meta.aggregated_value = total;
            built.children = children;
        }
        output.push(group);
    }

    stats.slices = output.len();
    stats.dropped = input.len() - stats.claimed;
    debug!(
        layer,
        input = input.len(),
        slices = stats.slices,
        claimed = stats.claimed,
        dropped = stats.dropped,
        "aggregation layer built"
    );
    (output, stats)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::aggregation::granularity::{FixedStep, TimeSlice};
    use crate::aggregation::leaves;
    use crate::aggregation::time::TimeFrame;

    fn leaf_tree(times: &[i64]) -> BucketTree<i64> {
        match leaves::collect(TimeFrame::utc(), times.to_vec(), |&t| {
            Ok::<_, Infallible>(Some(t))
        }) {
            Ok(tree) => tree,
            Err(never) => match never {},
        }
    }

    #[test]
    fn test_groups_contained_buckets() {
        let mut tree = leaf_tree(&[1_000, 2_000, 90_000]);
        let input = tree.leaf_ids().to_vec();
        let step = FixedStep::new(10_000).unwrap();

        let (groups, stats) = build_layer(&mut tree, 1, &input, &step);

        assert_eq!(groups.len(), 9);
        let first = tree.get(groups[0]);
        assert_eq!(first.children(), &input[..2]);
        assert_eq!(first.aggregated_value(), 2);
        let last = tree.get(groups[8]);
        assert_eq!(last.children(), &input[2..]);
        assert_eq!(stats.claimed, 3);
        assert_eq!(stats.dropped, 0);

        // Empty slices are still emitted.
        assert_eq!(tree.get(groups[4]).aggregated_value(), 0);
        assert!(tree.get(groups[4]).children().is_empty());
    }

    #[test]
    fn test_children_get_back_references() {
        let mut tree = leaf_tree(&[1, 2, 3]);
        let input = tree.leaf_ids().to_vec();
        let whole = |min: i64, max: i64| vec![TimeSlice::new(min, max + 1)];

        let (groups, _) = build_layer(&mut tree, 1, &input, &whole);

        for (index, &child) in input.iter().enumerate() {
            let meta = tree.get(child).meta();
            assert_eq!(meta.parent, Some(groups[0]));
            assert_eq!(meta.index, Some(index));
        }
        assert_eq!(tree.get(groups[0]).meta().index_in_layer, None);
    }

    #[test]
    fn test_bucket_at_last_slice_end_is_dropped() {
        // Buckets are admitted only while `start < slice.end`.
        let mut tree = leaf_tree(&[1, 2, 3]);
        let input = tree.leaf_ids().to_vec();
        let closed = |min: i64, max: i64| vec![TimeSlice::new(min, max)];

        let (groups, stats) = build_layer(&mut tree, 1, &input, &closed);

        assert_eq!(tree.get(groups[0]).children(), &input[..2]);
        assert_eq!(tree.get(groups[0]).aggregated_value(), 2);
        assert_eq!(tree.get(input[2]).parent(), None);
        assert_eq!(stats.claimed, 2);
        assert_eq!(stats.dropped, 1);
    }

    #[test]
    fn test_shared_boundary_goes_to_later_slice() {
        let mut tree = leaf_tree(&[0, 10]);
        let input = tree.leaf_ids().to_vec();
        let step = FixedStep::new(5).unwrap();

        let (groups, stats) = build_layer(&mut tree, 1, &input, &step);

        assert_eq!(groups.len(), 3);
        let boundary = tree.get(input[1]);
        assert_eq!(boundary.parent(), Some(groups[2]));
        assert_eq!(tree.get(groups[2]).start(), 10);
        assert_eq!(tree.get(groups[2]).end(), 15);
        assert!(tree.get(groups[1]).children().is_empty(), "[5, 10] gets nothing");
        assert_eq!(stats.dropped, 0);
    }

    #[test]
    fn test_spanning_bucket_is_dropped() {
        // A layer-1 group covering [0, 20] cannot fit a 15-wide slice grid.
        let mut tree = leaf_tree(&[0, 5, 20]);
        let input = tree.leaf_ids().to_vec();
        let wide = |_: i64, _: i64| vec![TimeSlice::new(0, 20)];
        let (layer1, _) = build_layer(&mut tree, 1, &input, &wide);
        tree.push_layer(layer1.clone());

        let narrow = FixedStep::new(15).unwrap();
        let (layer2, stats) = build_layer(&mut tree, 2, &layer1, &narrow);

        assert_eq!(layer2.len(), 2);
        assert!(layer2.iter().all(|&id| tree.get(id).children().is_empty()));
        assert_eq!(tree.get(layer1[0]).parent(), None);
        assert_eq!(stats.dropped, 1);
    }

    #[test]
    fn test_buckets_before_first_slice_are_evicted() {
        let mut tree = leaf_tree(&[0, 50, 60]);
        let input = tree.leaf_ids().to_vec();
        let late = |_: i64, _: i64| vec![TimeSlice::new(40, 100)];

        let (groups, stats) = build_layer(&mut tree, 1, &input, &late);

        assert_eq!(tree.get(groups[0]).children(), &input[1..]);
        assert_eq!(stats.dropped, 1);
        assert_eq!(tree.get(input[0]).parent(), None);
    }

    #[test]
    fn test_empty_input_builds_nothing() {
        let mut tree = leaf_tree(&[]);
        let step = FixedStep::new(10).unwrap();
        let (groups, stats) = build_layer(&mut tree, 1, &[], &step);
        assert!(groups.is_empty());
        assert_eq!(stats.slices, 0);
    }
}
