//! Leaf extraction: domain items to sorted leaf buckets.

use tracing::warn;

use super::time::{TimeEntries, TimeEntry, TimeFrame};
use crate::bucket::{Bucket, BucketMeta, BucketTree, ItemIndex, LeafBucket};

/// A leaf before it gets its arena slot.
struct LeafDraft {
    at: i64,
    label: Option<String>,
    item: ItemIndex,
}

/// Build the leaf layer of a new tree.
///
/// Items whose accessor returns `None` contribute nothing. Leaves are sorted
/// by start (stable, so ties keep item order) and numbered in that order.
pub(crate) fn collect<T, F, E, X>(
    frame: TimeFrame,
    items: Vec<T>,
    mut get_time_entry: F,
) -> Result<BucketTree<T>, X>
where
    F: FnMut(&T) -> Result<Option<E>, X>,
    E: Into<TimeEntries>,
{
    let mut drafts = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let Some(entries) = get_time_entry(item)? else {
            continue;
        };
        let Some(index) = ItemIndex::from_position(position) else {
            warn!(position, "items past u32::MAX cannot be indexed, ignoring the rest");
            break;
        };
        for entry in entries.into().into_vec() {
            expand(frame, entry, index, &mut drafts);
        }
    }

    drafts.sort_by_key(|draft| draft.at);

    let mut tree = BucketTree::with_items(items);
    let ids = drafts
        .into_iter()
        .map(|draft| {
            let mut meta = BucketMeta::new(0, draft.at, draft.at, draft.label);
            meta.aggregated_value = 1;
            tree.push(Bucket::Leaf(LeafBucket {
                meta,
                item: draft.item,
            }))
        })
        .collect();
    tree.push_layer(ids);
    Ok(tree)
}

fn expand(frame: TimeFrame, entry: TimeEntry, item: ItemIndex, out: &mut Vec<LeafDraft>) {
    match entry {
        TimeEntry::Instant(at) => match frame.instant_label(at) {
            Some(label) => out.push(LeafDraft {
                at,
                label: Some(label),
                item,
            }),
            None => warn!(%item, timestamp = at, "dropping instant outside the calendar range"),
        },
        TimeEntry::Interval { start, end } => {
            let Some(label) = frame.range_label(start, end) else {
                warn!(%item, start, end, "dropping interval outside the calendar range");
                return;
            };
            // One leaf per calendar day, all carrying the whole range as label.
            out.extend(frame.days_between(start, end).into_iter().map(|day| LeafDraft {
                at: day,
                label: Some(label.clone()),
                item,
            }));
        }
    }
}
