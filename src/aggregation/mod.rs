//! Hierarchical time-bucket aggregation.
//!
//! Items are first turned into leaf buckets (one per instant, or one per
//! calendar day of an interval), sorted by time. Each granularity then
//! groups the previous layer into coarser time slices, producing a tree
//! whose group values count the leaves beneath them.

mod aggregator;
pub mod granularity;
mod leaves;
mod sweep;
pub mod time;

pub use aggregator::{aggregate, collect_leaves, BucketAggregator};
pub use granularity::{Calendar, CalendarUnit, FixedStep, Granularity, TimeSlice};
pub use time::{TimeEntries, TimeEntry, TimeFrame};
