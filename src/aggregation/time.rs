//! Time entries and wall-clock helpers.
//!
//! Timestamps are `i64` milliseconds since the Unix epoch. Anything that
//! depends on the calendar (labels, day expansion, calendar granularities)
//! goes through a `TimeFrame`, which pins a fixed UTC offset so results do
//! not depend on the host's local zone.

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc,
};

/// One time point or span attached to a domain item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEntry {
    /// A single instant.
    Instant(i64),
    /// An inclusive span, expanded into one leaf per calendar day.
    Interval { start: i64, end: i64 },
}

impl From<i64> for TimeEntry {
    fn from(ms: i64) -> Self {
        TimeEntry::Instant(ms)
    }
}

/// What a time accessor returns for one item: a single entry or several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeEntries {
    One(TimeEntry),
    Many(Vec<TimeEntry>),
}

impl TimeEntries {
    pub fn into_vec(self) -> Vec<TimeEntry> {
        match self {
            TimeEntries::One(entry) => vec![entry],
            TimeEntries::Many(entries) => entries,
        }
    }
}

impl From<TimeEntry> for TimeEntries {
    fn from(entry: TimeEntry) -> Self {
        TimeEntries::One(entry)
    }
}

impl From<i64> for TimeEntries {
    fn from(ms: i64) -> Self {
        TimeEntries::One(TimeEntry::Instant(ms))
    }
}

impl From<Vec<TimeEntry>> for TimeEntries {
    fn from(entries: Vec<TimeEntry>) -> Self {
        TimeEntries::Many(entries)
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fixed-offset frame used for every calendar computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFrame {
    offset: FixedOffset,
}

impl Default for TimeFrame {
    fn default() -> Self {
        Self::utc()
    }
}

impl TimeFrame {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Frame `minutes` east of UTC. `None` if the offset is a day or more.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        let offset = FixedOffset::east_opt(minutes.checked_mul(60)?)?;
        Some(Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Wall-clock view of a timestamp, `None` outside chrono's range.
    pub fn local(&self, ms: i64) -> Option<DateTime<FixedOffset>> {
        DateTime::from_timestamp_millis(ms).map(|utc| utc.with_timezone(&self.offset))
    }

    /// Calendar date a timestamp falls on.
    pub fn date_of(&self, ms: i64) -> Option<NaiveDate> {
        self.local(ms).map(|local| local.date_naive())
    }

    /// Timestamp of a wall-clock time in this frame.
    pub fn timestamp_of(&self, naive: NaiveDateTime) -> Option<i64> {
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|local| local.timestamp_millis())
    }

    /// Timestamp of local midnight starting `date`.
    pub fn midnight(&self, date: NaiveDate) -> Option<i64> {
        self.timestamp_of(date.and_hms_opt(0, 0, 0)?)
    }

    /// `H:M` with no zero padding, e.g. `9:5`.
    pub fn instant_label(&self, ms: i64) -> Option<String> {
        self.local(ms)
            .map(|local| format!("{}:{}", local.hour(), local.minute()))
    }

    /// `YYYY-MM-DD - YYYY-MM-DD`.
    pub fn range_label(&self, start: i64, end: i64) -> Option<String> {
        let start = self.local(start)?;
        let end = self.local(end)?;
        Some(format!(
            "{} - {}",
            start.format(DATE_FORMAT),
            end.format(DATE_FORMAT)
        ))
    }

    /// `YYYY-MM-DD` of a calendar date.
    pub fn date_label(date: NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }

    /// Midnight timestamps of every calendar date touched by `[start, end]`.
    ///
    /// Empty when `end` falls on an earlier date than `start`.
    pub fn days_between(&self, start: i64, end: i64) -> Vec<i64> {
        let (Some(first), Some(last)) = (self.date_of(start), self.date_of(end)) else {
            return Vec::new();
        };
        first
            .iter_days()
            .take_while(|date| *date <= last)
            .filter_map(|date| self.midnight(date))
            .collect()
    }

    /// ISO week label, e.g. `2024-W07`.
    pub fn week_label(date: NaiveDate) -> String {
        let week = date.iso_week();
        format!("{}-W{:02}", week.year(), week.week())
    }
}
