//! Granularities: how one aggregation layer slices the time axis.
//!
//! The sweep only ever asks a granularity for the slices covering
//! `[min, max]` and consumes them in order. Slices must be chronological
//! and must not overlap; the partitioning policy is entirely up to the
//! implementation. Any `Fn(i64, i64) -> impl IntoIterator<Item = TimeSlice>`
//! is a granularity.

use chrono::{Datelike, Days, Duration, Months, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::time::TimeFrame;

/// One slice `[start, end]` of the time axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlice {
    pub start: i64,
    pub end: i64,
    pub label: Option<String>,
}

impl TimeSlice {
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            label: None,
        }
    }

    pub fn labeled(start: i64, end: i64, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: Some(label.into()),
        }
    }
}

/// Partitions a time range into consecutive slices.
pub trait Granularity {
    /// Lazily produce the slices covering `[min, max]`.
    fn slices(&self, min: i64, max: i64) -> Box<dyn Iterator<Item = TimeSlice> + '_>;
}

impl<F, I> Granularity for F
where
    F: Fn(i64, i64) -> I,
    I: IntoIterator<Item = TimeSlice>,
    I::IntoIter: 'static,
{
    fn slices(&self, min: i64, max: i64) -> Box<dyn Iterator<Item = TimeSlice> + '_> {
        Box::new(self(min, max).into_iter())
    }
}

// =============================================================================
// Fixed step
// =============================================================================

/// Equal-width slices anchored at the first bucket's start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedStep {
    step_ms: i64,
}

impl FixedStep {
    /// `None` unless `step_ms` is positive.
    pub fn new(step_ms: i64) -> Option<Self> {
        (step_ms > 0).then_some(Self { step_ms })
    }

    pub fn step_ms(&self) -> i64 {
        self.step_ms
    }
}

impl Granularity for FixedStep {
    fn slices(&self, min: i64, max: i64) -> Box<dyn Iterator<Item = TimeSlice> + '_> {
        let step = self.step_ms;
        let starts = std::iter::successors(Some(min), move |&start| {
            start.checked_add(step).filter(|&next| next <= max)
        });
        Box::new(starts.map(move |start| TimeSlice::new(start, start.saturating_add(step))))
    }
}

// =============================================================================
// Calendar units
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalendarUnit {
    Minute,
    Hour,
    Day,
    /// ISO week, starting Monday.
    Week,
    Month,
    Year,
}

impl CalendarUnit {
    /// Start of the unit containing `at`.
    fn floor(self, at: NaiveDateTime) -> Option<NaiveDateTime> {
        let date = at.date();
        match self {
            CalendarUnit::Minute => date.and_hms_opt(at.hour(), at.minute(), 0),
            CalendarUnit::Hour => date.and_hms_opt(at.hour(), 0, 0),
            CalendarUnit::Day => date.and_hms_opt(0, 0, 0),
            CalendarUnit::Week => {
                let back = u64::from(date.weekday().num_days_from_monday());
                date.checked_sub_days(Days::new(back))?.and_hms_opt(0, 0, 0)
            }
            CalendarUnit::Month => date.with_day(1)?.and_hms_opt(0, 0, 0),
            CalendarUnit::Year => date.with_ordinal(1)?.and_hms_opt(0, 0, 0),
        }
    }

    /// Start of the following unit.
    fn advance(self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            CalendarUnit::Minute => start.checked_add_signed(Duration::minutes(1)),
            CalendarUnit::Hour => start.checked_add_signed(Duration::hours(1)),
            CalendarUnit::Day => start.checked_add_signed(Duration::days(1)),
            CalendarUnit::Week => start.checked_add_signed(Duration::days(7)),
            CalendarUnit::Month => start.checked_add_months(Months::new(1)),
            CalendarUnit::Year => start.checked_add_months(Months::new(12)),
        }
    }

    fn label(self, start: NaiveDateTime) -> String {
        match self {
            CalendarUnit::Minute => format!("{}:{}", start.hour(), start.minute()),
            CalendarUnit::Hour => format!("{}:00", start.hour()),
            CalendarUnit::Day => TimeFrame::date_label(start.date()),
            CalendarUnit::Week => TimeFrame::week_label(start.date()),
            CalendarUnit::Month => start.format("%Y-%m").to_string(),
            CalendarUnit::Year => start.format("%Y").to_string(),
        }
    }
}

/// Slices aligned to calendar boundaries in a fixed-offset frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    unit: CalendarUnit,
    frame: TimeFrame,
}

impl Calendar {
    pub fn new(unit: CalendarUnit, frame: TimeFrame) -> Self {
        Self { unit, frame }
    }

    pub fn utc(unit: CalendarUnit) -> Self {
        Self::new(unit, TimeFrame::utc())
    }

    pub fn unit(&self) -> CalendarUnit {
        self.unit
    }
}

impl Granularity for Calendar {
    fn slices(&self, min: i64, max: i64) -> Box<dyn Iterator<Item = TimeSlice> + '_> {
        let cursor = self
            .frame
            .local(min)
            .and_then(|local| self.unit.floor(local.naive_local()));
        Box::new(CalendarSlices {
            calendar: *self,
            cursor,
            max,
        })
    }
}

struct CalendarSlices {
    calendar: Calendar,
    cursor: Option<NaiveDateTime>,
    max: i64,
}

impl Iterator for CalendarSlices {
    type Item = TimeSlice;

    fn next(&mut self) -> Option<TimeSlice> {
        let Calendar { unit, frame } = self.calendar;
        let start = self.cursor.take()?;
        let start_ms = frame.timestamp_of(start)?;
        if start_ms > self.max {
            return None;
        }
        let next = unit.advance(start)?;
        let end_ms = frame.timestamp_of(next)?;
        self.cursor = Some(next);
        Some(TimeSlice::labeled(start_ms, end_ms, unit.label(start)))
    }
}
