//! Timeline configuration passed in from JavaScript.

use serde::{Deserialize, Serialize};

use crate::aggregation::{BucketAggregator, Calendar, CalendarUnit, FixedStep, Granularity, TimeFrame};
use crate::error::{TimelineError, TimelineResult};

/// Largest accepted UTC offset, in minutes.
const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

/// Serializable description of one aggregation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GranularitySpec {
    /// Equal-width slices starting at the earliest bucket.
    Fixed {
        #[serde(rename = "stepMs")]
        step_ms: i64,
    },
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl GranularitySpec {
    fn build(self, frame: TimeFrame) -> TimelineResult<Box<dyn Granularity>> {
        let unit = match self {
            GranularitySpec::Fixed { step_ms } => {
                return FixedStep::new(step_ms)
                    .map(|step| Box::new(step) as Box<dyn Granularity>)
                    .ok_or_else(|| {
                        TimelineError::InvalidConfig(format!(
                            "stepMs must be positive, got {step_ms}"
                        ))
                    });
            }
            GranularitySpec::Minute => CalendarUnit::Minute,
            GranularitySpec::Hour => CalendarUnit::Hour,
            GranularitySpec::Day => CalendarUnit::Day,
            GranularitySpec::Week => CalendarUnit::Week,
            GranularitySpec::Month => CalendarUnit::Month,
            GranularitySpec::Year => CalendarUnit::Year,
        };
        Ok(Box::new(Calendar::new(unit, frame)))
    }
}

/// Configuration for a timeline aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineConfig {
    /// Layers to build above the leaves, finest first.
    pub granularities: Vec<GranularitySpec>,
    /// Offset east of UTC used for labels and calendar boundaries.
    pub utc_offset_minutes: i32,
    /// Write a per-layer summary to the browser console.
    pub log_summary: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            granularities: vec![
                GranularitySpec::Day,
                GranularitySpec::Month,
                GranularitySpec::Year,
            ],
            utc_offset_minutes: 0,
            log_summary: false,
        }
    }
}

impl TimelineConfig {
    /// Check every field, reporting the first problem found.
    pub fn validate(&self) -> TimelineResult<()> {
        self.frame()?;
        for spec in &self.granularities {
            if let GranularitySpec::Fixed { step_ms } = spec {
                if *step_ms <= 0 {
                    return Err(TimelineError::InvalidConfig(format!(
                        "stepMs must be positive, got {step_ms}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn frame(&self) -> TimelineResult<TimeFrame> {
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(TimelineError::InvalidConfig(format!(
                "utcOffsetMinutes must be within ±{MAX_OFFSET_MINUTES}, got {}",
                self.utc_offset_minutes
            )));
        }
        TimeFrame::from_offset_minutes(self.utc_offset_minutes).ok_or_else(|| {
            TimelineError::InvalidConfig(format!(
                "unsupported utcOffsetMinutes {}",
                self.utc_offset_minutes
            ))
        })
    }

    pub fn aggregator(&self) -> TimelineResult<BucketAggregator> {
        Ok(BucketAggregator::new(self.frame()?))
    }

    /// Instantiate the configured granularities in order.
    pub fn build_granularities(&self) -> TimelineResult<Vec<Box<dyn Granularity>>> {
        let frame = self.frame()?;
        self.granularities
            .iter()
            .map(|spec| spec.build(frame))
            .collect()
    }
}
