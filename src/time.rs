//! Temporal primitives shared by the whole planner.
//!
//! All timestamps are office-local `NaiveDateTime`s; the office timezone is
//! resolved by the data resolver before a state reaches the rule pipeline.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeWindow {
    /// Windows are stored as given. An inverted window is empty.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn on_date(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Self {
        Self::new(date.and_time(start), date.and_time(end))
    }

    /// Window that starts at `start` and lasts `duration`.
    pub fn starting_at(start: NaiveDateTime, duration: Duration) -> Self {
        Self::new(start, start + duration)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        if self.is_empty() {
            Duration::zero()
        } else {
            self.end - self.start
        }
    }

    pub fn total_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.start && instant < self.end
    }

    pub fn contains_window(&self, other: &TimeWindow) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Symmetric overlap test: either boundary of one window lies strictly
    /// inside the other window.
    ///
    /// Two identical windows do not overlap under this definition, and
    /// neither do windows that merely touch.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        let strictly_inside =
            |instant: NaiveDateTime, window: &TimeWindow| instant > window.start && instant < window.end;

        strictly_inside(self.start, other)
            || strictly_inside(self.end, other)
            || strictly_inside(other.start, self)
            || strictly_inside(other.end, self)
    }

    /// Moves the start earlier by `before` and the end later by `after`.
    pub fn widen(&self, before: Duration, after: Duration) -> Self {
        Self::new(self.start - before, self.end + after)
    }

    pub fn with_start(&self, start: NaiveDateTime) -> Self {
        Self::new(start, self.end)
    }

    pub fn with_end(&self, end: NaiveDateTime) -> Self {
        Self::new(self.start, end)
    }

    pub fn extend_end(&self, duration: Duration) -> Self {
        Self::new(self.start, self.end + duration)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Serializes a `chrono::Duration` as whole minutes.
pub mod serde_minutes {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(duration.num_minutes())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let minutes = i64::deserialize(deserializer)?;
        Ok(Duration::minutes(minutes))
    }
}
