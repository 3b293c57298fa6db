//! Plant day resolution.
//!
//! A plant day does not have to start at midnight: a site may run its day from
//! 06:00 to 06:00 local time. The [`DayResolver`] is authoritative for these
//! boundaries and for which days are processed (their summaries final). The
//! `resolve_*` methods never fail: when the resolver cannot answer they log an
//! error and fall back to the UTC calendar day.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use thiserror::Error;

use crate::range::{DayRange, TimeRange};

/// The resolver could not place an instant or a day.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DayResolveError {
    /// No plant day contains the instant.
    #[error("no plant day contains {at}")]
    Unresolvable { at: DateTime<Utc> },
    /// The start of a plant day cannot be expressed as an instant.
    #[error("plant day {day} has no start instant")]
    NoDayStart { day: NaiveDate },
}

/// Maps instants to plant days.
pub trait DayResolver: Send + Sync {
    /// The plant day containing `at`.
    fn day_containing(&self, at: DateTime<Utc>) -> Result<NaiveDate, DayResolveError>;

    /// The `[start, end)` instants of `day`.
    fn day_bounds(&self, day: NaiveDate) -> Result<TimeRange, DayResolveError>;

    /// The latest day boundary at or before `at` that closes a processed day.
    fn processed_day_boundary_at_or_before(
        &self,
        at: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, DayResolveError>;

    /// Like [`day_containing`](Self::day_containing), falling back to the UTC date.
    fn resolve_day(&self, at: DateTime<Utc>) -> NaiveDate {
        self.day_containing(at).unwrap_or_else(|e| {
            tracing::error!(%at, error = %e, "falling back to calendar day");
            at.date_naive()
        })
    }

    /// Like [`day_bounds`](Self::day_bounds), falling back to UTC midnights.
    fn resolve_day_bounds(&self, day: NaiveDate) -> TimeRange {
        self.day_bounds(day).unwrap_or_else(|e| {
            tracing::error!(%day, error = %e, "falling back to calendar day bounds");
            calendar_day_bounds(day)
        })
    }

    /// Like [`processed_day_boundary_at_or_before`](Self::processed_day_boundary_at_or_before),
    /// falling back to the preceding UTC midnight.
    fn resolve_processed_boundary(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        self.processed_day_boundary_at_or_before(at)
            .unwrap_or_else(|e| {
                tracing::error!(%at, error = %e, "falling back to calendar midnight");
                calendar_midnight(at.date_naive())
            })
    }

    /// Returns true if `at` is the first instant of a plant day.
    fn is_day_boundary(&self, at: DateTime<Utc>) -> bool {
        self.resolve_day_bounds(self.resolve_day(at)).lower() == Some(at)
    }

    /// The plant days touched by `range`, in `[first, end)` form.
    fn resolve_day_range(&self, range: &TimeRange) -> DayRange {
        if range.is_empty() {
            return range
                .lower()
                .map_or_else(DayRange::unbounded, |l| DayRange::empty(self.resolve_day(l)));
        }
        let lower = range.lower().map(|l| self.resolve_day(l));
        let upper = range.upper().map(|u| {
            let day = self.resolve_day(u);
            if !range.upper_inclusive() && self.is_day_boundary(u) {
                day
            } else {
                day.succ_opt().unwrap_or(day)
            }
        });
        DayRange::new(lower, upper, true, false).unwrap_or_else(|e| {
            tracing::error!(%range, error = %e, "day resolver is not monotonic");
            DayRange::unbounded()
        })
    }
}

fn calendar_midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn calendar_day_bounds(day: NaiveDate) -> TimeRange {
    let start = calendar_midnight(day);
    match day.succ_opt() {
        Some(next) => TimeRange::closed_open(start, calendar_midnight(next))
            .unwrap_or_else(|_| TimeRange::at_least(start)),
        None => TimeRange::at_least(start),
    }
}

/// Resolves plant days from a fixed UTC offset and a local day-start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlantDayResolver {
    utc_offset: FixedOffset,
    day_start: NaiveTime,
    last_processed_day: Option<NaiveDate>,
}

impl Default for PlantDayResolver {
    /// UTC calendar days, every elapsed day processed.
    fn default() -> Self {
        Self {
            utc_offset: Utc.fix(),
            day_start: NaiveTime::MIN,
            last_processed_day: None,
        }
    }
}

impl PlantDayResolver {
    pub const fn new(utc_offset: FixedOffset, day_start: NaiveTime) -> Self {
        Self {
            utc_offset,
            day_start,
            last_processed_day: None,
        }
    }

    /// Treats days after `day` as not yet processed.
    ///
    /// Without this, every day before the one containing the queried instant
    /// counts as processed.
    #[must_use]
    pub const fn with_last_processed_day(mut self, day: NaiveDate) -> Self {
        self.last_processed_day = Some(day);
        self
    }

    fn day_start_instant(&self, day: NaiveDate) -> Result<DateTime<Utc>, DayResolveError> {
        self.utc_offset
            .from_local_datetime(&day.and_time(self.day_start))
            .single()
            .map(|start| start.with_timezone(&Utc))
            .ok_or(DayResolveError::NoDayStart { day })
    }
}

impl DayResolver for PlantDayResolver {
    fn day_containing(&self, at: DateTime<Utc>) -> Result<NaiveDate, DayResolveError> {
        let local = at.with_timezone(&self.utc_offset).naive_local();
        local
            .checked_sub_signed(self.day_start - NaiveTime::MIN)
            .map(|shifted| shifted.date())
            .ok_or(DayResolveError::Unresolvable { at })
    }

    fn day_bounds(&self, day: NaiveDate) -> Result<TimeRange, DayResolveError> {
        let next = day.succ_opt().ok_or(DayResolveError::NoDayStart { day })?;
        let start = self.day_start_instant(day)?;
        let end = self.day_start_instant(next)?;
        TimeRange::closed_open(start, end).map_err(|_| DayResolveError::NoDayStart { day })
    }

    fn processed_day_boundary_at_or_before(
        &self,
        at: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, DayResolveError> {
        let start = self.day_start_instant(self.day_containing(at)?)?;
        match self.last_processed_day {
            Some(last) => {
                let first_open = last.succ_opt().ok_or(DayResolveError::NoDayStart { day: last })?;
                Ok(start.min(self.day_start_instant(first_open)?))
            }
            None => Ok(start),
        }
    }
}
