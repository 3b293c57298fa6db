//! Interval algebra over instants and plant days.
//!
//! [`Interval`] models a possibly unbounded range with explicit inclusivity on
//! each side. A missing bound is -∞ (lower) or +∞ (upper); unbounded sides are
//! never inclusive. Two aliases cover the domain:
//!
//! - [`TimeRange`]: instants (`DateTime<Utc>`)
//! - [`DayRange`]: plant days (`NaiveDate`), kept in canonical `[first, end)` form
//!
//! Ordering helpers treat an unbounded lower as smaller than any instant and an
//! unbounded upper as larger than any instant. At equal instants an inclusive
//! lower starts earlier and an inclusive upper ends later.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors raised when constructing a range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// The lower bound lies after the upper bound.
    #[error("range lower bound {lower} is after upper bound {upper}")]
    Inverted { lower: String, upper: String },
}

/// A value usable as an interval bound.
pub trait Bound: Copy + Ord {
    /// Writes the bound in the notation used by [`Interval`]'s `Display`.
    fn fmt_bound(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl Bound for DateTime<Utc> {
    fn fmt_bound(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl Bound for NaiveDate {
    fn fmt_bound(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// A range between two optional bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Interval<T> {
    lower: Option<T>,
    upper: Option<T>,
    lower_inclusive: bool,
    upper_inclusive: bool,
}

/// A range of instants.
pub type TimeRange = Interval<DateTime<Utc>>;

/// A range of plant days.
pub type DayRange = Interval<NaiveDate>;

impl<T: Bound> Interval<T> {
    /// Creates a range, rejecting an inverted one.
    ///
    /// Inclusivity requested on an unbounded side is dropped.
    pub fn new(
        lower: Option<T>,
        upper: Option<T>,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> Result<Self, RangeError> {
        if let (Some(l), Some(u)) = (lower, upper) {
            if l > u {
                return Err(RangeError::Inverted {
                    lower: BoundDisplay(l).to_string(),
                    upper: BoundDisplay(u).to_string(),
                });
            }
        }
        Ok(Self {
            lower,
            upper,
            lower_inclusive: lower_inclusive && lower.is_some(),
            upper_inclusive: upper_inclusive && upper.is_some(),
        })
    }

    /// `[lower, upper)`
    pub fn closed_open(lower: T, upper: T) -> Result<Self, RangeError> {
        Self::new(Some(lower), Some(upper), true, false)
    }

    /// `[lower, upper]`
    pub fn closed(lower: T, upper: T) -> Result<Self, RangeError> {
        Self::new(Some(lower), Some(upper), true, true)
    }

    /// `[lower, +∞)`
    #[must_use]
    pub const fn at_least(lower: T) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
            lower_inclusive: true,
            upper_inclusive: false,
        }
    }

    /// `(-∞, upper)`
    #[must_use]
    pub const fn before(upper: T) -> Self {
        Self {
            lower: None,
            upper: Some(upper),
            lower_inclusive: false,
            upper_inclusive: false,
        }
    }

    /// `(-∞, +∞)`
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            lower: None,
            upper: None,
            lower_inclusive: false,
            upper_inclusive: false,
        }
    }

    /// `[at, at]`
    #[must_use]
    pub const fn point(at: T) -> Self {
        Self {
            lower: Some(at),
            upper: Some(at),
            lower_inclusive: true,
            upper_inclusive: true,
        }
    }

    /// An empty range anchored at `at`.
    #[must_use]
    pub const fn empty(at: T) -> Self {
        Self {
            lower: Some(at),
            upper: Some(at),
            lower_inclusive: false,
            upper_inclusive: false,
        }
    }

    pub const fn lower(&self) -> Option<T> {
        self.lower
    }

    pub const fn upper(&self) -> Option<T> {
        self.upper
    }

    pub const fn lower_inclusive(&self) -> bool {
        self.lower_inclusive
    }

    pub const fn upper_inclusive(&self) -> bool {
        self.upper_inclusive
    }

    pub const fn is_lower_unbounded(&self) -> bool {
        self.lower.is_none()
    }

    pub const fn is_upper_unbounded(&self) -> bool {
        self.upper.is_none()
    }

    /// Returns true if no value lies inside the range.
    pub fn is_empty(&self) -> bool {
        match (self.lower, self.upper) {
            (Some(l), Some(u)) => {
                l > u || (l == u && !(self.lower_inclusive && self.upper_inclusive))
            }
            _ => false,
        }
    }

    /// Returns true if `value` lies inside the range.
    pub fn contains(&self, value: T) -> bool {
        let above_lower = self
            .lower
            .is_none_or(|l| l < value || (l == value && self.lower_inclusive));
        let below_upper = self
            .upper
            .is_none_or(|u| value < u || (value == u && self.upper_inclusive));
        above_lower && below_upper
    }

    /// Returns the overlap of two ranges; empty when they do not overlap.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let (lower, lower_inclusive) = if cmp_lower(self, other) == Ordering::Less {
            (other.lower, other.lower_inclusive)
        } else {
            (self.lower, self.lower_inclusive)
        };
        let (upper, upper_inclusive) = if cmp_upper(self, other) == Ordering::Greater {
            (other.upper, other.upper_inclusive)
        } else {
            (self.upper, self.upper_inclusive)
        };
        if let (Some(l), Some(u)) = (lower, upper) {
            if l > u {
                return Self::empty(l);
            }
        }
        Self {
            lower,
            upper,
            lower_inclusive,
            upper_inclusive,
        }
    }

    /// Returns true if the two ranges share at least one value.
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Returns true if the ranges touch at a single boundary with no gap and
    /// no shared value.
    pub fn is_adjacent_to(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let touches = |left: &Self, right: &Self| match (left.upper, right.lower) {
            (Some(u), Some(l)) => u == l && left.upper_inclusive != right.lower_inclusive,
            _ => false,
        };
        touches(self, other) || touches(other, self)
    }

    /// Returns the smallest range covering both.
    ///
    /// Callers must only join overlapping or adjacent ranges. A disjoint pair
    /// still yields the hull (gap included) and is logged.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        if !self.overlaps(other) && !self.is_adjacent_to(other) {
            tracing::warn!(
                left = %self,
                right = %other,
                "union of disjoint ranges, returning the hull"
            );
        }
        let (lower, lower_inclusive) = if cmp_lower(self, other) == Ordering::Greater {
            (other.lower, other.lower_inclusive)
        } else {
            (self.lower, self.lower_inclusive)
        };
        let (upper, upper_inclusive) = if cmp_upper(self, other) == Ordering::Less {
            (other.upper, other.upper_inclusive)
        } else {
            (self.upper, self.upper_inclusive)
        };
        Self {
            lower,
            upper,
            lower_inclusive,
            upper_inclusive,
        }
    }

    /// Returns true if every value of `self` is before every value of `other`.
    pub fn is_strictly_left_of(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        match (self.upper, other.lower) {
            (Some(u), Some(l)) => {
                u < l || (u == l && !(self.upper_inclusive && other.lower_inclusive))
            }
            _ => false,
        }
    }

    /// Splits the range at `at` into the part before it and the part from it on.
    ///
    /// Either half may be empty.
    #[must_use]
    pub fn split_at(&self, at: T) -> (Self, Self) {
        (
            self.intersect(&Self::before(at)),
            self.intersect(&Self::at_least(at)),
        )
    }
}

impl TimeRange {
    /// The same range in `[lower, upper)` form.
    ///
    /// Only the endpoints change, so the duration is unaffected.
    #[must_use]
    pub const fn half_open(&self) -> Self {
        Self {
            lower: self.lower,
            upper: self.upper,
            lower_inclusive: self.lower.is_some(),
            upper_inclusive: false,
        }
    }

    /// Length of the range; `None` if a side is unbounded.
    pub fn duration(&self) -> Option<Duration> {
        if self.is_empty() {
            return Some(Duration::zero());
        }
        match (self.lower, self.upper) {
            (Some(l), Some(u)) => Some(u - l),
            _ => None,
        }
    }
}

impl DayRange {
    /// A range covering exactly one day.
    #[must_use]
    pub fn single(day: NaiveDate) -> Self {
        Self::at_least(day).canonical_upper(Some(day), true)
    }

    /// Rewrites the range in `[first, end)` form.
    ///
    /// Day ranges are discrete, so `(a, b]` and `[a+1, b+1)` denote the same days.
    #[must_use]
    pub fn canonical(self) -> Self {
        let (lower, lower_inclusive) = match self.lower {
            Some(l) if !self.lower_inclusive => (Some(l.succ_opt().unwrap_or(l)), true),
            other => (other, other.is_some()),
        };
        Self {
            lower,
            lower_inclusive,
            ..self
        }
        .canonical_upper(self.upper, self.upper_inclusive)
    }

    fn canonical_upper(self, upper: Option<NaiveDate>, inclusive: bool) -> Self {
        let upper = match upper {
            Some(u) if inclusive => Some(u.succ_opt().unwrap_or(u)),
            other => other,
        };
        Self {
            upper,
            upper_inclusive: false,
            ..self
        }
    }

    /// Number of days in the range; `None` if a side is unbounded.
    pub fn day_count(&self) -> Option<i64> {
        let canonical = self.canonical();
        if canonical.is_empty() {
            return Some(0);
        }
        match (canonical.lower, canonical.upper) {
            (Some(l), Some(u)) => Some((u - l).num_days()),
            _ => None,
        }
    }

    /// Iterates the days of a bounded range.
    pub fn days(&self) -> Option<impl Iterator<Item = NaiveDate>> {
        let canonical = self.canonical();
        let (first, end) = (canonical.lower?, canonical.upper?);
        Some(first.iter_days().take_while(move |day| *day < end))
    }
}

impl<T: Bound> fmt::Display for Interval<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("empty");
        }
        f.write_str(if self.lower_inclusive { "[" } else { "(" })?;
        if let Some(l) = self.lower {
            l.fmt_bound(f)?;
        }
        f.write_str(",")?;
        if let Some(u) = self.upper {
            u.fmt_bound(f)?;
        }
        f.write_str(if self.upper_inclusive { "]" } else { ")" })
    }
}

struct BoundDisplay<T>(T);

impl<T: Bound> fmt::Display for BoundDisplay<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_bound(f)
    }
}

fn cmp_lower<T: Ord>(a: &Interval<T>, b: &Interval<T>) -> Ordering {
    match (&a.lower, &b.lower) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(y).then_with(|| b.lower_inclusive.cmp(&a.lower_inclusive)),
    }
}

fn cmp_upper<T: Ord>(a: &Interval<T>, b: &Interval<T>) -> Ordering {
    match (&a.upper, &b.upper) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x.cmp(y).then_with(|| a.upper_inclusive.cmp(&b.upper_inclusive)),
    }
}
