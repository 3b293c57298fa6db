//! Read-only collaborators that supply timeline data.
//!
//! Implementations must give each call a consistent snapshot (one read-only
//! transaction per call). Nothing here retries; a failed read is reported to
//! the caller as a [`SourceError`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::range::{DayRange, TimeRange};
use crate::slot::SourceSlot;
use crate::types::{MachineId, MachineModeId};

/// A collaborator failed to answer a read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The backing store could not be read.
    #[error("{collaborator} unavailable: {message}")]
    Unavailable {
        collaborator: &'static str,
        message: String,
    },
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Access to the fine-grained slots recorded per machine.
pub trait SlotSource: Send + Sync {
    /// The slot covering `at`, if one was recorded.
    fn find_at(&self, machine: &MachineId, at: DateTime<Utc>) -> SourceResult<Option<SourceSlot>>;

    /// All slots overlapping `range`, in time order.
    fn find_all_overlapping(
        &self,
        machine: &MachineId,
        range: &TimeRange,
    ) -> SourceResult<Vec<SourceSlot>>;

    /// The slot whose range ends exactly at `at`.
    fn find_adjacent_ending_at(
        &self,
        machine: &MachineId,
        at: DateTime<Utc>,
    ) -> SourceResult<Option<SourceSlot>>;

    /// The slot whose range starts exactly at `at`.
    fn find_adjacent_starting_at(
        &self,
        machine: &MachineId,
        at: DateTime<Utc>,
    ) -> SourceResult<Option<SourceSlot>>;
}

/// Seconds spent in one machine mode during one plant day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub machine_mode: MachineModeId,
    pub day: NaiveDate,
    pub total_seconds: f64,
}

/// Pre-aggregated per-day, per-mode totals.
pub trait DaySummaryStore: Send + Sync {
    /// Summaries of `machine` for every day inside `days`.
    fn find_day_summaries(
        &self,
        machine: &MachineId,
        days: &DayRange,
    ) -> SourceResult<Vec<DaySummary>>;
}
