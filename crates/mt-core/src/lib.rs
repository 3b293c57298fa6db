//! Core domain logic for machine timelines.
//!
//! This crate contains:
//! - Interval algebra over instants and plant days
//! - Source slots and the merge/extension engine producing derived slots
//! - Projections: machine mode, running state, color
//! - Read-only collaborator traits (slot source, day summaries, mode catalog, day resolver)
//! - An in-memory timeline implementing every collaborator

pub mod clock;
pub mod day;
pub mod memory;
pub mod merge;
pub mod mode;
pub mod projection;
pub mod range;
pub mod slot;
pub mod source;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use day::{DayResolveError, DayResolver, PlantDayResolver};
pub use memory::MemoryTimeline;
pub use merge::{extend_left, extend_right, merge_slots};
pub use mode::{MachineMode, ModeCatalog};
pub use projection::{
    ColorProjection, ColorSlot, ColorValue, MachineModeProjection, MachineModeSlot,
    MachineModeValue, ReasonValue, RunningProjection, RunningSlot, RunningState, RunningStatus,
    SlotProjection, SubSlot,
};
pub use range::{DayRange, Interval, RangeError, TimeRange};
pub use slot::{DerivedSlot, SlotError, SlotValue, SourceSlot};
pub use source::{DaySummary, DaySummaryStore, SlotSource, SourceError, SourceResult};
pub use types::{MachineId, MachineModeId, ObservationStateId, ReasonId, ValidationError};
