//! Display color view.

use serde::Serialize;

use super::SlotProjection;
use crate::slot::{DerivedSlot, SlotValue, SourceSlot};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColorValue {
    pub color: String,
    pub running: bool,
}

impl SlotValue for ColorValue {
    fn reference_equals(&self, other: &Self) -> bool {
        self == other
    }
}

pub type ColorSlot = DerivedSlot<ColorValue>;

/// Merges slots sharing color and running flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorProjection;

impl SlotProjection for ColorProjection {
    type Value = ColorValue;

    fn value_of(source: &SourceSlot) -> ColorValue {
        ColorValue {
            color: source.color.clone(),
            running: source.running,
        }
    }
}
