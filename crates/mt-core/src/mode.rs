//! Machine modes and their hierarchy.

use serde::{Deserialize, Serialize};

use crate::source::SourceResult;
use crate::types::MachineModeId;

/// Upper bound on parent links followed before giving up on a hierarchy walk.
const MAX_HIERARCHY_DEPTH: usize = 64;

/// A machine mode, optionally nested under a parent mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineMode {
    pub id: MachineModeId,
    pub name: String,
    /// Whether time spent in this mode counts as running.
    #[serde(default)]
    pub running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<MachineModeId>,
}

/// Lookup of machine modes by id.
pub trait ModeCatalog: Send + Sync {
    fn find_mode(&self, id: &MachineModeId) -> SourceResult<Option<MachineMode>>;
}

impl MachineMode {
    /// Returns true if this mode is `ancestor` or nested (at any depth) below it.
    pub fn is_descendant_or_self_of(
        &self,
        ancestor: &MachineModeId,
        catalog: &dyn ModeCatalog,
    ) -> SourceResult<bool> {
        let mut current = self.clone();
        for _ in 0..MAX_HIERARCHY_DEPTH {
            if &current.id == ancestor {
                return Ok(true);
            }
            let Some(parent_id) = current.parent.as_ref() else {
                return Ok(false);
            };
            if parent_id == ancestor {
                return Ok(true);
            }
            match catalog.find_mode(parent_id)? {
                Some(parent) => current = parent,
                None => {
                    tracing::warn!(mode = %current.id, parent = %parent_id, "unknown parent mode");
                    return Ok(false);
                }
            }
        }
        tracing::error!(mode = %self.id, "mode hierarchy too deep or cyclic");
        Ok(false)
    }
}
