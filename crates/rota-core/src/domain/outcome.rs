//! Outcome model: what a single `draw()` reports back to the caller.

use super::errors::StoreError;
use super::name::Name;
use super::record::DrawRecord;

/// Result of one draw.
///
/// Running out of names is not an error: it is reported as
/// `ExhaustedAndReset` after the store has been cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    /// A name was available, chosen, and persisted.
    Selected { name: Name, record: DrawRecord },

    /// Every roster name had been drawn; the store was cleared and no name
    /// is selected on this call.
    ExhaustedAndReset,

    /// The store could not be read or written. Nothing was persisted.
    Failed(StoreError),
}

impl DrawOutcome {
    pub fn is_selected(&self) -> bool {
        matches!(self, DrawOutcome::Selected { .. })
    }

    pub fn selected_name(&self) -> Option<&Name> {
        match self {
            DrawOutcome::Selected { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn record(&self) -> Option<&DrawRecord> {
        match self {
            DrawOutcome::Selected { record, .. } => Some(record),
            _ => None,
        }
    }
}
