//! Service visit log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ChemicalAdjustment, ChemicalReading};
use crate::types::{LogEntryId, PoolId, Username};

/// Water level changes made during a visit.
///
/// `drained_half` implies `drained`; use [`WaterEvents::new`] to keep the
/// flags consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WaterEvents {
    /// Fresh water was added.
    pub added: bool,
    /// Some water was drained.
    pub drained: bool,
    /// More than half of the water was drained and refilled.
    pub drained_half: bool,
}

impl WaterEvents {
    /// Build consistent flags. Draining more than half counts as draining.
    #[must_use]
    pub const fn new(added: bool, drained: bool, drained_half: bool) -> Self {
        Self {
            added,
            drained: drained || drained_half,
            drained_half,
        }
    }

    /// Returns `true` if no water change happened.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.added && !self.drained && !self.drained_half
    }
}

/// Immutable record of one service visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique entry ID.
    pub id: LogEntryId,
    /// Serviced pool. May dangle after the pool is deleted.
    pub pool_id: PoolId,
    /// When the entry was committed.
    pub timestamp: DateTime<Utc>,
    /// Who performed the visit.
    pub user: Username,
    /// Test results.
    pub readings: ChemicalReading,
    /// Chemicals actually applied.
    #[serde(default)]
    pub adjustments: Vec<ChemicalAdjustment>,
    /// Water level changes.
    #[serde(default)]
    pub water_events: WaterEvents,
    /// Free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drained_half_implies_drained() {
        let events = WaterEvents::new(false, false, true);
        assert!(events.drained);
        assert!(events.drained_half);
        assert!(!events.is_empty());
        assert!(WaterEvents::default().is_empty());
    }
}
