//! Log commit and inventory reconciliation.
//!
//! Committing a visit appends exactly one [`LogEntry`] and decrements the
//! stock of every inventory item an applied adjustment matches. Both changes
//! land in a single new [`AppState`]; on error the input state is untouched.
//!
//! # Matching
//!
//! An adjustment matches an item when either lower-cased name contains the
//! other, so "Muriatic Acid" matches an item named "Acid". Only the first
//! match in stored order is considered, and it is only decremented when the
//! units are exactly equal. There is no unit conversion.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::PrecommitError;
use crate::models::{ChemicalAdjustment, ChemicalReading, InventoryItem, LogEntry, WaterEvents};
use crate::state::AppState;
use crate::types::{InventoryItemId, LogEntryId, PoolId, Quantity, UserId};

/// Everything needed to record one service visit.
#[derive(Debug, Clone)]
pub struct CommitRequest {
    /// Serviced pool.
    pub pool_id: PoolId,
    /// Acting user.
    pub user_id: Option<UserId>,
    /// Final test results.
    pub readings: ChemicalReading,
    /// Recommended adjustments followed by manual ones.
    pub adjustments: Vec<ChemicalAdjustment>,
    /// Water level changes.
    pub water_events: WaterEvents,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// What happened to the inventory for one adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Stock was decremented.
    Decremented {
        /// Matched item.
        item_id: InventoryItemId,
        /// Stock before.
        before: Quantity,
        /// Stock after, clamped at zero.
        after: Quantity,
    },
    /// An item matched by name but its unit differs.
    UnitMismatch {
        /// Matched item.
        item_id: InventoryItemId,
    },
    /// No item matched by name.
    NoMatch,
}

/// Result of a successful commit.
#[derive(Debug, Clone)]
pub struct Commit {
    /// The new snapshot.
    pub state: AppState,
    /// ID of the appended log entry.
    pub entry_id: LogEntryId,
    /// One outcome per adjustment, in order.
    pub outcomes: Vec<MatchOutcome>,
}

/// Case-insensitive bidirectional substring match.
#[must_use]
pub fn names_match(chemical_name: &str, item_name: &str) -> bool {
    let chemical = chemical_name.to_lowercase();
    let item = item_name.to_lowercase();
    chemical.contains(&item) || item.contains(&chemical)
}

/// Apply adjustments to a copy of the inventory.
///
/// Adjustments are applied in order, each against the stock left by the
/// previous ones.
#[must_use]
pub fn reconcile_inventory(
    inventory: &[InventoryItem],
    adjustments: &[ChemicalAdjustment],
) -> (Vec<InventoryItem>, Vec<MatchOutcome>) {
    let mut items = inventory.to_vec();
    let mut outcomes = Vec::with_capacity(adjustments.len());

    for adjustment in adjustments {
        let mut matches = items
            .iter_mut()
            .filter(|item| names_match(&adjustment.chemical_name, &item.name));

        let Some(item) = matches.next() else {
            outcomes.push(MatchOutcome::NoMatch);
            continue;
        };

        let others = matches.count();
        if others > 0 {
            debug!(
                chemical = %adjustment.chemical_name,
                chosen = %item.name,
                others,
                "Ambiguous inventory match, using first item"
            );
        }

        if item.unit != adjustment.unit {
            debug!(
                chemical = %adjustment.chemical_name,
                item = %item.name,
                adjustment_unit = %adjustment.unit,
                item_unit = %item.unit,
                "Unit mismatch, inventory unchanged"
            );
            outcomes.push(MatchOutcome::UnitMismatch {
                item_id: item.id.clone(),
            });
            continue;
        }

        let before = item.quantity;
        item.quantity = before.saturating_sub(adjustment.amount);
        outcomes.push(MatchOutcome::Decremented {
            item_id: item.id.clone(),
            before,
            after: item.quantity,
        });
    }

    (items, outcomes)
}

/// Record a visit and reconcile inventory in one state replacement.
///
/// # Errors
///
/// Returns `PrecommitError` if the acting user is missing or unknown, the
/// pool does not exist, the user is not allowed to service the pool, or a
/// reading is not a finite, non-negative number.
pub fn commit_log(
    state: &AppState,
    request: CommitRequest,
    now: DateTime<Utc>,
) -> Result<Commit, PrecommitError> {
    let user_id = request.user_id.ok_or(PrecommitError::MissingUser)?;
    let user = state
        .user(&user_id)
        .ok_or_else(|| PrecommitError::UnknownUser(user_id.clone()))?;

    if state.pool(&request.pool_id).is_none() {
        return Err(PrecommitError::UnknownPool(request.pool_id));
    }
    if !user.can_access(&request.pool_id) {
        return Err(PrecommitError::PoolAccessDenied {
            user: user_id,
            pool: request.pool_id,
        });
    }
    request.readings.validate()?;

    let (inventory, outcomes) = reconcile_inventory(&state.inventory, &request.adjustments);

    let entry = LogEntry {
        id: LogEntryId::generate(),
        pool_id: request.pool_id,
        timestamp: now,
        user: user.username.clone(),
        readings: request.readings,
        adjustments: request.adjustments,
        water_events: request.water_events,
        notes: request.notes.filter(|n| !n.trim().is_empty()),
    };
    let entry_id = entry.id.clone();

    let mut next = state.clone();
    next.inventory = inventory;
    next.logs.push(entry);
    next.revision += 1;

    Ok(Commit {
        state: next,
        entry_id,
        outcomes,
    })
}
