//! Chemical adjustments.
//!
//! An adjustment either comes from the advisor's recommendation or was typed
//! in by the technician. Both share the same base shape; the origin is a
//! tagged variant rather than an ID naming convention.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{AdjustmentId, Quantity};

/// Reason recorded for manually entered adjustments.
pub const MANUAL_REASON: &str = "Manual Addition";

/// Where an adjustment came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdjustmentOrigin {
    /// Suggested by the chemistry advisor.
    Recommended,
    /// Entered by hand during the visit.
    Manual {
        /// Session-local ID, used to remove the entry before commit.
        id: AdjustmentId,
    },
}

/// A chemical addition, recommended or applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChemicalAdjustment {
    /// Origin of the adjustment.
    pub origin: AdjustmentOrigin,
    /// Chemical name, e.g. "Muriatic Acid".
    pub chemical_name: String,
    /// Amount to add.
    pub amount: Quantity,
    /// Unit of `amount`, e.g. "oz".
    pub unit: String,
    /// Why the chemical is added.
    pub reason: String,
}

impl ChemicalAdjustment {
    /// Create an advisor-sourced adjustment.
    #[must_use]
    pub fn recommended(
        chemical_name: impl Into<String>,
        amount: Quantity,
        unit: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            origin: AdjustmentOrigin::Recommended,
            chemical_name: chemical_name.into(),
            amount,
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    /// Create a manually entered adjustment with a fresh ID.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` if the chemical name or unit
    /// is blank or the amount is missing.
    pub fn manual(
        chemical_name: &str,
        amount: Option<Quantity>,
        unit: &str,
    ) -> Result<Self, ValidationError> {
        let chemical_name = chemical_name.trim();
        if chemical_name.is_empty() {
            return Err(ValidationError::MissingField("chemical name"));
        }
        let amount = amount.ok_or(ValidationError::MissingField("amount"))?;
        let unit = unit.trim();
        if unit.is_empty() {
            return Err(ValidationError::MissingField("unit"));
        }

        Ok(Self {
            origin: AdjustmentOrigin::Manual {
                id: AdjustmentId::generate(),
            },
            chemical_name: chemical_name.to_owned(),
            amount,
            unit: unit.to_owned(),
            reason: MANUAL_REASON.to_owned(),
        })
    }

    /// Returns the session-local ID of a manual adjustment.
    #[must_use]
    pub const fn manual_id(&self) -> Option<&AdjustmentId> {
        match &self.origin {
            AdjustmentOrigin::Manual { id } => Some(id),
            AdjustmentOrigin::Recommended => None,
        }
    }
}
