//! Chemical inventory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{InventoryItemId, Quantity};

/// Unit used when a new stock item does not name one.
pub const DEFAULT_UNIT: &str = "lbs";

/// A stocked chemical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Unique item ID.
    pub id: InventoryItemId,
    /// Product name, matched fuzzily against adjustment names.
    pub name: String,
    /// Stock on hand. Never negative.
    pub quantity: Quantity,
    /// Unit of measure, compared exactly against adjustment units.
    pub unit: String,
    /// Supplier name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    /// Supplier product page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_url: Option<String>,
    /// When stock was last purchased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_purchased: Option<DateTime<Utc>>,
    /// Reorder threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_threshold: Option<Quantity>,
}

impl InventoryItem {
    /// Returns `true` if a reorder threshold is set and stock is at or below it.
    #[must_use]
    pub fn is_low(&self) -> bool {
        self.min_threshold
            .is_some_and(|threshold| self.quantity <= threshold)
    }
}

/// Input for adding a stock item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewInventoryItem {
    /// Product name (required).
    pub name: String,
    /// Initial stock.
    pub quantity: Quantity,
    /// Unit; defaults to [`DEFAULT_UNIT`] when blank.
    pub unit: Option<String>,
    /// Supplier name.
    pub vendor: Option<String>,
    /// Supplier product page.
    pub vendor_url: Option<String>,
    /// Reorder threshold.
    pub min_threshold: Option<Quantity>,
}

impl NewInventoryItem {
    /// Build the stored item, stamping `last_purchased` with `now`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` if the name is blank.
    pub fn into_item(self, now: DateTime<Utc>) -> Result<InventoryItem, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField("item name"));
        }

        let unit = self
            .unit
            .map(|u| u.trim().to_owned())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_UNIT.to_owned());

        Ok(InventoryItem {
            id: InventoryItemId::generate(),
            name: name.to_owned(),
            quantity: self.quantity,
            unit,
            vendor: non_blank(self.vendor),
            vendor_url: non_blank(self.vendor_url),
            last_purchased: Some(now),
            min_threshold: self.min_threshold,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_item_defaults_unit() {
        let now = Utc::now();
        let item = NewInventoryItem {
            name: " Liquid Chlorine ".to_string(),
            quantity: Quantity::from_whole(4),
            vendor: Some(String::new()),
            ..Default::default()
        }
        .into_item(now)
        .expect("valid");

        assert_eq!(item.name, "Liquid Chlorine");
        assert_eq!(item.unit, DEFAULT_UNIT);
        assert_eq!(item.vendor, None);
        assert_eq!(item.last_purchased, Some(now));
    }

    #[test]
    fn test_into_item_requires_name() {
        let result = NewInventoryItem::default().into_item(Utc::now());
        assert_eq!(result, Err(ValidationError::MissingField("item name")));
    }

    #[test]
    fn test_is_low() {
        let mut item = NewInventoryItem {
            name: "Acid".to_string(),
            quantity: Quantity::from_whole(2),
            min_threshold: Some(Quantity::from_whole(2)),
            ..Default::default()
        }
        .into_item(Utc::now())
        .expect("valid");
        assert!(item.is_low());

        item.quantity = Quantity::from_whole(3);
        assert!(!item.is_low());

        item.min_threshold = None;
        assert!(!item.is_low());
    }
}
