//! Target chemistry ranges.
//!
//! Targets depend on the pool category and are handed to the advisor as part
//! of the request. They are not enforced locally: the advisor computes the
//! dosing.

use serde::Serialize;

use crate::models::ChemicalReading;
use crate::types::Category;

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl TargetRange {
    /// Create a range.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns `true` if `value` lies within the range (inclusive).
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl std::fmt::Display for TargetRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Category-dependent targets sent with an adjustment request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChemistryTargets {
    /// pH target.
    pub ph: TargetRange,
    /// Free chlorine target, ppm.
    pub free_chlorine: TargetRange,
    /// Total alkalinity target, ppm.
    pub total_alkalinity: TargetRange,
}

impl ChemistryTargets {
    /// Targets for the given category.
    ///
    /// Spas tolerate a wider pH band; chlorine and alkalinity targets are the
    /// same for both categories.
    #[must_use]
    pub const fn for_category(category: Category) -> Self {
        let ph = match category {
            Category::Spa => TargetRange::new(7.2, 7.8),
            Category::Pool => TargetRange::new(7.4, 7.6),
        };
        Self {
            ph,
            free_chlorine: TargetRange::new(3.0, 5.0),
            total_alkalinity: TargetRange::new(80.0, 120.0),
        }
    }
}

/// Acceptable bands used to flag a logged reading as out of range.
///
/// These are wider than the dosing targets and independent of category.
pub const ACCEPTABLE_PH: TargetRange = TargetRange::new(7.2, 7.8);
/// Acceptable free chlorine band, ppm.
pub const ACCEPTABLE_FREE_CHLORINE: TargetRange = TargetRange::new(1.0, 10.0);

/// Names of the readings that fall outside the acceptable bands.
#[must_use]
pub fn out_of_range(reading: &ChemicalReading) -> Vec<&'static str> {
    let mut flagged = Vec::new();
    if !ACCEPTABLE_PH.contains(reading.ph) {
        flagged.push("pH");
    }
    if !ACCEPTABLE_FREE_CHLORINE.contains(reading.free_chlorine) {
        flagged.push("free chlorine");
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spa_ph_range() {
        let targets = ChemistryTargets::for_category(Category::Spa);
        assert_eq!(targets.ph, TargetRange::new(7.2, 7.8));
    }

    #[test]
    fn test_pool_ph_range() {
        let targets = ChemistryTargets::for_category(Category::Pool);
        assert_eq!(targets.ph, TargetRange::new(7.4, 7.6));
    }

    #[test]
    fn test_shared_ranges() {
        for category in [Category::Pool, Category::Spa] {
            let targets = ChemistryTargets::for_category(category);
            assert_eq!(targets.free_chlorine, TargetRange::new(3.0, 5.0));
            assert_eq!(targets.total_alkalinity, TargetRange::new(80.0, 120.0));
        }
    }

    #[test]
    fn test_range_display() {
        assert_eq!(TargetRange::new(7.4, 7.6).to_string(), "7.4-7.6");
        assert_eq!(TargetRange::new(80.0, 120.0).to_string(), "80-120");
    }

    #[test]
    fn test_out_of_range() {
        let reading = ChemicalReading {
            ph: 8.1,
            free_chlorine: 0.5,
            total_alkalinity: 100.0,
            cyanuric_acid: 40.0,
            calcium_hardness: None,
            salt_level: None,
            temperature: None,
        };
        assert_eq!(out_of_range(&reading), vec!["pH", "free chlorine"]);
    }
}
