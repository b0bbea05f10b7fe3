//! Recommendation parsing and validation.

use neupool_core::{ChemicalAdjustment, Quantity};
use serde::Deserialize;
use serde_json::Value;

use super::error::AdvisorError;

/// A validated advisor reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    /// Free-text summary of the water balance.
    pub analysis: String,
    /// Recommended adjustments, in the advisor's order.
    pub adjustments: Vec<ChemicalAdjustment>,
}

#[derive(Debug, Deserialize)]
struct RawRecommendation {
    analysis: String,
    adjustments: Vec<RawAdjustment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAdjustment {
    chemical_name: String,
    amount: f64,
    unit: String,
    reason: String,
}

impl Recommendation {
    /// Validate a reply payload.
    ///
    /// # Errors
    ///
    /// Returns `AdvisorError::InvalidRecommendation` if a field is missing or
    /// mistyped, a chemical name is blank, or an amount is negative or not
    /// finite.
    pub fn from_value(value: Value) -> Result<Self, AdvisorError> {
        let raw: RawRecommendation = serde_json::from_value(value)
            .map_err(|e| AdvisorError::InvalidRecommendation(e.to_string()))?;

        let adjustments = raw
            .adjustments
            .into_iter()
            .enumerate()
            .map(|(index, adj)| {
                let chemical_name = adj.chemical_name.trim();
                if chemical_name.is_empty() {
                    return Err(AdvisorError::InvalidRecommendation(format!(
                        "adjustment {index} has an empty chemicalName"
                    )));
                }
                let amount = Quantity::from_f64(adj.amount).map_err(|e| {
                    AdvisorError::InvalidRecommendation(format!(
                        "adjustment {index} ({chemical_name}): {e}"
                    ))
                })?;
                Ok(ChemicalAdjustment::recommended(
                    chemical_name,
                    amount,
                    adj.unit,
                    adj.reason,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            analysis: raw.analysis,
            adjustments,
        })
    }

    /// Parse a reply delivered as JSON text.
    ///
    /// Tolerates a surrounding Markdown code fence.
    ///
    /// # Errors
    ///
    /// Returns `AdvisorError::InvalidRecommendation` if the text is not JSON
    /// or fails validation.
    pub fn from_text(text: &str) -> Result<Self, AdvisorError> {
        let trimmed = text.trim();
        let body = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .and_then(|rest| rest.strip_suffix("```"))
            .unwrap_or(trimmed);

        let value: Value = serde_json::from_str(body.trim())
            .map_err(|e| AdvisorError::InvalidRecommendation(format!("not JSON: {e}")))?;
        Self::from_value(value)
    }
}
