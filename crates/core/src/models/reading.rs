//! Water test readings.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::SanitizerType;

/// One set of water test results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalReading {
    /// pH.
    pub ph: f64,
    /// Free chlorine, ppm.
    pub free_chlorine: f64,
    /// Total alkalinity, ppm.
    pub total_alkalinity: f64,
    /// Cyanuric acid (stabilizer), ppm.
    pub cyanuric_acid: f64,
    /// Calcium hardness, ppm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calcium_hardness: Option<f64>,
    /// Salt level, ppm. Only meaningful for salt systems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt_level: Option<f64>,
    /// Water temperature, Fahrenheit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl ChemicalReading {
    /// Drop fields that do not apply to the given sanitizer system.
    ///
    /// Salt level is discarded for chlorine pools.
    #[must_use]
    pub fn for_sanitizer(mut self, sanitizer: SanitizerType) -> Self {
        if sanitizer != SanitizerType::Salt {
            self.salt_level = None;
        }
        self
    }

    /// Check that every recorded value is a finite, non-negative number.
    ///
    /// JSON has no representation for NaN or infinity, so such a reading
    /// could not be persisted faithfully.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidReading` naming the first bad field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("pH", Some(self.ph)),
            ("free chlorine", Some(self.free_chlorine)),
            ("total alkalinity", Some(self.total_alkalinity)),
            ("cyanuric acid", Some(self.cyanuric_acid)),
            ("calcium hardness", self.calcium_hardness),
            ("salt level", self.salt_level),
            ("temperature", self.temperature),
        ];
        match fields
            .into_iter()
            .find(|(_, value)| value.is_some_and(|v| !v.is_finite() || v < 0.0))
        {
            Some((field, _)) => Err(ValidationError::InvalidReading(field)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> ChemicalReading {
        ChemicalReading {
            ph: 7.4,
            free_chlorine: 3.0,
            total_alkalinity: 100.0,
            cyanuric_acid: 50.0,
            calcium_hardness: None,
            salt_level: Some(3200.0),
            temperature: None,
        }
    }

    #[test]
    fn test_salt_dropped_for_chlorine() {
        assert_eq!(reading().for_sanitizer(SanitizerType::Chlorine).salt_level, None);
        assert_eq!(
            reading().for_sanitizer(SanitizerType::Salt).salt_level,
            Some(3200.0)
        );
    }

    #[test]
    fn test_validate_accepts_plain_reading() {
        assert_eq!(reading().validate(), Ok(()));
        let cold = ChemicalReading {
            temperature: Some(0.0),
            ..reading()
        };
        assert_eq!(cold.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_non_finite_and_negative() {
        let nan = ChemicalReading {
            ph: f64::NAN,
            ..reading()
        };
        assert_eq!(nan.validate(), Err(ValidationError::InvalidReading("pH")));

        let inf = ChemicalReading {
            salt_level: Some(f64::INFINITY),
            ..reading()
        };
        assert_eq!(
            inf.validate(),
            Err(ValidationError::InvalidReading("salt level"))
        );

        let negative = ChemicalReading {
            free_chlorine: -1.0,
            ..reading()
        };
        assert_eq!(
            negative.validate(),
            Err(ValidationError::InvalidReading("free chlorine"))
        );
    }

    #[test]
    fn test_absent_optionals_are_omitted() {
        let json = serde_json::to_value(reading()).expect("serialize");
        assert!(json.get("calcium_hardness").is_none());
        assert!(json.get("temperature").is_none());
        assert_eq!(json["salt_level"], 3200.0);
    }
}
