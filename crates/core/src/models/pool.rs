//! Pool configuration.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{Category, PoolId, SanitizerType, Surface};

/// Physical configuration of a pool or spa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Display name.
    pub name: String,
    /// Water volume in gallons.
    pub volume_gallons: u32,
    /// Sanitizer system.
    pub sanitizer: SanitizerType,
    /// Interior surface.
    pub surface: Surface,
    /// Pool or spa.
    pub category: Category,
}

impl PoolConfig {
    /// Check that the configuration can be saved.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` if the name is blank and
    /// `ValidationError::InvalidVolume` if the volume is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("pool name"));
        }
        if self.volume_gallons == 0 {
            return Err(ValidationError::InvalidVolume);
        }
        Ok(())
    }
}

/// A managed pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolData {
    /// Unique pool ID.
    pub id: PoolId,
    /// Physical configuration.
    pub config: PoolConfig,
    /// Free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
