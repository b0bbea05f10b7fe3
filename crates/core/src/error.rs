//! Domain error types.
//!
//! These cover the failures that can happen without any I/O: incomplete
//! user input, missing context at commit time, and references to entities
//! that do not exist in the current snapshot.

use thiserror::Error;

use crate::types::{InventoryItemId, PoolId, QuantityError, UserId, UsernameError};

/// User-entered fields are incomplete or invalid.
///
/// Validation errors block the triggering action and leave the state
/// untouched, so the same input can be corrected and resubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was left empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Invalid username.
    #[error("invalid username: {0}")]
    Username(#[from] UsernameError),

    /// Username is already registered (case-insensitive).
    #[error("username already taken")]
    UsernameTaken,

    /// Invalid amount or stock quantity.
    #[error("invalid quantity: {0}")]
    Quantity(#[from] QuantityError),

    /// Password does not meet requirements.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Pool volume must be positive.
    #[error("pool volume must be greater than zero")]
    InvalidVolume,

    /// A test reading is NaN, infinite or negative.
    #[error("{0} must be a finite, non-negative number")]
    InvalidReading(&'static str),
}

/// Local state is not valid for committing a log entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrecommitError {
    /// No acting user was supplied.
    #[error("no acting user for this log entry")]
    MissingUser,

    /// The acting user does not exist in the snapshot.
    #[error("acting user {0} does not exist")]
    UnknownUser(UserId),

    /// The target pool does not exist in the snapshot.
    #[error("pool {0} does not exist")]
    UnknownPool(PoolId),

    /// The acting user is not assigned to the target pool.
    #[error("user {user} has no access to pool {pool}")]
    PoolAccessDenied {
        /// Acting user.
        user: UserId,
        /// Target pool.
        pool: PoolId,
    },

    /// The readings cannot be recorded.
    #[error("invalid readings: {0}")]
    Readings(#[from] ValidationError),
}

/// A transition referenced an entity that is not in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// User not found.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// Pool not found.
    #[error("pool {0} not found")]
    PoolNotFound(PoolId),

    /// Inventory item not found.
    #[error("inventory item {0} not found")]
    InventoryItemNotFound(InventoryItemId),

    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
