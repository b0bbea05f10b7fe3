//! Core types for NeuPool.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod quantity;
pub mod role;
pub mod username;

pub use id::*;
pub use quantity::{Quantity, QuantityError};
pub use role::{Category, Role, SanitizerType, Surface};
pub use username::{Username, UsernameError};
