//! NeuPool Core - Domain types and state transitions.
//!
//! This crate provides the parts of the pool maintenance domain that do not
//! need I/O. It is used by:
//! - `app` - Configuration, persistence, the chemistry advisor client
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no file access, no
//! HTTP clients, no password hashing. State changes are expressed as
//! transitions that take a snapshot and return a new one.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, quantities, usernames and enums
//! - [`models`] - Users, pools, readings, inventory, adjustments, log entries
//! - [`state`] - The [`AppState`] aggregate and its transitions
//! - [`reconcile`] - Log commit and inventory reconciliation
//! - [`targets`] - Category-dependent chemistry targets
//! - [`error`] - Validation, precommit and lookup errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod models;
pub mod reconcile;
pub mod state;
pub mod targets;
pub mod types;

pub use error::{PrecommitError, StateError, ValidationError};
pub use models::*;
pub use reconcile::{Commit, CommitRequest, MatchOutcome, commit_log, names_match};
pub use state::AppState;
pub use targets::{ChemistryTargets, TargetRange};
pub use types::*;
