//! NeuPool App - Configuration, persistence, authentication and the
//! chemistry advisor.
//!
//! This crate wires the pure domain in `neupool-core` to the outside world:
//!
//! - [`config`] - Environment configuration
//! - [`store`] - JSON snapshot persistence and the demo seed state
//! - [`auth`] - Argon2 password hashing, registration and login
//! - [`advisor`] - Anthropic Messages API client for dosing recommendations
//! - [`session`] - Draft of one service visit, with stale-reply protection
//! - [`context`] - Loaded configuration and the live snapshot
//! - [`error`] - Unified [`AppError`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod advisor;
pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod session;
pub mod store;

pub use advisor::{AdjustmentRequest, Advisor, AdvisorClient, AdvisorError, Recommendation};
pub use auth::{AuthError, LoginMode};
pub use config::{AdvisorConfig, AppConfig, ConfigError, LogFormat};
pub use context::{AppContext, require_admin};
pub use error::AppError;
pub use session::{Completion, MeasurementSession, RequestToken, draft_reading};
pub use store::{StateStore, StoreError, parse_import, seed_state};
