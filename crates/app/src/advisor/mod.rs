//! Chemistry advisor integration.
//!
//! The advisor turns a pool's configuration, its current readings, the water
//! changes made today and the stock on hand into a list of chemical
//! adjustments. It is the only component that talks to anything outside the
//! process.
//!
//! # Contract
//!
//! - Targets are category-dependent (see [`neupool_core::ChemistryTargets`])
//!   and are part of the prompt, not enforced locally.
//! - The reply is validated on receipt into a [`Recommendation`]; any
//!   missing field, blank chemical name or negative amount is an error and
//!   nothing is kept.
//! - A missing API key is reported before any request is made.
//! - Calls are not idempotent and are never retried silently.

use std::future::Future;

pub mod client;
pub mod error;
pub mod prompt;
pub mod response;
pub mod types;

pub use client::AdvisorClient;
pub use error::AdvisorError;
pub use prompt::{AdjustmentRequest, StockLine, output_schema};
pub use response::Recommendation;

/// Source of dosing recommendations.
///
/// Implemented by [`AdvisorClient`]; tests substitute canned advisors.
pub trait Advisor {
    /// Compute adjustments for the request.
    fn recommend(
        &self,
        request: &AdjustmentRequest,
    ) -> impl Future<Output = Result<Recommendation, AdvisorError>> + Send;
}
