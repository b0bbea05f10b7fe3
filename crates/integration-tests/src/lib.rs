//! Integration test fixtures for NeuPool.
//!
//! Tests live in `tests/` and share the helpers below:
//!
//! - [`TempDataDir`] - throwaway data directory with an [`AppConfig`]
//! - [`stock`], [`qty`], [`reading`] - domain values with terse constructors
//! - [`FakeAdvisor`] - canned [`Advisor`] replies, recording every request
//!
//! HTTP-level advisor tests stand up an `httpmock` server in place of the
//! Messages API.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use neupool_app::{AdjustmentRequest, Advisor, AdvisorError, AppConfig, Recommendation};
use neupool_core::{ChemicalReading, InventoryItem, InventoryItemId, Quantity};

// =============================================================================
// Data directory
// =============================================================================

/// A unique directory under the system temp dir, removed on drop.
#[derive(Debug)]
pub struct TempDataDir {
    path: PathBuf,
}

impl TempDataDir {
    /// Reserve a fresh directory path. The directory itself is created lazily
    /// by the store on first save.
    #[must_use]
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("neupool-test-{}", uuid::Uuid::new_v4()));
        Self { path }
    }

    /// Directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configuration rooted at this directory, without an advisor.
    #[must_use]
    pub fn config(&self) -> AppConfig {
        AppConfig::local(&self.path)
    }
}

impl Default for TempDataDir {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempDataDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

// =============================================================================
// Domain values
// =============================================================================

/// A stock item with a stable ID derived from its name.
#[must_use]
pub fn stock(name: &str, quantity: &str, unit: &str) -> InventoryItem {
    InventoryItem {
        id: InventoryItemId::new(name.to_lowercase().replace(' ', "-")),
        name: name.to_string(),
        quantity: quantity.parse().expect("valid quantity"),
        unit: unit.to_string(),
        vendor: None,
        vendor_url: None,
        last_purchased: Some(Utc::now()),
        min_threshold: None,
    }
}

/// Parse a decimal literal.
#[must_use]
pub fn qty(value: &str) -> Quantity {
    value.parse().expect("valid quantity")
}

/// A balanced reading with the given pH.
#[must_use]
pub const fn reading(ph: f64) -> ChemicalReading {
    ChemicalReading {
        ph,
        free_chlorine: 3.0,
        total_alkalinity: 100.0,
        cyanuric_acid: 50.0,
        calcium_hardness: Some(250.0),
        salt_level: None,
        temperature: None,
    }
}

// =============================================================================
// Fake advisor
// =============================================================================

/// An [`Advisor`] that replays canned results in order.
///
/// Once the queue is empty every call fails with
/// `AdvisorError::InvalidRecommendation`.
#[derive(Debug, Default)]
pub struct FakeAdvisor {
    replies: Mutex<VecDeque<Result<Recommendation, AdvisorError>>>,
    requests: Mutex<Vec<AdjustmentRequest>>,
}

impl FakeAdvisor {
    /// Advisor with a single canned reply.
    #[must_use]
    pub fn replying(reply: Result<Recommendation, AdvisorError>) -> Self {
        let advisor = Self::default();
        advisor.push(reply);
        advisor
    }

    /// Queue another reply.
    pub fn push(&self, reply: Result<Recommendation, AdvisorError>) {
        self.replies.lock().expect("replies lock").push_back(reply);
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<AdjustmentRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl Advisor for FakeAdvisor {
    fn recommend(
        &self,
        request: &AdjustmentRequest,
    ) -> impl Future<Output = Result<Recommendation, AdvisorError>> + Send {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let reply = self
            .replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(AdvisorError::InvalidRecommendation(
                    "no canned reply left".to_string(),
                ))
            });
        async move { reply }
    }
}
