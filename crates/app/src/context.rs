//! Application context: configuration, the store and the live snapshot.
//!
//! The context is the single writer of the snapshot. Every transition goes
//! through [`AppContext::apply`], which persists the new state before making
//! it current.

use neupool_core::{AppState, PoolId, User};
use tracing::{info, instrument};

use crate::advisor::AdvisorClient;
use crate::auth::{self, LoginMode};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::store::StateStore;

/// Loaded application.
#[derive(Debug)]
pub struct AppContext {
    config: AppConfig,
    store: StateStore,
    state: AppState,
}

impl AppContext {
    /// Load the snapshot described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the snapshot cannot be read or is corrupt.
    #[instrument(skip(config), fields(path = %config.state_path().display()))]
    pub async fn load(config: AppConfig) -> Result<Self, AppError> {
        let store = StateStore::from_config(&config);
        let state = store.load().await?;
        Ok(Self {
            config,
            store,
            state,
        })
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current snapshot.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Persist `next` and make it the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if writing fails; the current snapshot is
    /// then left unchanged.
    pub async fn apply(&mut self, next: AppState) -> Result<(), AppError> {
        self.store.save(&next).await?;
        self.state = next;
        Ok(())
    }

    /// Build an advisor client.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` if no API key is configured. No
    /// network call is made.
    pub fn advisor(&self) -> Result<AdvisorClient, AppError> {
        Ok(AdvisorClient::from_config(self.config.advisor())?)
    }

    /// Authenticate and return a copy of the user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` on bad credentials or an admin login by a
    /// non-admin.
    pub fn login(&self, username: &str, password: &str, mode: LoginMode) -> Result<User, AppError> {
        let user = auth::login(&self.state, username, password, mode)?;
        info!(user_id = %user.id, role = %user.role, "Logged in");
        Ok(user.clone())
    }

    /// Register a technician account and persist it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` if validation fails, or `AppError::Store` if
    /// saving fails.
    pub async fn register(&mut self, username: &str, password: &str) -> Result<(), AppError> {
        let next = auth::register(&self.state, username, password)?;
        self.apply(next).await
    }

    /// Fail unless `user` may access `pool_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the pool does not exist and
    /// `AppError::Forbidden` if the user is not assigned to it.
    pub fn require_pool_access(&self, user: &User, pool_id: &PoolId) -> Result<(), AppError> {
        if self.state.pool(pool_id).is_none() {
            return Err(AppError::NotFound(format!("pool {pool_id}")));
        }
        if !user.can_access(pool_id) {
            return Err(AppError::Forbidden(format!(
                "{} is not assigned to pool {pool_id}",
                user.username
            )));
        }
        Ok(())
    }
}

/// Fail unless `user` is an admin.
///
/// # Errors
///
/// Returns `AppError::Forbidden` for non-admin users.
pub fn require_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "{} does not have admin privileges",
            user.username
        )))
    }
}
