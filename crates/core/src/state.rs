//! The application state aggregate and its transitions.
//!
//! [`AppState`] holds every user, pool, inventory item and log entry. It is
//! persisted and restored as one unit. Transitions never mutate a snapshot
//! in place: each takes `&self` and returns a new snapshot with `revision`
//! bumped by one, or an error with the original left as it was.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{StateError, ValidationError};
use crate::models::{InventoryItem, LogEntry, NewInventoryItem, PoolConfig, PoolData, User};
use crate::types::{InventoryItemId, PoolId, Role, UserId, Username};

/// The whole application state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppState {
    /// Number of transitions applied since the snapshot was created.
    #[serde(default)]
    pub revision: u64,
    /// All user accounts.
    pub users: Vec<User>,
    /// Active pools.
    pub pools: Vec<PoolData>,
    /// Shared chemical stock.
    pub inventory: Vec<InventoryItem>,
    /// Visit history in commit order.
    pub logs: Vec<LogEntry>,
}

impl AppState {
    // =========================================================================
    // Queries
    // =========================================================================

    /// Find a user by ID.
    #[must_use]
    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.id == id)
    }

    /// Find a user by login name (case-insensitive).
    #[must_use]
    pub fn user_by_name(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username.matches(username))
    }

    /// Find an active pool by ID.
    #[must_use]
    pub fn pool(&self, id: &PoolId) -> Option<&PoolData> {
        self.pools.iter().find(|p| &p.id == id)
    }

    /// Find an inventory item by ID.
    #[must_use]
    pub fn inventory_item(&self, id: &InventoryItemId) -> Option<&InventoryItem> {
        self.inventory.iter().find(|i| &i.id == id)
    }

    /// Pools the user may see. Admins see every pool.
    #[must_use]
    pub fn accessible_pools(&self, user: &User) -> Vec<&PoolData> {
        self.pools.iter().filter(|p| user.can_access(&p.id)).collect()
    }

    /// Log entries for a pool, oldest first.
    ///
    /// Works for deleted pools too: entries keep their pool reference.
    #[must_use]
    pub fn pool_logs(&self, pool_id: &PoolId) -> Vec<&LogEntry> {
        self.logs.iter().filter(|l| &l.pool_id == pool_id).collect()
    }

    /// Inventory items at or below their reorder threshold.
    #[must_use]
    pub fn low_stock(&self) -> Vec<&InventoryItem> {
        self.inventory.iter().filter(|i| i.is_low()).collect()
    }

    /// Users assigned to a pool (admins excluded).
    #[must_use]
    pub fn assigned_users(&self, pool_id: &PoolId) -> Vec<&User> {
        self.users
            .iter()
            .filter(|u| !u.is_admin() && u.assigned_pools.contains(pool_id))
            .collect()
    }

    // =========================================================================
    // User transitions
    // =========================================================================

    /// Add a technician account.
    ///
    /// The caller hashes the password; an empty hash is treated as a missing
    /// password.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the username is invalid or taken, or
    /// the password hash is empty.
    pub fn register_user(&self, username: &str, password_hash: String) -> Result<Self, StateError> {
        self.add_user(username, password_hash, Role::User)
    }

    /// Add an account with an explicit role.
    ///
    /// # Errors
    ///
    /// Same as [`AppState::register_user`].
    pub fn add_user(
        &self,
        username: &str,
        password_hash: String,
        role: Role,
    ) -> Result<Self, StateError> {
        let username = Username::parse(username).map_err(ValidationError::from)?;
        if password_hash.is_empty() {
            return Err(ValidationError::MissingField("password").into());
        }
        if self.user_by_name(username.as_str()).is_some() {
            return Err(ValidationError::UsernameTaken.into());
        }

        Ok(self.next(|state| {
            state.users.push(User {
                id: UserId::generate(),
                username,
                password_hash,
                role,
                assigned_pools: Vec::new(),
            });
        }))
    }

    /// Remove a user account. Their log entries are kept.
    ///
    /// # Errors
    ///
    /// Returns `StateError::UserNotFound` if the user does not exist.
    pub fn delete_user(&self, id: &UserId) -> Result<Self, StateError> {
        self.require_user(id)?;
        Ok(self.next(|state| state.users.retain(|u| &u.id != id)))
    }

    /// Grant the user access to a pool, or revoke it if already granted.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the user or pool does not exist.
    pub fn toggle_pool_access(&self, user_id: &UserId, pool_id: &PoolId) -> Result<Self, StateError> {
        let granted = self.require_user(user_id)?.assigned_pools.contains(pool_id);
        self.set_pool_access(user_id, pool_id, !granted)
    }

    /// Grant or revoke pool access explicitly.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the user or pool does not exist.
    pub fn set_pool_access(
        &self,
        user_id: &UserId,
        pool_id: &PoolId,
        granted: bool,
    ) -> Result<Self, StateError> {
        self.require_user(user_id)?;
        self.require_pool(pool_id)?;

        Ok(self.next(|state| {
            if let Some(user) = state.users.iter_mut().find(|u| &u.id == user_id) {
                user.assigned_pools.retain(|p| p != pool_id);
                if granted {
                    user.assigned_pools.push(pool_id.clone());
                }
            }
        }))
    }

    // =========================================================================
    // Pool transitions
    // =========================================================================

    /// Add a pool. Returns the new state and the new pool's ID.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the configuration is incomplete.
    pub fn add_pool(
        &self,
        config: PoolConfig,
        notes: Option<String>,
    ) -> Result<(Self, PoolId), StateError> {
        config.validate()?;
        let id = PoolId::generate();
        let pool = PoolData {
            id: id.clone(),
            config,
            notes: notes.filter(|n| !n.trim().is_empty()),
        };
        Ok((self.next(|state| state.pools.push(pool)), id))
    }

    /// Replace a pool's configuration. `notes` of `None` keeps existing notes.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the pool does not exist or the configuration
    /// is incomplete.
    pub fn update_pool(
        &self,
        id: &PoolId,
        config: PoolConfig,
        notes: Option<String>,
    ) -> Result<Self, StateError> {
        self.require_pool(id)?;
        config.validate()?;

        Ok(self.next(|state| {
            if let Some(pool) = state.pools.iter_mut().find(|p| &p.id == id) {
                pool.config = config;
                if let Some(notes) = notes {
                    pool.notes = Some(notes).filter(|n| !n.trim().is_empty());
                }
            }
        }))
    }

    /// Remove a pool from the active list.
    ///
    /// Log entries for the pool are retained and stay reachable through
    /// [`AppState::pool_logs`]. User assignments are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `StateError::PoolNotFound` if the pool does not exist.
    pub fn delete_pool(&self, id: &PoolId) -> Result<Self, StateError> {
        self.require_pool(id)?;
        Ok(self.next(|state| state.pools.retain(|p| &p.id != id)))
    }

    // =========================================================================
    // Inventory transitions
    // =========================================================================

    /// Add a stock item. Returns the new state and the new item's ID.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the item name is blank.
    pub fn add_inventory_item(
        &self,
        item: NewInventoryItem,
        now: DateTime<Utc>,
    ) -> Result<(Self, InventoryItemId), StateError> {
        let item = item.into_item(now)?;
        let id = item.id.clone();
        Ok((self.next(|state| state.inventory.push(item)), id))
    }

    /// Change an item's stock by `delta`, clamping at zero.
    ///
    /// # Errors
    ///
    /// Returns `StateError::InventoryItemNotFound` if the item does not exist.
    pub fn adjust_inventory_quantity(
        &self,
        id: &InventoryItemId,
        delta: Decimal,
    ) -> Result<Self, StateError> {
        self.require_inventory_item(id)?;
        Ok(self.next(|state| {
            if let Some(item) = state.inventory.iter_mut().find(|i| &i.id == id) {
                item.quantity = item.quantity.saturating_apply(delta);
            }
        }))
    }

    /// Remove a stock item.
    ///
    /// # Errors
    ///
    /// Returns `StateError::InventoryItemNotFound` if the item does not exist.
    pub fn delete_inventory_item(&self, id: &InventoryItemId) -> Result<Self, StateError> {
        self.require_inventory_item(id)?;
        Ok(self.next(|state| state.inventory.retain(|i| &i.id != id)))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn next(&self, apply: impl FnOnce(&mut Self)) -> Self {
        let mut state = self.clone();
        apply(&mut state);
        state.revision += 1;
        state
    }

    fn require_user(&self, id: &UserId) -> Result<&User, StateError> {
        self.user(id)
            .ok_or_else(|| StateError::UserNotFound(id.clone()))
    }

    fn require_pool(&self, id: &PoolId) -> Result<&PoolData, StateError> {
        self.pool(id)
            .ok_or_else(|| StateError::PoolNotFound(id.clone()))
    }

    fn require_inventory_item(&self, id: &InventoryItemId) -> Result<&InventoryItem, StateError> {
        self.inventory_item(id)
            .ok_or_else(|| StateError::InventoryItemNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Quantity, SanitizerType, Surface};

    fn config(name: &str) -> PoolConfig {
        PoolConfig {
            name: name.to_string(),
            volume_gallons: 15_000,
            sanitizer: SanitizerType::Chlorine,
            surface: Surface::Plaster,
            category: Category::Pool,
        }
    }

    #[test]
    fn test_transitions_do_not_mutate_input() {
        let empty = AppState::default();
        let next = empty.register_user("tech", "hash".to_string()).expect("register");

        assert!(empty.users.is_empty());
        assert_eq!(next.users.len(), 1);
        assert_eq!(next.revision, 1);
    }

    #[test]
    fn test_register_rejects_duplicates_case_insensitively() {
        let state = AppState::default()
            .register_user("Tech", "hash".to_string())
            .expect("register");
        let err = state
            .register_user("tech", "hash".to_string())
            .expect_err("duplicate");
        assert_eq!(err, StateError::Validation(ValidationError::UsernameTaken));
    }

    #[test]
    fn test_register_requires_fields() {
        let state = AppState::default();
        assert!(matches!(
            state.register_user("", "hash".to_string()),
            Err(StateError::Validation(ValidationError::Username(_)))
        ));
        assert_eq!(
            state.register_user("tech", String::new()),
            Err(StateError::Validation(ValidationError::MissingField("password")))
        );
    }

    #[test]
    fn test_toggle_pool_access() {
        let (state, pool_id) = AppState::default()
            .add_pool(config("Backyard"), None)
            .expect("add pool");
        let state = state.register_user("tech", "hash".to_string()).expect("register");
        let user_id = state.users[0].id.clone();

        let granted = state.toggle_pool_access(&user_id, &pool_id).expect("grant");
        assert_eq!(granted.users[0].assigned_pools, vec![pool_id.clone()]);

        let revoked = granted.toggle_pool_access(&user_id, &pool_id).expect("revoke");
        assert!(revoked.users[0].assigned_pools.is_empty());
    }

    #[test]
    fn test_assigned_users_follow_access() {
        let (state, pool_id) = AppState::default()
            .add_pool(config("Backyard"), None)
            .expect("add pool");
        let state = state.register_user("tech", "hash".to_string()).expect("register");
        let state = state.register_user("helper", "hash".to_string()).expect("register");
        assert!(state.assigned_users(&pool_id).is_empty());

        let tech_id = state.users[0].id.clone();
        let state = state
            .set_pool_access(&tech_id, &pool_id, true)
            .expect("grant");
        let names: Vec<_> = state
            .assigned_users(&pool_id)
            .iter()
            .map(|u| u.username.as_str())
            .collect();
        assert_eq!(names, ["tech"]);
    }

    #[test]
    fn test_update_pool_keeps_notes_when_none() {
        let (state, pool_id) = AppState::default()
            .add_pool(config("Backyard"), Some("gate code 1234".to_string()))
            .expect("add pool");

        let mut spa = config("Backyard Spa");
        spa.category = Category::Spa;
        let state = state.update_pool(&pool_id, spa, None).expect("update");

        let pool = state.pool(&pool_id).expect("pool");
        assert_eq!(pool.config.category, Category::Spa);
        assert_eq!(pool.notes.as_deref(), Some("gate code 1234"));
    }

    #[test]
    fn test_missing_entities() {
        let state = AppState::default();
        assert_eq!(
            state.delete_pool(&PoolId::new("nope")),
            Err(StateError::PoolNotFound(PoolId::new("nope")))
        );
        assert_eq!(
            state.delete_user(&UserId::new("nope")),
            Err(StateError::UserNotFound(UserId::new("nope")))
        );
    }

    #[test]
    fn test_adjust_inventory_clamps() {
        let (state, id) = AppState::default()
            .add_inventory_item(
                NewInventoryItem {
                    name: "Shock".to_string(),
                    quantity: Quantity::from_whole(1),
                    ..Default::default()
                },
                Utc::now(),
            )
            .expect("add item");

        let state = state
            .adjust_inventory_quantity(&id, Decimal::from(-5))
            .expect("adjust");
        assert_eq!(state.inventory[0].quantity, Quantity::ZERO);

        let state = state.adjust_inventory_quantity(&id, Decimal::ONE).expect("adjust");
        assert_eq!(state.inventory[0].quantity, Quantity::from_whole(1));
    }
}
