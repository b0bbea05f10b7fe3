//! User accounts and pool access.

use serde::{Deserialize, Serialize};

use crate::types::{PoolId, Role, UserId, Username};

/// A user account.
///
/// The credential is an Argon2 PHC string produced by the application
/// layer; this crate never sees plaintext passwords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name, unique case-insensitively.
    pub username: Username,
    /// Argon2 password hash (PHC string format).
    pub password_hash: String,
    /// Account role.
    pub role: Role,
    /// Pools this user may access. Ignored for admins.
    #[serde(default)]
    pub assigned_pools: Vec<PoolId>,
}

impl User {
    /// Returns `true` if the user is an admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Returns `true` if the user may view and service the given pool.
    ///
    /// Admins implicitly access every pool.
    #[must_use]
    pub fn can_access(&self, pool_id: &PoolId) -> bool {
        self.is_admin() || self.assigned_pools.contains(pool_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, pools: &[&str]) -> User {
        User {
            id: UserId::new("u"),
            username: Username::parse("someone").expect("valid"),
            password_hash: String::new(),
            role,
            assigned_pools: pools.iter().copied().map(PoolId::from).collect(),
        }
    }

    #[test]
    fn test_admin_accesses_everything() {
        let admin = user(Role::Admin, &[]);
        assert!(admin.can_access(&PoolId::new("pool-1")));
    }

    #[test]
    fn test_user_limited_to_assigned_pools() {
        let tech = user(Role::User, &["pool-1"]);
        assert!(tech.can_access(&PoolId::new("pool-1")));
        assert!(!tech.can_access(&PoolId::new("pool-2")));
    }
}
