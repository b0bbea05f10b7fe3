//! Snapshot persistence.
//!
//! The whole [`AppState`] is stored as one JSON document at
//! `<data_dir>/<state_key>.json`. It is read once at startup and rewritten in
//! full after every transition. Writes go to a sibling temp file that is then
//! renamed over the snapshot, so a crash never leaves a half-written file.
//!
//! There is no schema versioning. A snapshot that cannot be parsed is
//! reported as [`StoreError::Corrupt`] and never merged with anything.

use std::path::{Path, PathBuf};

use neupool_core::{
    AppState, Category, PoolConfig, PoolData, PoolId, Role, SanitizerType, Surface, User, UserId,
    Username,
};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::auth::{AuthError, hash_password};
use crate::config::AppConfig;

/// Password given to the demo accounts of a fresh snapshot.
pub const SEED_PASSWORD: &str = "password";

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the snapshot failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The snapshot exists but is not a valid state document.
    #[error("state snapshot {path} is corrupt: {message}")]
    Corrupt {
        /// Snapshot file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Serializing the state failed.
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),

    /// An import document is invalid.
    #[error("invalid import: {0}")]
    Import(String),

    /// Hashing seed passwords failed.
    #[error("failed to seed state: {0}")]
    Seed(#[from] AuthError),
}

/// File-backed snapshot store.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store backed by the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the configured location.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.state_path())
    }

    /// Snapshot file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, returning `None` if none has been written yet.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be read and
    /// `StoreError::Corrupt` if it cannot be parsed.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load_existing(&self) -> Result<Option<AppState>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let state: AppState = serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        debug!(
            revision = state.revision,
            users = state.users.len(),
            pools = state.pools.len(),
            logs = state.logs.len(),
            "Loaded state"
        );
        Ok(Some(state))
    }

    /// Load the snapshot, falling back to the demo seed state if none exists.
    ///
    /// The seed is not written until the first [`StateStore::save`].
    ///
    /// # Errors
    ///
    /// Same as [`StateStore::load_existing`].
    pub async fn load(&self) -> Result<AppState, StoreError> {
        match self.load_existing().await? {
            Some(state) => Ok(state),
            None => {
                info!(path = %self.path.display(), "No snapshot found, using seed state");
                seed_state()
            }
        }
    }

    /// Replace the snapshot on disk.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be created or the
    /// file cannot be written or renamed.
    #[instrument(skip(self, state), fields(path = %self.path.display(), revision = state.revision))]
    pub async fn save(&self, state: &AppState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let json = serde_json::to_vec_pretty(state)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;

        debug!(bytes = json.len(), "Saved state");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// The demo state used when no snapshot exists.
///
/// Two accounts (`admin` and `tech`, both with [`SEED_PASSWORD`]) and two
/// pools assigned to `tech`. Inventory and logs start empty.
///
/// # Errors
///
/// Returns `StoreError::Seed` if password hashing fails.
pub fn seed_state() -> Result<AppState, StoreError> {
    let residence = PoolId::new("pool-1");
    let spa = PoolId::new("pool-2");

    Ok(AppState {
        revision: 0,
        users: vec![
            seed_user("1", "admin", Role::Admin, Vec::new())?,
            seed_user("2", "tech", Role::User, vec![residence.clone(), spa.clone()])?,
        ],
        pools: vec![
            PoolData {
                id: residence,
                config: PoolConfig {
                    name: "Johnson Residence".to_string(),
                    volume_gallons: 15_000,
                    sanitizer: SanitizerType::Chlorine,
                    surface: Surface::Plaster,
                    category: Category::Pool,
                },
                notes: None,
            },
            PoolData {
                id: spa,
                config: PoolConfig {
                    name: "Sunset Hotel Spa".to_string(),
                    volume_gallons: 800,
                    sanitizer: SanitizerType::Chlorine,
                    surface: Surface::Fiberglass,
                    category: Category::Spa,
                },
                notes: None,
            },
        ],
        inventory: Vec::new(),
        logs: Vec::new(),
    })
}

fn seed_user(
    id: &str,
    username: &str,
    role: Role,
    assigned_pools: Vec<PoolId>,
) -> Result<User, StoreError> {
    Ok(User {
        id: UserId::new(id),
        username: Username::parse(username)
            .map_err(|e| StoreError::Import(format!("seed username {username}: {e}")))?,
        password_hash: hash_password(SEED_PASSWORD)?,
        role,
        assigned_pools,
    })
}

/// Parse a YAML state document for import.
///
/// Every user must carry an Argon2 PHC hash, usernames must be unique
/// (case-insensitive) and logged readings must be finite and non-negative.
/// The revision is reset to zero.
///
/// # Errors
///
/// Returns `StoreError::Import` if the document does not parse or violates
/// one of these rules.
pub fn parse_import(yaml: &str) -> Result<AppState, StoreError> {
    let mut state: AppState =
        serde_yaml::from_str(yaml).map_err(|e| StoreError::Import(e.to_string()))?;

    for (index, user) in state.users.iter().enumerate() {
        if argon2::PasswordHash::new(&user.password_hash).is_err() {
            return Err(StoreError::Import(format!(
                "user {} does not have a password hash",
                user.username
            )));
        }
        if state
            .users
            .iter()
            .take(index)
            .any(|other| other.username.matches(user.username.as_str()))
        {
            return Err(StoreError::Import(format!(
                "duplicate username {}",
                user.username
            )));
        }
    }

    for entry in &state.logs {
        entry
            .readings
            .validate()
            .map_err(|e| StoreError::Import(format!("log entry {}: {e}", entry.id)))?;
    }

    state.revision = 0;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;

    #[test]
    fn test_seed_state() {
        let state = seed_state().expect("seed");
        assert_eq!(state.users.len(), 2);
        assert_eq!(state.pools.len(), 2);
        assert!(state.inventory.is_empty());
        assert!(state.logs.is_empty());

        let tech = state.user_by_name("tech").expect("tech");
        assert_eq!(
            tech.assigned_pools,
            vec![PoolId::new("pool-1"), PoolId::new("pool-2")]
        );
        assert!(verify_password(SEED_PASSWORD, &tech.password_hash).is_ok());

        let spa = state.pool(&PoolId::new("pool-2")).expect("spa");
        assert_eq!(spa.config.category, Category::Spa);
        assert_eq!(spa.config.volume_gallons, 800);
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let store = StateStore::new("/data/neuPoolState.json");
        assert_eq!(store.temp_path(), PathBuf::from("/data/neuPoolState.json.tmp"));
    }

    #[test]
    fn test_parse_import_rejects_plaintext() {
        let yaml = r"
users:
  - id: '1'
    username: admin
    password_hash: password
    role: admin
    assigned_pools: []
pools: []
inventory: []
logs: []
";
        let err = parse_import(yaml).expect_err("plaintext password");
        assert!(err.to_string().contains("password hash"));
    }

    #[test]
    fn test_parse_import_rejects_nan_reading() {
        let yaml = r"
users: []
pools: []
inventory: []
logs:
  - id: log-1
    pool_id: pool-1
    timestamp: 2026-06-01T09:30:00Z
    user: tech
    readings:
      ph: .nan
      free_chlorine: 3.0
      total_alkalinity: 100.0
      cyanuric_acid: 50.0
";
        let err = parse_import(yaml).expect_err("NaN pH");
        assert!(err.to_string().contains("log entry log-1"));
        assert!(err.to_string().contains("pH"));
    }

    #[test]
    fn test_parse_import_resets_revision() {
        let hash = hash_password(SEED_PASSWORD).expect("hash");
        let yaml = format!(
            "revision: 42\nusers:\n  - id: '1'\n    username: admin\n    password_hash: '{hash}'\n    role: admin\n    assigned_pools: []\npools: []\ninventory: []\nlogs: []\n"
        );
        let state = parse_import(&yaml).expect("import");
        assert_eq!(state.revision, 0);
        assert_eq!(state.users[0].role, Role::Admin);
    }

    #[test]
    fn test_parse_import_rejects_duplicates() {
        let hash = hash_password(SEED_PASSWORD).expect("hash");
        let yaml = format!(
            "users:\n  - id: '1'\n    username: Pat\n    password_hash: '{hash}'\n    role: user\n    assigned_pools: []\n  - id: '2'\n    username: pat\n    password_hash: '{hash}'\n    role: user\n    assigned_pools: []\npools: []\ninventory: []\nlogs: []\n"
        );
        let err = parse_import(&yaml).expect_err("duplicate");
        assert!(err.to_string().contains("duplicate username"));
    }
}
