//! Snapshot management commands.
//!
//! These operate on the state file directly and do not require a login.

use std::path::Path;

use neupool_app::{AppConfig, AppContext, StateStore, parse_import, seed_state};
use tracing::info;

use super::{CommandError, emit};

/// Write the demo seed state.
///
/// # Errors
///
/// Returns `CommandError::AlreadyInitialized` if a snapshot exists and
/// `force` is not set.
pub async fn init(config: &AppConfig, force: bool) -> Result<(), CommandError> {
    let store = StateStore::from_config(config);
    if !force && store.load_existing().await?.is_some() {
        return Err(CommandError::AlreadyInitialized(
            store.path().display().to_string(),
        ));
    }

    let state = seed_state()?;
    store.save(&state).await?;
    info!(path = %store.path().display(), "Initialized state");
    emit([format!(
        "Initialized {} with {} users and {} pools",
        store.path().display(),
        state.users.len(),
        state.pools.len()
    )])
}

/// Print the current snapshot as JSON.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be read.
pub async fn show(config: AppConfig) -> Result<(), CommandError> {
    let ctx = AppContext::load(config).await?;
    let json = serde_json::to_string_pretty(ctx.state())?;
    emit([json])
}

/// Replace the snapshot with a YAML document.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid state
/// document.
pub async fn import(config: &AppConfig, path: &Path) -> Result<(), CommandError> {
    let yaml = tokio::fs::read_to_string(path).await?;
    let state = parse_import(&yaml)?;

    let store = StateStore::from_config(config);
    store.save(&state).await?;
    info!(
        source = %path.display(),
        users = state.users.len(),
        pools = state.pools.len(),
        inventory = state.inventory.len(),
        logs = state.logs.len(),
        "Imported state"
    );
    emit([format!("Imported {} into {}", path.display(), store.path().display())])
}
