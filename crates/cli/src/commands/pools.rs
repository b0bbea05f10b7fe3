//! Pool commands.

use neupool_app::AppContext;
use neupool_core::{Category, PoolConfig, PoolData, PoolId, SanitizerType, Surface, User};
use tracing::info;

use super::{CommandError, Credentials, emit, or_dash};

/// A pool to add.
#[derive(Debug, Clone)]
pub struct NewPool {
    /// Configuration.
    pub config: PoolConfig,
    /// Notes.
    pub notes: Option<String>,
}

/// Fields to change on an existing pool. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct PoolChanges {
    /// Display name.
    pub name: Option<String>,
    /// Volume in gallons.
    pub volume_gallons: Option<u32>,
    /// Sanitizer system.
    pub sanitizer: Option<SanitizerType>,
    /// Interior surface.
    pub surface: Option<Surface>,
    /// Category.
    pub category: Option<Category>,
    /// Notes; an empty string clears them.
    pub notes: Option<String>,
}

impl PoolChanges {
    /// Apply the changes to a configuration.
    #[must_use]
    pub fn apply(&self, current: &PoolConfig) -> PoolConfig {
        PoolConfig {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            volume_gallons: self.volume_gallons.unwrap_or(current.volume_gallons),
            sanitizer: self.sanitizer.unwrap_or(current.sanitizer),
            surface: self.surface.unwrap_or(current.surface),
            category: self.category.unwrap_or(current.category),
        }
    }
}

/// List pools visible to the acting user. Admins also see which
/// technicians are assigned to each pool.
///
/// # Errors
///
/// Returns an error if the login fails.
pub fn list(ctx: &AppContext, credentials: &Credentials) -> Result<(), CommandError> {
    let user = credentials.login(ctx)?;
    let state = ctx.state();
    let pools = state.accessible_pools(&user);
    if pools.is_empty() {
        return emit(["No pools assigned."]);
    }
    if user.is_admin() {
        return emit(
            pools
                .into_iter()
                .map(|pool| with_technicians(&describe(pool), &state.assigned_users(&pool.id))),
        );
    }
    emit(pools.into_iter().map(describe))
}

/// Add a pool (admin).
///
/// # Errors
///
/// Returns an error unless the acting user is an admin, or if the
/// configuration is incomplete.
pub async fn add(
    ctx: &mut AppContext,
    credentials: &Credentials,
    pool: NewPool,
) -> Result<(), CommandError> {
    credentials.login_admin(ctx)?;
    let (next, id) = ctx.state().add_pool(pool.config, pool.notes)?;
    ctx.apply(next).await?;
    info!(pool_id = %id, "Added pool");
    emit([format!("Added pool {id}")])
}

/// Update a pool. Admins may update any pool, technicians their own.
///
/// # Errors
///
/// Returns an error if the pool does not exist, the user may not access it,
/// or the resulting configuration is incomplete.
pub async fn update(
    ctx: &mut AppContext,
    credentials: &Credentials,
    id: &str,
    changes: PoolChanges,
) -> Result<(), CommandError> {
    let user = credentials.login(ctx)?;
    let pool_id = PoolId::new(id);
    ctx.require_pool_access(&user, &pool_id)?;

    let current = ctx
        .state()
        .pool(&pool_id)
        .map(|p| p.config.clone())
        .ok_or_else(|| neupool_app::AppError::NotFound(format!("pool {pool_id}")))?;
    let next = ctx
        .state()
        .update_pool(&pool_id, changes.apply(&current), changes.notes)?;
    ctx.apply(next).await?;
    info!(%pool_id, user_id = %user.id, "Updated pool");
    emit([format!("Updated pool {pool_id}")])
}

/// Delete a pool (admin). Its log entries stay available via `history`.
///
/// # Errors
///
/// Returns an error unless the acting user is an admin, or if the pool does
/// not exist.
pub async fn delete(
    ctx: &mut AppContext,
    credentials: &Credentials,
    id: &str,
) -> Result<(), CommandError> {
    credentials.login_admin(ctx)?;
    let pool_id = PoolId::new(id);
    let next = ctx.state().delete_pool(&pool_id)?;
    ctx.apply(next).await?;
    info!(%pool_id, "Deleted pool");
    emit([format!("Deleted pool {pool_id} (history kept)")])
}

fn describe(pool: &PoolData) -> String {
    let config = &pool.config;
    format!(
        "{:<10} {:<24} {:>7} gal  {:<8} {:<10} {:<4}  notes: {}",
        pool.id.as_str(),
        config.name,
        config.volume_gallons,
        config.sanitizer.as_str(),
        config.surface.as_str(),
        config.category.as_str(),
        or_dash(pool.notes.as_deref())
    )
}

fn with_technicians(line: &str, technicians: &[&User]) -> String {
    let names = technicians
        .iter()
        .map(|u| u.username.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{line}  techs: {}", or_dash((!names.is_empty()).then_some(names)))
}
