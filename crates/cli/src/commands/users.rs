//! Account commands.

use neupool_app::{AppConfig, AppContext, AppError};
use neupool_core::{PoolId, User};
use tracing::info;

use super::{CommandError, Credentials, emit};

/// Register a technician from the global credentials.
///
/// # Errors
///
/// Returns an error if credentials are missing or fail validation.
pub async fn register(config: AppConfig, credentials: &Credentials) -> Result<(), CommandError> {
    let (username, password) = credentials.pair()?;
    let mut ctx = AppContext::load(config).await?;
    ctx.register(username, password).await?;
    emit([format!("Registered {username}. Ask an admin to assign pools.")])
}

/// List accounts (admin).
///
/// # Errors
///
/// Returns an error unless the acting user is an admin.
pub fn list(ctx: &AppContext, credentials: &Credentials) -> Result<(), CommandError> {
    credentials.login_admin(ctx)?;

    let lines = ctx.state().users.iter().map(|user| {
        let pools = if user.is_admin() {
            "all".to_string()
        } else if user.assigned_pools.is_empty() {
            "-".to_string()
        } else {
            user.assigned_pools
                .iter()
                .map(PoolId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "{:<6} {:<20} {:<6} pools: {pools}",
            user.id.as_str(),
            user.username.as_str(),
            user.role.as_str()
        )
    });
    emit(lines)
}

/// Delete an account (admin). Log entries are kept.
///
/// # Errors
///
/// Returns an error unless the acting user is an admin, or if the account
/// does not exist or is the acting user.
pub async fn delete(
    ctx: &mut AppContext,
    credentials: &Credentials,
    username: &str,
) -> Result<(), CommandError> {
    let admin = credentials.login_admin(ctx)?;
    let target = find_user(ctx, username)?;
    if target.id == admin.id {
        return Err(AppError::Forbidden(
            "cannot delete the account you are logged in as".to_string(),
        )
        .into());
    }

    let next = ctx.state().delete_user(&target.id)?;
    ctx.apply(next).await?;
    info!(user_id = %target.id, "Deleted user");
    emit([format!("Deleted {}", target.username)])
}

/// Grant or revoke pool access (admin).
///
/// # Errors
///
/// Returns an error unless the acting user is an admin, or if the user or
/// pool does not exist.
pub async fn set_access(
    ctx: &mut AppContext,
    credentials: &Credentials,
    username: &str,
    pool: &str,
    granted: bool,
) -> Result<(), CommandError> {
    credentials.login_admin(ctx)?;
    let target = find_user(ctx, username)?;
    let pool_id = PoolId::new(pool);

    let next = ctx.state().set_pool_access(&target.id, &pool_id, granted)?;
    ctx.apply(next).await?;
    info!(user_id = %target.id, %pool_id, granted, "Updated pool access");

    let verb = if granted { "Granted" } else { "Revoked" };
    emit([format!("{verb} {} access to {pool_id}", target.username)])
}

fn find_user(ctx: &AppContext, username: &str) -> Result<User, AppError> {
    ctx.state()
        .user_by_name(username)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("user {username}")))
}
