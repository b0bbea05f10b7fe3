//! CLI command implementations.
//!
//! Commands write their results to stdout; diagnostics go through `tracing`
//! to stderr.

use std::io::Write;

use neupool_app::{AppContext, AppError, LoginMode, require_admin};
use neupool_core::{StateError, User, ValidationError};
use thiserror::Error;

pub mod history;
pub mod inventory;
pub mod measure;
pub mod pools;
pub mod state;
pub mod users;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Application error.
    #[error(transparent)]
    App(#[from] AppError),

    /// The command needs a logged-in user.
    #[error("this command requires --user and --password (or NEUPOOL_USER / NEUPOOL_PASSWORD)")]
    MissingCredentials,

    /// A `--manual` value could not be parsed.
    #[error("invalid --manual value {0:?}: expected NAME:AMOUNT:UNIT")]
    ManualSpec(String),

    /// The snapshot already exists.
    #[error("state already exists at {0} (use --force to overwrite)")]
    AlreadyInitialized(String),

    /// Writing output failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing output failed.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<neupool_app::StoreError> for CommandError {
    fn from(err: neupool_app::StoreError) -> Self {
        Self::App(err.into())
    }
}

impl From<StateError> for CommandError {
    fn from(err: StateError) -> Self {
        Self::App(err.into())
    }
}

impl From<ValidationError> for CommandError {
    fn from(err: ValidationError) -> Self {
        Self::App(err.into())
    }
}

/// Global login flags.
#[derive(Debug, Clone)]
pub struct Credentials {
    user: Option<String>,
    password: Option<String>,
}

impl Credentials {
    /// Wrap the global flags.
    #[must_use]
    pub const fn new(user: Option<String>, password: Option<String>) -> Self {
        Self { user, password }
    }

    /// Username and password, if both were given.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::MissingCredentials` if either is absent.
    pub fn pair(&self) -> Result<(&str, &str), CommandError> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) => Ok((user, password)),
            _ => Err(CommandError::MissingCredentials),
        }
    }

    /// Log in as any user.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing or wrong.
    pub fn login(&self, ctx: &AppContext) -> Result<User, CommandError> {
        let (user, password) = self.pair()?;
        Ok(ctx.login(user, password, LoginMode::User)?)
    }

    /// Log in through the admin entry point.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing or wrong, or the account
    /// is not an admin.
    pub fn login_admin(&self, ctx: &AppContext) -> Result<User, CommandError> {
        let (user, password) = self.pair()?;
        let user = ctx.login(user, password, LoginMode::Admin)?;
        require_admin(&user)?;
        Ok(user)
    }
}

/// Write lines to stdout.
pub(crate) fn emit<I, S>(lines: I) -> Result<(), CommandError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = std::io::stdout().lock();
    for line in lines {
        writeln!(out, "{}", line.as_ref())?;
    }
    out.flush()?;
    Ok(())
}

/// Print an optional field, or "-" when absent.
pub(crate) fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
