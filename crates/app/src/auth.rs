//! Account registration and login.
//!
//! Passwords are hashed with Argon2id and a random salt; only the PHC hash
//! string is stored in the snapshot.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use neupool_core::{AppState, StateError, User, Username, ValidationError};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Minimum length for newly chosen passwords.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user or wrong password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Admin login attempted by a non-admin account.
    #[error("user does not have admin privileges")]
    NotAdmin,

    /// Hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Registration input is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The snapshot rejected the change.
    #[error(transparent)]
    State(StateError),
}

impl From<StateError> for AuthError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::Validation(e) => Self::Validation(e),
            other => Self::State(other),
        }
    }
}

/// Which entry point the login came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMode {
    /// Technician login; any role may sign in.
    #[default]
    User,
    /// Admin login; the account must have the admin role.
    Admin,
}

/// Register a technician account.
///
/// # Errors
///
/// Returns `AuthError::Validation` if the username is invalid or taken, or
/// the password is missing or shorter than [`MIN_PASSWORD_LENGTH`].
#[instrument(skip(state, password))]
pub fn register(state: &AppState, username: &str, password: &str) -> Result<AppState, AuthError> {
    let parsed = Username::parse(username).map_err(ValidationError::from)?;
    if state.user_by_name(parsed.as_str()).is_some() {
        return Err(ValidationError::UsernameTaken.into());
    }
    validate_password(password)?;

    let hash = hash_password(password)?;
    let next = state.register_user(parsed.as_str(), hash)?;
    info!(username = %parsed, "Registered user");
    Ok(next)
}

/// Authenticate a user.
///
/// Usernames are matched case-insensitively.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the user does not exist or the
/// password is wrong, and `AuthError::NotAdmin` for an admin login by a
/// non-admin account.
#[instrument(skip(state, password))]
pub fn login<'a>(
    state: &'a AppState,
    username: &str,
    password: &str,
    mode: LoginMode,
) -> Result<&'a User, AuthError> {
    let Some(user) = state.user_by_name(username.trim()) else {
        warn!("Login failed: unknown user");
        return Err(AuthError::InvalidCredentials);
    };

    if let Err(e) = verify_password(password, &user.password_hash) {
        warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(e);
    }

    if mode == LoginMode::Admin && !user.is_admin() {
        warn!(user_id = %user.id, "Admin login by non-admin user");
        return Err(AuthError::NotAdmin);
    }

    Ok(user)
}

/// Validate a new password.
///
/// # Errors
///
/// Returns a validation error if the password is empty or too short.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the hash is malformed or the
/// password does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
