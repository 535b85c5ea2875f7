//! Shared error types for the services crate.

use thiserror::Error;

use blivalley_core::model::{ProjectError, SettingsError, UserError, WorkSessionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProjectService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProjectServiceError {
    #[error("project not found")]
    NotFound,
    #[error("project was modified concurrently, try again")]
    Conflict,
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `WorkSessionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionServiceError {
    #[error("work session not found")]
    NotFound,
    #[error("another work session is already active")]
    AlreadyActive,
    #[error("work session already ended")]
    AlreadyEnded,
    #[error("active work session must be stopped before it can be deleted")]
    StillActive,
    #[error(transparent)]
    Session(#[from] WorkSessionError),
    #[error(transparent)]
    Project(#[from] ProjectServiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("email is already registered")]
    EmailTaken,
    #[error("email is registered with a different sign-in method")]
    AccountNotLinked,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("token encoding failed: {0}")]
    Token(String),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `UserService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserServiceError {
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
