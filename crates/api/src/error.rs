use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use blivalley_core::model::ProjectError;
use serde::Serialize;
use services::{AuthError, ProjectServiceError, SessionServiceError, UserServiceError};
use storage::repository::StorageError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal server error")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrResponse {
    ok: bool,
    error: &'static str,
    message: String,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal",
        }
    }

    fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!(%detail, "request failed");
        }
        let status = self.status();
        let body = Json(ErrResponse {
            ok: false,
            error: self.code(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => ApiError::NotFound(err.to_string()),
            StorageError::Conflict => ApiError::Conflict(err.to_string()),
            other => ApiError::internal(other),
        }
    }
}

impl From<ProjectServiceError> for ApiError {
    fn from(err: ProjectServiceError) -> Self {
        match err {
            ProjectServiceError::NotFound => ApiError::NotFound(err.to_string()),
            ProjectServiceError::Conflict => ApiError::Conflict(err.to_string()),
            ProjectServiceError::Project(
                ref inner @ (ProjectError::MilestoneNotFound | ProjectError::TaskNotFound),
            ) => ApiError::NotFound(inner.to_string()),
            ProjectServiceError::Project(inner) => ApiError::BadRequest(inner.to_string()),
            ProjectServiceError::Storage(inner) => inner.into(),
            other => ApiError::internal(other),
        }
    }
}

impl From<SessionServiceError> for ApiError {
    fn from(err: SessionServiceError) -> Self {
        match err {
            SessionServiceError::NotFound => ApiError::NotFound(err.to_string()),
            SessionServiceError::AlreadyActive
            | SessionServiceError::AlreadyEnded
            | SessionServiceError::StillActive => ApiError::Conflict(err.to_string()),
            SessionServiceError::Session(inner) => ApiError::BadRequest(inner.to_string()),
            SessionServiceError::Project(inner) => inner.into(),
            SessionServiceError::Storage(inner) => inner.into(),
            other => ApiError::internal(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::WeakPassword { .. } | AuthError::User(_) => {
                ApiError::BadRequest(err.to_string())
            }
            AuthError::EmailTaken | AuthError::AccountNotLinked => {
                ApiError::Conflict(err.to_string())
            }
            AuthError::Storage(inner) => inner.into(),
            other => ApiError::internal(other),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::NotFound => ApiError::NotFound(err.to_string()),
            UserServiceError::User(_) | UserServiceError::Settings(_) => {
                ApiError::BadRequest(err.to_string())
            }
            UserServiceError::Storage(inner) => inner.into(),
            other => ApiError::internal(other),
        }
    }
}
