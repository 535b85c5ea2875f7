#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod error;
pub mod projects;
pub mod token;
pub mod user_service;
pub mod work_sessions;

pub use blivalley_core::Clock;

pub use app_services::AppServices;
pub use auth_service::{AuthService, AuthSession, MIN_PASSWORD_LEN, ProviderIdentity};
pub use error::{
    AppServicesError, AuthError, ProjectServiceError, SessionServiceError, UserServiceError,
};
pub use projects::{
    DEFAULT_PROJECT_LIMIT, MAX_PROJECT_LIMIT, MilestonePatch, ProjectPatch, ProjectService, ProjectSummary, TaskPatch, TaskTime,
};
pub use token::{Claims, DEFAULT_TOKEN_TTL_HOURS, TokenIssuer};
pub use user_service::{ProfilePatch, UserService};
pub use work_sessions::{
    DEFAULT_SESSION_LIMIT, MAX_SESSION_LIMIT, SessionFilter, StartSession, StartedSession, StoppedSession, WorkSessionService,
};
