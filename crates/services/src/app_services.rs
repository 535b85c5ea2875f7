use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::auth_service::AuthService;
use crate::error::AppServicesError;
use crate::projects::ProjectService;
use crate::token::TokenIssuer;
use crate::user_service::UserService;
use crate::work_sessions::WorkSessionService;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    projects: Arc<ProjectService>,
    work_sessions: Arc<WorkSessionService>,
    auth: Arc<AuthService>,
    users: Arc<UserService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        tokens: TokenIssuer,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, tokens))
    }

    /// Build services over in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock, tokens: TokenIssuer) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, tokens)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, tokens: TokenIssuer) -> Self {
        let projects = Arc::new(ProjectService::new(
            clock.clone(),
            Arc::clone(&storage.projects),
            Arc::clone(&storage.sessions),
        ));
        let work_sessions = Arc::new(WorkSessionService::new(
            clock.clone(),
            Arc::clone(&storage.projects),
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.users),
        ));
        let auth = Arc::new(AuthService::new(clock, Arc::clone(&storage.users), tokens));
        let users = Arc::new(UserService::new(Arc::clone(&storage.users)));

        Self {
            projects,
            work_sessions,
            auth,
            users,
        }
    }

    #[must_use]
    pub fn projects(&self) -> Arc<ProjectService> {
        Arc::clone(&self.projects)
    }

    #[must_use]
    pub fn work_sessions(&self) -> Arc<WorkSessionService> {
        Arc::clone(&self.work_sessions)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }
}
