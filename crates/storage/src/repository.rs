use async_trait::async_trait;
use blivalley_core::model::{
    Email, NewUser, NewWorkSession, Project, ProjectId, ProjectStatus, SessionId, TaskId, User,
    UserId, ValidatedProject, WorkSession,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Filter for listing a user's work sessions, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionQuery {
    pub user_id: UserId,
    pub project_id: Option<ProjectId>,
    pub task_id: Option<TaskId>,
    pub limit: u32,
}

impl SessionQuery {
    #[must_use]
    pub fn for_user(user_id: UserId, limit: u32) -> Self {
        Self {
            user_id,
            project_id: None,
            task_id: None,
            limit,
        }
    }

    fn matches(&self, session: &WorkSession) -> bool {
        session.user_id() == self.user_id
            && self.project_id.is_none_or(|p| session.project_id() == p)
            && self.task_id.is_none_or(|t| session.target().task_id == t)
    }
}

/// Repository contract for project documents.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Store a new project and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the project cannot be stored.
    async fn insert_project(&self, project: &ValidatedProject) -> Result<ProjectId, StorageError>;

    /// Fetch a project by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StorageError>;

    /// List an owner's projects, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn list_projects(
        &self,
        owner: UserId,
        status: Option<ProjectStatus>,
        limit: u32,
    ) -> Result<Vec<Project>, StorageError>;

    /// Replace the stored document if its version still equals `project.version()`.
    ///
    /// Returns the new version.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the stored version moved on, or
    /// `StorageError::NotFound` if the project is gone.
    async fn update_project(&self, project: &Project) -> Result<u64, StorageError>;

    /// Delete a project together with its work sessions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn delete_project(&self, id: ProjectId) -> Result<(), StorageError>;
}

/// Repository contract for work sessions.
#[async_trait]
pub trait WorkSessionRepository: Send + Sync {
    /// Store a new active session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the user already has an active session.
    async fn insert_session(&self, session: &NewWorkSession) -> Result<SessionId, StorageError>;

    /// Persist end time and note changes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn update_session(&self, session: &WorkSession) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn get_session(&self, id: SessionId) -> Result<Option<WorkSession>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn active_session(&self, user: UserId) -> Result<Option<WorkSession>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn list_sessions(&self, query: &SessionQuery) -> Result<Vec<WorkSession>, StorageError>;

    /// Every session recorded against a project, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn project_sessions(&self, project: ProjectId) -> Result<Vec<WorkSession>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError>;
}

/// Repository contract for user accounts and their settings.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the email is already registered.
    async fn insert_user(&self, user: &NewUser) -> Result<UserId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StorageError>;

    /// Persist profile fields and settings.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn update_user(&self, user: &User) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    projects: Arc<Mutex<HashMap<ProjectId, Project>>>,
    sessions: Arc<Mutex<HashMap<SessionId, WorkSession>>>,
    users: Arc<Mutex<HashMap<UserId, User>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

#[async_trait]
impl ProjectRepository for InMemoryRepository {
    async fn insert_project(&self, project: &ValidatedProject) -> Result<ProjectId, StorageError> {
        let id = ProjectId::new(self.allocate_id());
        let mut guard = lock(&self.projects)?;
        guard.insert(id, project.clone().assign_id(id));
        Ok(id)
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StorageError> {
        let guard = lock(&self.projects)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_projects(
        &self,
        owner: UserId,
        status: Option<ProjectStatus>,
        limit: u32,
    ) -> Result<Vec<Project>, StorageError> {
        let guard = lock(&self.projects)?;
        let mut found: Vec<Project> = guard
            .values()
            .filter(|p| p.is_owned_by(owner))
            .filter(|p| status.is_none_or(|s| p.status() == s))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.updated_at()
                .cmp(&a.updated_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(found)
    }

    async fn update_project(&self, project: &Project) -> Result<u64, StorageError> {
        let mut guard = lock(&self.projects)?;
        let stored = guard.get_mut(&project.id()).ok_or(StorageError::NotFound)?;
        if stored.version() != project.version() {
            return Err(StorageError::Conflict);
        }
        let version = project.version() + 1;
        let mut next = project.clone();
        next.set_version(version);
        *stored = next;
        Ok(version)
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), StorageError> {
        let mut projects = lock(&self.projects)?;
        projects.remove(&id).ok_or(StorageError::NotFound)?;
        let mut sessions = lock(&self.sessions)?;
        sessions.retain(|_, s| s.project_id() != id);
        Ok(())
    }
}

#[async_trait]
impl WorkSessionRepository for InMemoryRepository {
    async fn insert_session(&self, session: &NewWorkSession) -> Result<SessionId, StorageError> {
        let mut guard = lock(&self.sessions)?;
        if guard
            .values()
            .any(|s| s.user_id() == session.user_id && s.is_active())
        {
            return Err(StorageError::Conflict);
        }
        let id = SessionId::new(self.allocate_id());
        guard.insert(id, session.clone().assign_id(id));
        Ok(id)
    }

    async fn update_session(&self, session: &WorkSession) -> Result<(), StorageError> {
        let mut guard = lock(&self.sessions)?;
        let stored = guard.get_mut(&session.id()).ok_or(StorageError::NotFound)?;
        *stored = session.clone();
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<WorkSession>, StorageError> {
        let guard = lock(&self.sessions)?;
        Ok(guard.get(&id).cloned())
    }

    async fn active_session(&self, user: UserId) -> Result<Option<WorkSession>, StorageError> {
        let guard = lock(&self.sessions)?;
        Ok(guard
            .values()
            .find(|s| s.user_id() == user && s.is_active())
            .cloned())
    }

    async fn list_sessions(&self, query: &SessionQuery) -> Result<Vec<WorkSession>, StorageError> {
        let guard = lock(&self.sessions)?;
        let mut found: Vec<WorkSession> =
            guard.values().filter(|s| query.matches(s)).cloned().collect();
        found.sort_by(|a, b| {
            b.started_at()
                .cmp(&a.started_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        found.truncate(usize::try_from(query.limit).unwrap_or(usize::MAX));
        Ok(found)
    }

    async fn project_sessions(&self, project: ProjectId) -> Result<Vec<WorkSession>, StorageError> {
        let guard = lock(&self.sessions)?;
        let mut found: Vec<WorkSession> = guard
            .values()
            .filter(|s| s.project_id() == project)
            .cloned()
            .collect();
        found.sort_by_key(|s| (s.started_at(), s.id()));
        Ok(found)
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        let mut guard = lock(&self.sessions)?;
        guard.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_user(&self, user: &NewUser) -> Result<UserId, StorageError> {
        let mut guard = lock(&self.users)?;
        if guard.values().any(|u| u.email() == &user.email) {
            return Err(StorageError::Conflict);
        }
        let id = UserId::new(self.allocate_id());
        guard.insert(id, user.clone().assign_id(id));
        Ok(id)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let guard = lock(&self.users)?;
        Ok(guard.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StorageError> {
        let guard = lock(&self.users)?;
        Ok(guard.values().find(|u| u.email() == email).cloned())
    }

    async fn update_user(&self, user: &User) -> Result<(), StorageError> {
        let mut guard = lock(&self.users)?;
        let stored = guard.get_mut(&user.id()).ok_or(StorageError::NotFound)?;
        *stored = user.clone();
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub projects: Arc<dyn ProjectRepository>,
    pub sessions: Arc<dyn WorkSessionRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let projects: Arc<dyn ProjectRepository> = Arc::new(repo.clone());
        let sessions: Arc<dyn WorkSessionRepository> = Arc::new(repo.clone());
        let users: Arc<dyn UserRepository> = Arc::new(repo);
        Self {
            projects,
            sessions,
            users,
        }
    }
}
