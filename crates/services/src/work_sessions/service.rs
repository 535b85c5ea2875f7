use std::sync::Arc;

use blivalley_core::Clock;
use blivalley_core::model::{
    EnvironmentSnapshot, LastSession, MilestoneId, NewWorkSession, Project, ProjectError,
    ProjectId, SessionCapture, SessionId, TaskId, TaskRef, UserId, WorkSession, WorkStatus,
};
use chrono::{DateTime, Utc};
use storage::repository::{ProjectRepository, StorageError, UserRepository, WorkSessionRepository};
use tracing::{debug, info, warn};

use super::queries::SessionFilter;
use crate::error::{ProjectServiceError, SessionServiceError};
use crate::projects::update::{load_owned, mutate_owned};

/// Request to start work on a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartSession {
    pub project_id: ProjectId,
    pub milestone_id: MilestoneId,
    pub task_id: TaskId,
    pub note: Option<String>,
    pub environment: Option<EnvironmentSnapshot>,
}

impl StartSession {
    fn target(&self) -> TaskRef {
        TaskRef {
            project_id: self.project_id,
            milestone_id: self.milestone_id,
            task_id: self.task_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedSession {
    pub session: WorkSession,
    /// The session that was active before and got stopped to make room.
    pub stopped: Option<WorkSession>,
    pub project: Project,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoppedSession {
    pub session: WorkSession,
    /// `None` when the task was removed while the session ran.
    pub project: Option<Project>,
}

/// Work-session lifecycle: start, stop, notes and history.
///
/// Each user has at most one active session. Starting a new one stops the
/// previous session first, and storage rejects a second active row.
#[derive(Clone)]
pub struct WorkSessionService {
    clock: Clock,
    projects: Arc<dyn ProjectRepository>,
    sessions: Arc<dyn WorkSessionRepository>,
    users: Arc<dyn UserRepository>,
}

impl WorkSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        projects: Arc<dyn ProjectRepository>,
        sessions: Arc<dyn WorkSessionRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            clock,
            projects,
            sessions,
            users,
        }
    }

    /// Start a session on a task the user owns.
    ///
    /// The task moves to in-progress (a completed task is reopened) and its
    /// last-session summary points at this start. The session row is written
    /// first; the task is only touched once that row holds the active slot.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Project` if the project, milestone or task
    /// is missing, and `SessionServiceError::AlreadyActive` if a concurrent
    /// start won the race.
    pub async fn start(
        &self,
        user: UserId,
        request: StartSession,
    ) -> Result<StartedSession, SessionServiceError> {
        let target = request.target();
        let project = load_owned(self.projects.as_ref(), user, target.project_id).await?;
        project
            .milestone(target.milestone_id)
            .ok_or(ProjectServiceError::Project(ProjectError::MilestoneNotFound))?
            .task(target.task_id)
            .ok_or(ProjectServiceError::Project(ProjectError::TaskNotFound))?;

        let now = self.clock.now();
        let stopped = self.stop_active(user, now).await?;
        let environment = self.capture_settings(user).await?.filter(request.environment);

        let note = request.note;
        let summary = LastSession::new(now, note.clone());
        let new = NewWorkSession::start(user, target, now, note, environment);
        let id = match self.sessions.insert_session(&new).await {
            Ok(id) => id,
            Err(StorageError::Conflict) => {
                warn!(user = %user, "work session start lost a race with another start");
                return Err(SessionServiceError::AlreadyActive);
            }
            Err(e) => return Err(e.into()),
        };

        let updated = mutate_owned(
            self.projects.as_ref(),
            &self.clock,
            user,
            target.project_id,
            |p| {
                p.update_task(target.milestone_id, target.task_id, |task| {
                    task.start_work();
                    task.record_session(summary.clone());
                    Ok(())
                })
            },
        )
        .await;
        let project = match updated {
            Ok((project, ())) => project,
            Err(e) => {
                if let Err(cleanup) = self.sessions.delete_session(id).await {
                    warn!(session_id = %id, error = %cleanup, "could not roll back work session");
                }
                return Err(e.into());
            }
        };

        info!(
            session_id = %id,
            user = %user,
            project_id = %target.project_id,
            task_id = %target.task_id,
            "work session started"
        );
        Ok(StartedSession {
            session: new.assign_id(id),
            stopped,
            project,
        })
    }

    /// End an active session, optionally replacing its note and completing the task.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::NotFound` if the session is not the user's,
    /// or `SessionServiceError::AlreadyEnded` if it was stopped before.
    pub async fn stop(
        &self,
        user: UserId,
        id: SessionId,
        note: Option<String>,
        complete_task: bool,
    ) -> Result<StoppedSession, SessionServiceError> {
        let mut session = self.owned(user, id).await?;
        if !session.is_active() {
            return Err(SessionServiceError::AlreadyEnded);
        }
        session.stop(self.clock.now(), note)?;
        // Task first: if it fails the session stays active and can be stopped again.
        let project = self.record_summary(user, &session, complete_task).await?;
        self.sessions.update_session(&session).await?;

        info!(
            session_id = %id,
            duration_secs = session.duration_secs().unwrap_or_default(),
            complete_task,
            "work session stopped"
        );
        Ok(StoppedSession { session, project })
    }

    /// Replace a session's note. The task's last-session summary follows
    /// when it was produced by this session.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::NotFound` if the session is not the user's.
    pub async fn update_note(
        &self,
        user: UserId,
        id: SessionId,
        note: Option<String>,
    ) -> Result<WorkSession, SessionServiceError> {
        let mut session = self.owned(user, id).await?;
        let before = session.summary();
        session.set_note(note);
        self.sessions.update_session(&session).await?;

        let target = session.target();
        let produced_here = match load_owned(self.projects.as_ref(), user, target.project_id).await {
            Ok(project) => project
                .task(target.milestone_id, target.task_id)
                .and_then(|t| t.last_session())
                .is_some_and(|last| *last == before),
            Err(ProjectServiceError::NotFound) => false,
            Err(e) => return Err(e.into()),
        };
        if produced_here {
            let after = session.summary();
            let refreshed = mutate_owned(
                self.projects.as_ref(),
                &self.clock,
                user,
                target.project_id,
                |p| {
                    p.update_task(target.milestone_id, target.task_id, |task| {
                        if task.last_session() == Some(&before) {
                            task.record_session(after.clone());
                        }
                        Ok(())
                    })
                },
            )
            .await;
            tolerate_missing_task(refreshed)?;
        }
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if repository access fails.
    pub async fn active_session(&self, user: UserId) -> Result<Option<WorkSession>, SessionServiceError> {
        Ok(self.sessions.active_session(user).await?)
    }

    /// # Errors
    ///
    /// Returns `SessionServiceError::NotFound` if the session is not the user's.
    pub async fn get_session(&self, user: UserId, id: SessionId) -> Result<WorkSession, SessionServiceError> {
        self.owned(user, id).await
    }

    /// The user's sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::Storage` if repository access fails.
    pub async fn list_sessions(
        &self,
        user: UserId,
        filter: SessionFilter,
    ) -> Result<Vec<WorkSession>, SessionServiceError> {
        Ok(self.sessions.list_sessions(&filter.into_query(user)).await?)
    }

    /// Delete an ended session.
    ///
    /// # Errors
    ///
    /// Returns `SessionServiceError::StillActive` for an active session.
    pub async fn delete_session(&self, user: UserId, id: SessionId) -> Result<(), SessionServiceError> {
        let session = self.owned(user, id).await?;
        if session.is_active() {
            return Err(SessionServiceError::StillActive);
        }
        self.sessions.delete_session(id).await?;
        debug!(session_id = %id, "work session deleted");
        Ok(())
    }

    async fn owned(&self, user: UserId, id: SessionId) -> Result<WorkSession, SessionServiceError> {
        match self.sessions.get_session(id).await? {
            Some(session) if session.user_id() == user => Ok(session),
            _ => Err(SessionServiceError::NotFound),
        }
    }

    async fn capture_settings(&self, user: UserId) -> Result<SessionCapture, SessionServiceError> {
        Ok(self
            .users
            .get_user(user)
            .await?
            .map(|u| u.settings().session_capture())
            .unwrap_or_default())
    }

    async fn stop_active(
        &self,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<WorkSession>, SessionServiceError> {
        let Some(mut active) = self.sessions.active_session(user).await? else {
            return Ok(None);
        };
        active.stop(now, None)?;
        self.record_summary(user, &active, false).await?;
        self.sessions.update_session(&active).await?;
        info!(session_id = %active.id(), user = %user, "stopped previous active work session");
        Ok(Some(active))
    }

    /// Write the session's summary onto its task, completing the task if asked.
    async fn record_summary(
        &self,
        user: UserId,
        session: &WorkSession,
        complete_task: bool,
    ) -> Result<Option<Project>, SessionServiceError> {
        let target = session.target();
        let summary = session.summary();
        let result = mutate_owned(
            self.projects.as_ref(),
            &self.clock,
            user,
            target.project_id,
            |p| {
                p.update_task(target.milestone_id, target.task_id, |task| {
                    task.record_session(summary.clone());
                    if complete_task {
                        task.set_status(WorkStatus::Completed);
                    }
                    Ok(())
                })
            },
        )
        .await;
        tolerate_missing_task(result)
    }
}

/// A session can outlive its task; skip the task update in that case.
fn tolerate_missing_task(
    result: Result<(Project, ()), ProjectServiceError>,
) -> Result<Option<Project>, SessionServiceError> {
    match result {
        Ok((project, ())) => Ok(Some(project)),
        Err(
            ProjectServiceError::NotFound
            | ProjectServiceError::Project(ProjectError::MilestoneNotFound | ProjectError::TaskNotFound),
        ) => {
            debug!("work session task no longer exists, summary not recorded");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
