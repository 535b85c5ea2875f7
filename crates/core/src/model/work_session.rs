use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{MilestoneId, ProjectId, SessionId, TaskId, UserId};
use crate::model::task::{normalize_text, LastSession};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WorkSessionError {
    #[error("work session already ended")]
    AlreadyEnded,

    #[error("ended_at is before started_at")]
    InvalidTimeRange,

    #[error("active work session cannot carry an end time")]
    ActiveWithEnd,
}

/// A browser tab open when a session started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserTab {
    pub title: String,
    pub url: String,
}

/// Open apps and browser tabs captured at session start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    #[serde(default)]
    pub open_apps: Vec<String>,
    #[serde(default)]
    pub browser_tabs: Vec<BrowserTab>,
}

impl EnvironmentSnapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.open_apps.is_empty() && self.browser_tabs.is_empty()
    }
}

/// Where a session's work went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskRef {
    pub project_id: ProjectId,
    pub milestone_id: MilestoneId,
    pub task_id: TaskId,
}

/// A session that has been started but not stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkSession {
    pub user_id: UserId,
    pub target: TaskRef,
    pub started_at: DateTime<Utc>,
    pub note: Option<String>,
    pub environment: Option<EnvironmentSnapshot>,
}

impl NewWorkSession {
    #[must_use]
    pub fn start(
        user_id: UserId,
        target: TaskRef,
        started_at: DateTime<Utc>,
        note: Option<String>,
        environment: Option<EnvironmentSnapshot>,
    ) -> Self {
        Self {
            user_id,
            target,
            started_at,
            note: normalize_text(note),
            environment: environment.filter(|env| !env.is_empty()),
        }
    }

    #[must_use]
    pub fn assign_id(self, id: SessionId) -> WorkSession {
        WorkSession {
            id,
            user_id: self.user_id,
            target: self.target,
            started_at: self.started_at,
            ended_at: None,
            note: self.note,
            environment: self.environment,
        }
    }
}

/// A timed interval of work against a single task.
///
/// A session is active exactly while `ended_at` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkSession {
    id: SessionId,
    user_id: UserId,
    target: TaskRef,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    note: Option<String>,
    environment: Option<EnvironmentSnapshot>,
}

impl WorkSession {
    /// Rehydrate a session from storage.
    ///
    /// # Errors
    ///
    /// Returns `WorkSessionError::InvalidTimeRange` if the end precedes the start,
    /// or `WorkSessionError::ActiveWithEnd` if the active flag disagrees with the end.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: SessionId,
        user_id: UserId,
        target: TaskRef,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
        active: bool,
        note: Option<String>,
        environment: Option<EnvironmentSnapshot>,
    ) -> Result<Self, WorkSessionError> {
        if active && ended_at.is_some() {
            return Err(WorkSessionError::ActiveWithEnd);
        }
        if let Some(end) = ended_at {
            if end < started_at {
                return Err(WorkSessionError::InvalidTimeRange);
            }
        }
        Ok(Self {
            id,
            user_id,
            target,
            started_at,
            ended_at,
            note: normalize_text(note),
            environment,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn target(&self) -> TaskRef {
        self.target
    }

    #[must_use]
    pub fn project_id(&self) -> ProjectId {
        self.target.project_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    #[must_use]
    pub fn environment(&self) -> Option<&EnvironmentSnapshot> {
        self.environment.as_ref()
    }

    /// Whole seconds between start and end; `None` while active.
    #[must_use]
    pub fn duration_secs(&self) -> Option<i64> {
        self.ended_at
            .map(|end| (end - self.started_at).num_seconds().max(0))
    }

    /// Ends the session. A `Some` note replaces the current one.
    ///
    /// # Errors
    ///
    /// Returns `WorkSessionError::AlreadyEnded` if the session was stopped before,
    /// or `WorkSessionError::InvalidTimeRange` if `at` precedes the start.
    pub fn stop(&mut self, at: DateTime<Utc>, note: Option<String>) -> Result<(), WorkSessionError> {
        if !self.is_active() {
            return Err(WorkSessionError::AlreadyEnded);
        }
        if at < self.started_at {
            return Err(WorkSessionError::InvalidTimeRange);
        }
        self.ended_at = Some(at);
        if note.is_some() {
            self.note = normalize_text(note);
        }
        Ok(())
    }

    pub fn set_note(&mut self, note: Option<String>) {
        self.note = normalize_text(note);
    }

    /// The task summary this session produces at its latest transition.
    #[must_use]
    pub fn summary(&self) -> LastSession {
        LastSession::new(
            self.ended_at.unwrap_or(self.started_at),
            self.note.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn target() -> TaskRef {
        TaskRef {
            project_id: ProjectId::new(1),
            milestone_id: MilestoneId::generate(),
            task_id: TaskId::generate(),
        }
    }

    fn started() -> WorkSession {
        NewWorkSession::start(UserId::new(1), target(), fixed_now(), Some("kickoff".into()), None)
            .assign_id(SessionId::new(3))
    }

    #[test]
    fn new_session_is_active_without_duration() {
        let s = started();
        assert!(s.is_active());
        assert_eq!(s.duration_secs(), None);
        assert_eq!(s.summary().timestamp, fixed_now());
        assert_eq!(s.summary().note.as_deref(), Some("kickoff"));
    }

    #[test]
    fn stop_sets_end_and_duration() {
        let mut s = started();
        let end = fixed_now() + Duration::minutes(25);
        s.stop(end, Some("wrapped up".into())).unwrap();
        assert!(!s.is_active());
        assert_eq!(s.duration_secs(), Some(1500));
        assert_eq!(s.note(), Some("wrapped up"));
        assert_eq!(s.summary().timestamp, end);
    }

    #[test]
    fn stop_without_note_keeps_existing_note() {
        let mut s = started();
        s.stop(fixed_now(), None).unwrap();
        assert_eq!(s.note(), Some("kickoff"));
    }

    #[test]
    fn stop_twice_fails() {
        let mut s = started();
        s.stop(fixed_now(), None).unwrap();
        assert_eq!(s.stop(fixed_now(), None).unwrap_err(), WorkSessionError::AlreadyEnded);
    }

    #[test]
    fn stop_before_start_fails() {
        let mut s = started();
        let err = s.stop(fixed_now() - Duration::seconds(1), None).unwrap_err();
        assert_eq!(err, WorkSessionError::InvalidTimeRange);
        assert!(s.is_active());
    }

    #[test]
    fn empty_environment_is_dropped() {
        let s = NewWorkSession::start(
            UserId::new(1),
            target(),
            fixed_now(),
            None,
            Some(EnvironmentSnapshot::default()),
        );
        assert!(s.environment.is_none());
    }

    #[test]
    fn persisted_active_with_end_is_rejected() {
        let err = WorkSession::from_persisted(
            SessionId::new(1),
            UserId::new(1),
            target(),
            fixed_now(),
            Some(fixed_now()),
            true,
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, WorkSessionError::ActiveWithEnd);
    }
}
