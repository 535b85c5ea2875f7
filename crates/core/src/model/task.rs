use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::TaskId;
use crate::model::status::WorkStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TaskError {
    #[error("task name cannot be empty")]
    EmptyName,
}

/// Summary of the most recent work session that touched a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastSession {
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

impl LastSession {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, note: Option<String>) -> Self {
        Self {
            timestamp,
            note: normalize_text(note),
        }
    }
}

/// Smallest trackable unit of work within a milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    name: String,
    status: WorkStatus,
    notes: Option<String>,
    last_session: Option<LastSession>,
}

impl Task {
    /// Creates a not-yet-started task.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::EmptyName` if name is empty or whitespace-only.
    pub fn new(id: TaskId, name: impl Into<String>, notes: Option<String>) -> Result<Self, TaskError> {
        Self::from_persisted(id, name, WorkStatus::NotStarted, notes, None)
    }

    /// Rehydrate a task from storage.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::EmptyName` if the stored name is blank.
    pub fn from_persisted(
        id: TaskId,
        name: impl Into<String>,
        status: WorkStatus,
        notes: Option<String>,
        last_session: Option<LastSession>,
    ) -> Result<Self, TaskError> {
        Ok(Self {
            id,
            name: validate_name(name.into())?,
            status,
            notes: normalize_text(notes),
            last_session,
        })
    }

    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn status(&self) -> WorkStatus {
        self.status
    }

    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    #[must_use]
    pub fn last_session(&self) -> Option<&LastSession> {
        self.last_session.as_ref()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == WorkStatus::Completed
    }

    /// # Errors
    ///
    /// Returns `TaskError::EmptyName` if name is blank.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), TaskError> {
        self.name = validate_name(name.into())?;
        Ok(())
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = normalize_text(notes);
    }

    pub fn set_status(&mut self, status: WorkStatus) {
        self.status = status;
    }

    /// Marks the task as being worked on. Completed tasks are reopened.
    pub fn start_work(&mut self) {
        self.status = WorkStatus::InProgress;
    }

    pub fn record_session(&mut self, summary: LastSession) {
        self.last_session = Some(summary);
    }
}

fn validate_name(name: String) -> Result<String, TaskError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TaskError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

pub(crate) fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn new_task_starts_not_started() {
        let task = Task::new(TaskId::generate(), "  Draft outline ", None).unwrap();
        assert_eq!(task.name(), "Draft outline");
        assert_eq!(task.status(), WorkStatus::NotStarted);
        assert!(task.last_session().is_none());
    }

    #[test]
    fn rejects_blank_name() {
        let err = Task::new(TaskId::generate(), " ", None).unwrap_err();
        assert_eq!(err, TaskError::EmptyName);
    }

    #[test]
    fn blank_notes_become_none() {
        let mut task = Task::new(TaskId::generate(), "A", Some("  ".into())).unwrap();
        assert_eq!(task.notes(), None);
        task.set_notes(Some(" keep ".into()));
        assert_eq!(task.notes(), Some("keep"));
    }

    #[test]
    fn start_work_reopens_completed_task() {
        let mut task = Task::new(TaskId::generate(), "A", None).unwrap();
        task.set_status(WorkStatus::Completed);
        task.start_work();
        assert_eq!(task.status(), WorkStatus::InProgress);
    }

    #[test]
    fn record_session_replaces_summary() {
        let mut task = Task::new(TaskId::generate(), "A", None).unwrap();
        task.record_session(LastSession::new(fixed_now(), Some("first".into())));
        task.record_session(LastSession::new(fixed_now(), Some(" ".into())));
        let last = task.last_session().unwrap();
        assert_eq!(last.timestamp, fixed_now());
        assert_eq!(last.note, None);
    }
}
