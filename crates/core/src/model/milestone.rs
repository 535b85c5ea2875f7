use chrono::NaiveDate;
use thiserror::Error;

use crate::model::ids::{MilestoneId, TaskId};
use crate::model::status::WorkStatus;
use crate::model::task::{normalize_text, Task};
use crate::progress::{derive_milestone_status, ProgressSnapshot};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MilestoneError {
    #[error("milestone name cannot be empty")]
    EmptyName,

    #[error("task not found in milestone")]
    TaskNotFound,
}

/// Named grouping of tasks within a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    id: MilestoneId,
    name: String,
    description: Option<String>,
    due_date: Option<NaiveDate>,
    status: WorkStatus,
    tasks: Vec<Task>,
}

impl Milestone {
    /// Creates an empty, not-started milestone.
    ///
    /// # Errors
    ///
    /// Returns `MilestoneError::EmptyName` if name is empty or whitespace-only.
    pub fn new(
        id: MilestoneId,
        name: impl Into<String>,
        description: Option<String>,
        due_date: Option<NaiveDate>,
    ) -> Result<Self, MilestoneError> {
        Self::from_persisted(id, name, description, due_date, WorkStatus::NotStarted, Vec::new())
    }

    /// Rehydrate a milestone from storage.
    ///
    /// # Errors
    ///
    /// Returns `MilestoneError::EmptyName` if the stored name is blank.
    pub fn from_persisted(
        id: MilestoneId,
        name: impl Into<String>,
        description: Option<String>,
        due_date: Option<NaiveDate>,
        status: WorkStatus,
        tasks: Vec<Task>,
    ) -> Result<Self, MilestoneError> {
        Ok(Self {
            id,
            name: validate_name(name.into())?,
            description: normalize_text(description),
            due_date,
            status,
            tasks,
        })
    }

    #[must_use]
    pub fn id(&self) -> MilestoneId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    #[must_use]
    pub fn status(&self) -> WorkStatus {
        self.status
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id() == id)
    }

    #[must_use]
    pub fn progress(&self) -> ProgressSnapshot {
        ProgressSnapshot::from_tasks(&self.tasks)
    }

    /// # Errors
    ///
    /// Returns `MilestoneError::EmptyName` if name is blank.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), MilestoneError> {
        self.name = validate_name(name.into())?;
        Ok(())
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = normalize_text(description);
    }

    pub fn set_due_date(&mut self, due_date: Option<NaiveDate>) {
        self.due_date = due_date;
    }

    /// Explicitly sets the milestone status, cascading to tasks.
    ///
    /// `Completed` completes every task and `NotStarted` resets every task;
    /// `InProgress` leaves tasks as they are.
    pub fn set_status(&mut self, status: WorkStatus) {
        match status {
            WorkStatus::Completed | WorkStatus::NotStarted => {
                for task in &mut self.tasks {
                    task.set_status(status);
                }
            }
            WorkStatus::InProgress => {}
        }
        self.status = status;
        self.refresh_status();
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Removes and returns the task with the given id.
    ///
    /// # Errors
    ///
    /// Returns `MilestoneError::TaskNotFound` if no such task exists.
    pub fn remove_task(&mut self, id: TaskId) -> Result<Task, MilestoneError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id() == id)
            .ok_or(MilestoneError::TaskNotFound)?;
        Ok(self.tasks.remove(index))
    }

    /// Re-derives the status from the tasks.
    pub fn refresh_status(&mut self) {
        self.status = derive_milestone_status(&self.tasks, self.status);
    }
}

fn validate_name(name: String) -> Result<String, MilestoneError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(MilestoneError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milestone_with_tasks(n: usize) -> Milestone {
        let mut m = Milestone::new(MilestoneId::generate(), "Beta", None, None).unwrap();
        for i in 0..n {
            m.add_task(Task::new(TaskId::generate(), format!("task {i}"), None).unwrap());
        }
        m
    }

    #[test]
    fn completing_milestone_completes_tasks() {
        let mut m = milestone_with_tasks(3);
        m.set_status(WorkStatus::Completed);
        assert!(m.tasks().iter().all(Task::is_completed));
        assert_eq!(m.status(), WorkStatus::Completed);
        assert_eq!(m.progress().percent, 100);
    }

    #[test]
    fn resetting_milestone_resets_tasks() {
        let mut m = milestone_with_tasks(2);
        m.set_status(WorkStatus::Completed);
        m.set_status(WorkStatus::NotStarted);
        assert!(m.tasks().iter().all(|t| t.status() == WorkStatus::NotStarted));
        assert_eq!(m.status(), WorkStatus::NotStarted);
    }

    #[test]
    fn starting_milestone_leaves_tasks_alone() {
        let mut m = milestone_with_tasks(2);
        m.set_status(WorkStatus::InProgress);
        assert!(m.tasks().iter().all(|t| t.status() == WorkStatus::NotStarted));
        assert_eq!(m.status(), WorkStatus::InProgress);
    }

    #[test]
    fn refresh_follows_tasks() {
        let mut m = milestone_with_tasks(2);
        let first = m.tasks()[0].id();
        m.task_mut(first).unwrap().start_work();
        m.refresh_status();
        assert_eq!(m.status(), WorkStatus::InProgress);
    }

    #[test]
    fn remove_missing_task_errors() {
        let mut m = milestone_with_tasks(1);
        let err = m.remove_task(TaskId::generate()).unwrap_err();
        assert_eq!(err, MilestoneError::TaskNotFound);
        assert_eq!(m.tasks().len(), 1);
    }

    #[test]
    fn trims_name_and_filters_blank_description() {
        let m = Milestone::new(MilestoneId::generate(), "  Launch ", Some("   ".into()), None)
            .unwrap();
        assert_eq!(m.name(), "Launch");
        assert_eq!(m.description(), None);
    }
}
