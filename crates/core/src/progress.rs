//! Aggregation rules that turn task states into milestone status, project
//! progress and project status.

use crate::model::{ProjectStatus, Task, WorkStatus};

/// Task counts and completion percentage for a set of tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub total: u32,
    pub not_started: u32,
    pub in_progress: u32,
    pub completed: u32,
    pub percent: u8,
}

impl ProgressSnapshot {
    /// Counts the given tasks by status.
    #[must_use]
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut snapshot = Self::default();
        for task in tasks {
            snapshot.total = snapshot.total.saturating_add(1);
            match task.status() {
                WorkStatus::NotStarted => snapshot.not_started = snapshot.not_started.saturating_add(1),
                WorkStatus::InProgress => snapshot.in_progress = snapshot.in_progress.saturating_add(1),
                WorkStatus::Completed => snapshot.completed = snapshot.completed.saturating_add(1),
            }
        }
        snapshot.percent = completion_percent(snapshot.completed, snapshot.total);
        snapshot
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// `round(100 * completed / total)`, rounding halves up. Zero when `total` is zero.
#[must_use]
pub fn completion_percent(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed.min(total));
    let total = u64::from(total);
    let percent = (200 * completed + total) / (2 * total);
    u8::try_from(percent).unwrap_or(100)
}

/// Status a milestone should carry given its tasks.
///
/// `current` only matters when no task has been started: an explicitly
/// started milestone stays in progress, and a milestone without tasks keeps
/// whatever it was set to.
#[must_use]
pub fn derive_milestone_status(tasks: &[Task], current: WorkStatus) -> WorkStatus {
    if tasks.is_empty() {
        return current;
    }
    if tasks.iter().all(Task::is_completed) {
        return WorkStatus::Completed;
    }
    if tasks.iter().any(|t| t.status().is_started()) {
        return WorkStatus::InProgress;
    }
    if current == WorkStatus::InProgress {
        WorkStatus::InProgress
    } else {
        WorkStatus::NotStarted
    }
}

/// Status a project should carry given its progress.
#[must_use]
pub fn derive_project_status(snapshot: &ProgressSnapshot, current: ProjectStatus) -> ProjectStatus {
    match current {
        ProjectStatus::Archived => ProjectStatus::Archived,
        ProjectStatus::Active if snapshot.is_finished() => ProjectStatus::Completed,
        ProjectStatus::Completed if !snapshot.is_finished() && snapshot.total > 0 => {
            ProjectStatus::Active
        }
        other => other,
    }
}
