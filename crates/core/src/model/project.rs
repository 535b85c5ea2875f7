use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::model::ids::{MilestoneId, ProjectId, TaskId, UserId};
use crate::model::milestone::{Milestone, MilestoneError};
use crate::model::status::ProjectStatus;
use crate::model::task::{normalize_text, Task, TaskError};
use crate::progress::{derive_project_status, ProgressSnapshot};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProjectError {
    #[error("project name cannot be empty")]
    EmptyName,

    #[error("milestone not found")]
    MilestoneNotFound,

    #[error("task not found")]
    TaskNotFound,

    #[error(transparent)]
    Milestone(#[from] MilestoneError),

    #[error(transparent)]
    Task(#[from] TaskError),
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub name: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneDraft {
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub tasks: Vec<TaskDraft>,
}

impl MilestoneDraft {
    /// Builds a milestone with freshly generated ids.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError` if the milestone or any task name is blank.
    pub fn build(self) -> Result<Milestone, ProjectError> {
        let mut milestone = Milestone::new(
            MilestoneId::generate(),
            self.name,
            self.description,
            self.due_date,
        )?;
        for task in self.tasks {
            milestone.add_task(task.build()?);
        }
        milestone.refresh_status();
        Ok(milestone)
    }
}

impl TaskDraft {
    /// # Errors
    ///
    /// Returns `TaskError::EmptyName` if the name is blank.
    pub fn build(self) -> Result<Task, TaskError> {
        Task::new(TaskId::generate(), self.name, self.notes)
    }
}

/// User input for a new project, including any initial milestones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDraft {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub milestones: Vec<MilestoneDraft>,
}

impl ProjectDraft {
    /// Validate the draft into a project awaiting its storage id.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError` if any name is blank.
    pub fn validate(self, owner_id: UserId, now: DateTime<Utc>) -> Result<ValidatedProject, ProjectError> {
        let name = validate_name(self.name)?;
        let milestones = self
            .milestones
            .into_iter()
            .map(MilestoneDraft::build)
            .collect::<Result<Vec<_>, _>>()?;

        let mut project = Project {
            id: ProjectId::new(0),
            owner_id,
            name,
            description: normalize_text(self.description),
            category: normalize_text(self.category),
            status: ProjectStatus::Active,
            deadline: self.deadline,
            milestones,
            progress: 0,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        project.recompute();
        Ok(ValidatedProject(project))
    }
}

/// A validated project that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedProject(Project);

impl ValidatedProject {
    #[must_use]
    pub fn project(&self) -> &Project {
        &self.0
    }

    #[must_use]
    pub fn assign_id(self, id: ProjectId) -> Project {
        Project { id, ..self.0 }
    }
}

//
// ─── PROJECT ───────────────────────────────────────────────────────────────────
//

/// Project aggregate: owns its milestones, which own their tasks.
///
/// Every mutation that touches milestones or tasks recomputes milestone
/// statuses, `progress` and the project status before returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    id: ProjectId,
    owner_id: UserId,
    name: String,
    description: Option<String>,
    category: Option<String>,
    status: ProjectStatus,
    deadline: Option<NaiveDate>,
    milestones: Vec<Milestone>,
    progress: u8,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Project {
    /// Rehydrate a project from storage. Derived fields are recomputed.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::EmptyName` if the stored name is blank.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: ProjectId,
        owner_id: UserId,
        name: String,
        description: Option<String>,
        category: Option<String>,
        status: ProjectStatus,
        deadline: Option<NaiveDate>,
        milestones: Vec<Milestone>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        version: u64,
    ) -> Result<Self, ProjectError> {
        let mut project = Self {
            id,
            owner_id,
            name: validate_name(name)?,
            description: normalize_text(description),
            category: normalize_text(category),
            status,
            deadline,
            milestones,
            progress: 0,
            created_at,
            updated_at,
            version,
        };
        project.refresh_progress();
        Ok(project)
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> ProjectId {
        self.id
    }

    #[must_use]
    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
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
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> ProjectStatus {
        self.status
    }

    #[must_use]
    pub fn deadline(&self) -> Option<NaiveDate> {
        self.deadline
    }

    #[must_use]
    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    /// Completion percentage (0..=100).
    #[must_use]
    pub fn progress(&self) -> u8 {
        self.progress
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Optimistic concurrency counter; bumped by storage on each update.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    #[must_use]
    pub fn milestone(&self, id: MilestoneId) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id() == id)
    }

    #[must_use]
    pub fn task(&self, milestone_id: MilestoneId, task_id: TaskId) -> Option<&Task> {
        self.milestone(milestone_id).and_then(|m| m.task(task_id))
    }

    /// Counts over every task of every milestone.
    #[must_use]
    pub fn progress_snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::from_tasks(self.milestones.iter().flat_map(Milestone::tasks))
    }

    // Metadata (no recomputation: an explicit status is honoured as given)

    /// # Errors
    ///
    /// Returns `ProjectError::EmptyName` if name is blank.
    pub fn rename(&mut self, name: String) -> Result<(), ProjectError> {
        self.name = validate_name(name)?;
        Ok(())
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = normalize_text(description);
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.category = normalize_text(category);
    }

    pub fn set_deadline(&mut self, deadline: Option<NaiveDate>) {
        self.deadline = deadline;
    }

    /// Sets the status, then lets progress correct it. `Archived` always
    /// sticks; `Active` on a finished project becomes `Completed`.
    pub fn set_status(&mut self, status: ProjectStatus) {
        self.status = status;
        self.recompute();
    }

    // Milestones and tasks

    pub fn add_milestone(&mut self, milestone: Milestone) {
        self.milestones.push(milestone);
        self.recompute();
    }

    /// # Errors
    ///
    /// Returns `ProjectError::MilestoneNotFound` if no such milestone exists.
    pub fn remove_milestone(&mut self, id: MilestoneId) -> Result<Milestone, ProjectError> {
        let index = self
            .milestones
            .iter()
            .position(|m| m.id() == id)
            .ok_or(ProjectError::MilestoneNotFound)?;
        let removed = self.milestones.remove(index);
        self.recompute();
        Ok(removed)
    }

    /// Applies `edit` to one milestone, then recomputes.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::MilestoneNotFound` or whatever `edit` returns.
    pub fn update_milestone<T>(
        &mut self,
        id: MilestoneId,
        edit: impl FnOnce(&mut Milestone) -> Result<T, MilestoneError>,
    ) -> Result<T, ProjectError> {
        let milestone = self
            .milestones
            .iter_mut()
            .find(|m| m.id() == id)
            .ok_or(ProjectError::MilestoneNotFound)?;
        let out = edit(milestone)?;
        self.recompute();
        Ok(out)
    }

    /// # Errors
    ///
    /// Returns `ProjectError::MilestoneNotFound` if no such milestone exists.
    pub fn add_task(&mut self, milestone_id: MilestoneId, task: Task) -> Result<(), ProjectError> {
        self.update_milestone(milestone_id, |m| {
            m.add_task(task);
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns `ProjectError::MilestoneNotFound` or `ProjectError::TaskNotFound`.
    pub fn remove_task(
        &mut self,
        milestone_id: MilestoneId,
        task_id: TaskId,
    ) -> Result<Task, ProjectError> {
        self.update_milestone(milestone_id, |m| m.remove_task(task_id))
            .map_err(|err| match err {
                ProjectError::Milestone(MilestoneError::TaskNotFound) => ProjectError::TaskNotFound,
                other => other,
            })
    }

    /// Applies `edit` to one task, then recomputes.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::MilestoneNotFound`, `ProjectError::TaskNotFound`
    /// or whatever `edit` returns.
    pub fn update_task<T>(
        &mut self,
        milestone_id: MilestoneId,
        task_id: TaskId,
        edit: impl FnOnce(&mut Task) -> Result<T, TaskError>,
    ) -> Result<T, ProjectError> {
        let task = self
            .milestones
            .iter_mut()
            .find(|m| m.id() == milestone_id)
            .ok_or(ProjectError::MilestoneNotFound)?
            .task_mut(task_id)
            .ok_or(ProjectError::TaskNotFound)?;
        let out = edit(task)?;
        self.recompute();
        Ok(out)
    }

    /// Re-derives milestone statuses, `progress` and the project status.
    pub fn recompute(&mut self) {
        for milestone in &mut self.milestones {
            milestone.refresh_status();
        }
        let snapshot = self.refresh_progress();
        self.status = derive_project_status(&snapshot, self.status);
    }

    fn refresh_progress(&mut self) -> ProgressSnapshot {
        let snapshot = self.progress_snapshot();
        self.progress = snapshot.percent;
        snapshot
    }
}

fn validate_name(name: String) -> Result<String, ProjectError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ProjectError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WorkStatus;
    use crate::time::fixed_now;

    fn draft() -> ProjectDraft {
        ProjectDraft {
            name: "Garden shed".into(),
            description: Some("  weekend build ".into()),
            category: Some("home".into()),
            deadline: None,
            milestones: vec![
                MilestoneDraft {
                    name: "Foundation".into(),
                    tasks: vec![
                        TaskDraft { name: "Level ground".into(), notes: None },
                        TaskDraft { name: "Pour slab".into(), notes: None },
                    ],
                    ..MilestoneDraft::default()
                },
                MilestoneDraft {
                    name: "Walls".into(),
                    tasks: vec![TaskDraft { name: "Frame".into(), notes: None }],
                    ..MilestoneDraft::default()
                },
            ],
        }
    }

    fn project() -> Project {
        draft()
            .validate(UserId::new(1), fixed_now())
            .unwrap()
            .assign_id(ProjectId::new(7))
    }

    fn first_task(p: &Project) -> (MilestoneId, TaskId) {
        let m = &p.milestones()[0];
        (m.id(), m.tasks()[0].id())
    }

    #[test]
    fn draft_rejects_blank_name() {
        let err = ProjectDraft { name: "  ".into(), ..ProjectDraft::default() }
            .validate(UserId::new(1), fixed_now())
            .unwrap_err();
        assert_eq!(err, ProjectError::EmptyName);
    }

    #[test]
    fn draft_rejects_blank_task_name() {
        let mut d = draft();
        d.milestones[0].tasks.push(TaskDraft::default());
        let err = d.validate(UserId::new(1), fixed_now()).unwrap_err();
        assert_eq!(err, ProjectError::Task(TaskError::EmptyName));
    }

    #[test]
    fn new_project_has_zero_progress() {
        let p = project();
        assert_eq!(p.id(), ProjectId::new(7));
        assert_eq!(p.progress(), 0);
        assert_eq!(p.status(), ProjectStatus::Active);
        assert_eq!(p.description(), Some("weekend build"));
        assert_eq!(p.version(), 1);
    }

    #[test]
    fn completing_task_updates_progress_and_milestone() {
        let mut p = project();
        let (m, t) = first_task(&p);
        p.update_task(m, t, |task| {
            task.set_status(WorkStatus::Completed);
            Ok(())
        })
        .unwrap();

        assert_eq!(p.progress(), 33);
        assert_eq!(p.milestone(m).unwrap().status(), WorkStatus::InProgress);
        assert_eq!(p.status(), ProjectStatus::Active);
    }

    #[test]
    fn finishing_every_task_completes_project() {
        let mut p = project();
        let ids: Vec<_> = p.milestones().iter().map(Milestone::id).collect();
        for id in ids {
            p.update_milestone(id, |m| {
                m.set_status(WorkStatus::Completed);
                Ok(())
            })
            .unwrap();
        }
        assert_eq!(p.progress(), 100);
        assert_eq!(p.status(), ProjectStatus::Completed);

        // Adding new work reopens it.
        let m = p.milestones()[1].id();
        p.add_task(m, Task::new(TaskId::generate(), "Paint", None).unwrap())
            .unwrap();
        assert_eq!(p.progress(), 75);
        assert_eq!(p.status(), ProjectStatus::Active);
        assert_eq!(p.milestone(m).unwrap().status(), WorkStatus::InProgress);
    }

    #[test]
    fn explicit_status_follows_progress() {
        let mut p = project();
        for (m, t) in p
            .milestones()
            .iter()
            .flat_map(|m| m.tasks().iter().map(move |t| (m.id(), t.id())))
            .collect::<Vec<_>>()
        {
            p.update_task(m, t, |task| {
                task.set_status(WorkStatus::Completed);
                Ok(())
            })
            .unwrap();
        }
        assert_eq!(p.status(), ProjectStatus::Completed);

        p.set_status(ProjectStatus::Active);
        assert_eq!(p.status(), ProjectStatus::Completed);

        p.set_status(ProjectStatus::Archived);
        assert_eq!(p.status(), ProjectStatus::Archived);
    }

    #[test]
    fn archived_project_is_not_reactivated() {
        let mut p = project();
        p.set_status(ProjectStatus::Archived);
        let (m, t) = first_task(&p);
        p.update_task(m, t, |task| {
            task.start_work();
            Ok(())
        })
        .unwrap();
        assert_eq!(p.status(), ProjectStatus::Archived);
    }

    #[test]
    fn removing_task_recomputes_progress() {
        let mut p = project();
        let (m, t) = first_task(&p);
        let second = p.milestones()[0].tasks()[1].id();
        p.update_task(m, second, |task| {
            task.set_status(WorkStatus::Completed);
            Ok(())
        })
        .unwrap();
        assert_eq!(p.progress(), 33);

        p.remove_task(m, t).unwrap();
        assert_eq!(p.progress(), 50);
    }

    #[test]
    fn removing_unknown_task_reports_task_not_found() {
        let mut p = project();
        let (m, _) = first_task(&p);
        let err = p.remove_task(m, TaskId::generate()).unwrap_err();
        assert_eq!(err, ProjectError::TaskNotFound);
    }

    #[test]
    fn removing_milestone_drops_its_tasks() {
        let mut p = project();
        let walls = p.milestones()[1].id();
        p.update_milestone(walls, |m| {
            m.set_status(WorkStatus::Completed);
            Ok(())
        })
        .unwrap();
        assert_eq!(p.progress(), 33);

        p.remove_milestone(walls).unwrap();
        assert_eq!(p.progress(), 0);
        assert_eq!(p.milestones().len(), 1);
        assert_eq!(
            p.remove_milestone(walls).unwrap_err(),
            ProjectError::MilestoneNotFound
        );
    }

    #[test]
    fn task_lookup_requires_matching_milestone() {
        let p = project();
        let (_, t) = first_task(&p);
        let other = p.milestones()[1].id();
        assert!(p.task(other, t).is_none());
    }
}
