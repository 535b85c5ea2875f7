use std::sync::Arc;

use blivalley_core::Clock;
use blivalley_core::model::{
    MilestoneDraft, MilestoneId, Project, ProjectDraft, ProjectError, ProjectId, ProjectStatus,
    TaskDraft, TaskId, UserId, WorkStatus,
};
use chrono::NaiveDate;
use storage::repository::{ProjectRepository, WorkSessionRepository};
use tracing::info;

use super::summary::ProjectSummary;
use super::update::{load_owned, mutate_owned};
use crate::error::ProjectServiceError;

pub const DEFAULT_PROJECT_LIMIT: u32 = 100;
pub const MAX_PROJECT_LIMIT: u32 = 500;

/// Partial project update. Outer `None` leaves a field unchanged; for the
/// clearable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    pub deadline: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestonePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub status: Option<WorkStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub notes: Option<Option<String>>,
    pub status: Option<WorkStatus>,
}

/// Project, milestone and task CRUD scoped to the owning user.
#[derive(Clone)]
pub struct ProjectService {
    clock: Clock,
    projects: Arc<dyn ProjectRepository>,
    sessions: Arc<dyn WorkSessionRepository>,
}

impl ProjectService {
    #[must_use]
    pub fn new(
        clock: Clock,
        projects: Arc<dyn ProjectRepository>,
        sessions: Arc<dyn WorkSessionRepository>,
    ) -> Self {
        Self {
            clock,
            projects,
            sessions,
        }
    }

    /// Validate and store a new project.
    ///
    /// # Errors
    ///
    /// Returns `ProjectServiceError::Project` for validation failures.
    /// Returns `ProjectServiceError::Storage` if persistence fails.
    pub async fn create_project(
        &self,
        owner: UserId,
        draft: ProjectDraft,
    ) -> Result<Project, ProjectServiceError> {
        let validated = draft.validate(owner, self.clock.now())?;
        let id = self.projects.insert_project(&validated).await?;
        info!(project_id = %id, owner = %owner, "project created");
        Ok(validated.assign_id(id))
    }

    /// # Errors
    ///
    /// Returns `ProjectServiceError::NotFound` if missing or owned by someone else.
    pub async fn get_project(
        &self,
        owner: UserId,
        id: ProjectId,
    ) -> Result<Project, ProjectServiceError> {
        load_owned(self.projects.as_ref(), owner, id).await
    }

    /// List the owner's projects, most recently updated first. `limit` is
    /// clamped to `1..=MAX_PROJECT_LIMIT`.
    ///
    /// # Errors
    ///
    /// Returns `ProjectServiceError::Storage` if repository access fails.
    pub async fn list_projects(
        &self,
        owner: UserId,
        status: Option<ProjectStatus>,
        limit: u32,
    ) -> Result<Vec<Project>, ProjectServiceError> {
        let limit = limit.clamp(1, MAX_PROJECT_LIMIT);
        Ok(self.projects.list_projects(owner, status, limit).await?)
    }

    /// Apply a metadata patch. An explicit status goes through the same
    /// progress rules as any other edit.
    ///
    /// # Errors
    ///
    /// Returns `ProjectServiceError` for validation, ownership, conflict or storage failures.
    pub async fn update_project(
        &self,
        owner: UserId,
        id: ProjectId,
        patch: ProjectPatch,
    ) -> Result<Project, ProjectServiceError> {
        let (project, ()) = self
            .mutate(owner, id, |p| {
                let patch = patch.clone();
                if let Some(name) = patch.name {
                    p.rename(name)?;
                }
                if let Some(description) = patch.description {
                    p.set_description(description);
                }
                if let Some(category) = patch.category {
                    p.set_category(category);
                }
                if let Some(deadline) = patch.deadline {
                    p.set_deadline(deadline);
                }
                if let Some(status) = patch.status {
                    p.set_status(status);
                }
                Ok(())
            })
            .await?;
        Ok(project)
    }

    /// Delete a project and every work session recorded against it.
    ///
    /// # Errors
    ///
    /// Returns `ProjectServiceError::NotFound` if missing or owned by someone else.
    pub async fn delete_project(&self, owner: UserId, id: ProjectId) -> Result<(), ProjectServiceError> {
        load_owned(self.projects.as_ref(), owner, id).await?;
        self.projects.delete_project(id).await?;
        info!(project_id = %id, "project deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ProjectServiceError` for validation, ownership, conflict or storage failures.
    pub async fn add_milestone(
        &self,
        owner: UserId,
        id: ProjectId,
        draft: MilestoneDraft,
    ) -> Result<(Project, MilestoneId), ProjectServiceError> {
        self.mutate(owner, id, |p| {
            let milestone = draft.clone().build()?;
            let milestone_id = milestone.id();
            p.add_milestone(milestone);
            Ok(milestone_id)
        })
        .await
    }

    /// Patch a milestone. An explicit status cascades to its tasks.
    ///
    /// # Errors
    ///
    /// Returns `ProjectServiceError` for validation, ownership, conflict or storage failures.
    pub async fn update_milestone(
        &self,
        owner: UserId,
        id: ProjectId,
        milestone_id: MilestoneId,
        patch: MilestonePatch,
    ) -> Result<Project, ProjectServiceError> {
        let (project, ()) = self
            .mutate(owner, id, |p| {
                let patch = patch.clone();
                p.update_milestone(milestone_id, |m| {
                    if let Some(name) = patch.name {
                        m.rename(name)?;
                    }
                    if let Some(description) = patch.description {
                        m.set_description(description);
                    }
                    if let Some(due_date) = patch.due_date {
                        m.set_due_date(due_date);
                    }
                    if let Some(status) = patch.status {
                        m.set_status(status);
                    }
                    Ok(())
                })
            })
            .await?;
        Ok(project)
    }

    /// # Errors
    ///
    /// Returns `ProjectServiceError` if the milestone is missing or the write fails.
    pub async fn remove_milestone(
        &self,
        owner: UserId,
        id: ProjectId,
        milestone_id: MilestoneId,
    ) -> Result<Project, ProjectServiceError> {
        let (project, _) = self
            .mutate(owner, id, |p| p.remove_milestone(milestone_id))
            .await?;
        Ok(project)
    }

    /// # Errors
    ///
    /// Returns `ProjectServiceError` for validation, ownership, conflict or storage failures.
    pub async fn add_task(
        &self,
        owner: UserId,
        id: ProjectId,
        milestone_id: MilestoneId,
        draft: TaskDraft,
    ) -> Result<(Project, TaskId), ProjectServiceError> {
        self.mutate(owner, id, |p| {
            let task = draft.clone().build()?;
            let task_id = task.id();
            p.add_task(milestone_id, task)?;
            Ok(task_id)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `ProjectServiceError` for validation, ownership, conflict or storage failures.
    pub async fn update_task(
        &self,
        owner: UserId,
        id: ProjectId,
        milestone_id: MilestoneId,
        task_id: TaskId,
        patch: TaskPatch,
    ) -> Result<Project, ProjectServiceError> {
        let (project, ()) = self
            .mutate(owner, id, |p| {
                let patch = patch.clone();
                p.update_task(milestone_id, task_id, |t| {
                    if let Some(name) = patch.name {
                        t.rename(name)?;
                    }
                    if let Some(notes) = patch.notes {
                        t.set_notes(notes);
                    }
                    if let Some(status) = patch.status {
                        t.set_status(status);
                    }
                    Ok(())
                })
            })
            .await?;
        Ok(project)
    }

    /// # Errors
    ///
    /// Returns `ProjectServiceError` if the task is missing or the write fails.
    pub async fn remove_task(
        &self,
        owner: UserId,
        id: ProjectId,
        milestone_id: MilestoneId,
        task_id: TaskId,
    ) -> Result<Project, ProjectServiceError> {
        let (project, _) = self
            .mutate(owner, id, |p| p.remove_task(milestone_id, task_id))
            .await?;
        Ok(project)
    }

    /// Progress counts plus time tracked per task.
    ///
    /// # Errors
    ///
    /// Returns `ProjectServiceError::NotFound` if missing or owned by someone else.
    pub async fn project_summary(
        &self,
        owner: UserId,
        id: ProjectId,
    ) -> Result<ProjectSummary, ProjectServiceError> {
        let project = load_owned(self.projects.as_ref(), owner, id).await?;
        let sessions = self.sessions.project_sessions(id).await?;
        Ok(ProjectSummary::build(project, &sessions))
    }

    async fn mutate<T, F>(
        &self,
        owner: UserId,
        id: ProjectId,
        apply: F,
    ) -> Result<(Project, T), ProjectServiceError>
    where
        F: FnMut(&mut Project) -> Result<T, ProjectError> + Send,
        T: Send,
    {
        mutate_owned(self.projects.as_ref(), &self.clock, owner, id, apply).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blivalley_core::time::fixed_now;
    use storage::repository::Storage;

    fn service() -> ProjectService {
        let storage = Storage::in_memory();
        ProjectService::new(Clock::manual(fixed_now()), storage.projects, storage.sessions)
    }

    fn task(name: &str) -> TaskDraft {
        TaskDraft {
            name: name.into(),
            notes: None,
        }
    }

    fn draft() -> ProjectDraft {
        ProjectDraft {
            name: "Novel".into(),
            milestones: vec![MilestoneDraft {
                name: "Draft".into(),
                tasks: vec![task("Outline"), task("Chapter 1"), task("Chapter 2")],
                ..MilestoneDraft::default()
            }],
            ..ProjectDraft::default()
        }
    }

    const OWNER: UserId = UserId::new(1);

    #[tokio::test]
    async fn completing_tasks_drives_progress_and_status() {
        let svc = service();
        let project = svc.create_project(OWNER, draft()).await.unwrap();
        let m = project.milestones()[0].id();
        let tasks: Vec<TaskId> = project.milestones()[0].tasks().iter().map(|t| t.id()).collect();

        let done = TaskPatch {
            status: Some(WorkStatus::Completed),
            ..TaskPatch::default()
        };
        let p = svc
            .update_task(OWNER, project.id(), m, tasks[0], done.clone())
            .await
            .unwrap();
        assert_eq!(p.progress(), 33);
        assert_eq!(p.milestones()[0].status(), WorkStatus::InProgress);
        assert_eq!(p.status(), ProjectStatus::Active);

        svc.update_task(OWNER, project.id(), m, tasks[1], done.clone())
            .await
            .unwrap();
        let p = svc
            .update_task(OWNER, project.id(), m, tasks[2], done)
            .await
            .unwrap();
        assert_eq!(p.progress(), 100);
        assert_eq!(p.milestones()[0].status(), WorkStatus::Completed);
        assert_eq!(p.status(), ProjectStatus::Completed);

        let (p, _) = svc
            .add_task(OWNER, project.id(), m, task("Epilogue"))
            .await
            .unwrap();
        assert_eq!(p.progress(), 75);
        assert_eq!(p.status(), ProjectStatus::Active);
        assert_eq!(p.milestones()[0].status(), WorkStatus::InProgress);
    }

    #[tokio::test]
    async fn milestone_status_cascades_to_tasks() {
        let svc = service();
        let project = svc.create_project(OWNER, draft()).await.unwrap();
        let m = project.milestones()[0].id();

        let p = svc
            .update_milestone(
                OWNER,
                project.id(),
                m,
                MilestonePatch {
                    status: Some(WorkStatus::Completed),
                    ..MilestonePatch::default()
                },
            )
            .await
            .unwrap();
        assert!(p.milestones()[0].tasks().iter().all(|t| t.is_completed()));
        assert_eq!(p.progress(), 100);

        let p = svc
            .update_milestone(
                OWNER,
                project.id(),
                m,
                MilestonePatch {
                    status: Some(WorkStatus::NotStarted),
                    ..MilestonePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(p.progress(), 0);
        assert_eq!(p.milestones()[0].status(), WorkStatus::NotStarted);
    }

    #[tokio::test]
    async fn explicit_project_status_is_kept() {
        let svc = service();
        let project = svc.create_project(OWNER, draft()).await.unwrap();
        let p = svc
            .update_project(
                OWNER,
                project.id(),
                ProjectPatch {
                    status: Some(ProjectStatus::Archived),
                    deadline: Some(NaiveDate::from_ymd_opt(2030, 1, 1)),
                    ..ProjectPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(p.status(), ProjectStatus::Archived);
        assert_eq!(p.version(), 2);

        let m = p.milestones()[0].id();
        let p = svc
            .update_milestone(
                OWNER,
                project.id(),
                m,
                MilestonePatch {
                    status: Some(WorkStatus::Completed),
                    ..MilestonePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(p.status(), ProjectStatus::Archived);

        let p = svc
            .update_project(
                OWNER,
                project.id(),
                ProjectPatch {
                    deadline: Some(None),
                    ..ProjectPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(p.deadline(), None);
    }

    #[tokio::test]
    async fn reactivating_finished_project_is_corrected() {
        let svc = service();
        let project = svc.create_project(OWNER, draft()).await.unwrap();
        let m = project.milestones()[0].id();
        let p = svc
            .update_milestone(
                OWNER,
                project.id(),
                m,
                MilestonePatch {
                    status: Some(WorkStatus::Completed),
                    ..MilestonePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(p.status(), ProjectStatus::Completed);

        let p = svc
            .update_project(
                OWNER,
                project.id(),
                ProjectPatch {
                    status: Some(ProjectStatus::Active),
                    ..ProjectPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(p.progress(), 100);
        assert_eq!(p.status(), ProjectStatus::Completed);
    }

    #[tokio::test]
    async fn other_users_cannot_see_projects() {
        let svc = service();
        let project = svc.create_project(OWNER, draft()).await.unwrap();
        let stranger = UserId::new(2);

        assert!(matches!(
            svc.get_project(stranger, project.id()).await.unwrap_err(),
            ProjectServiceError::NotFound
        ));
        assert!(matches!(
            svc.delete_project(stranger, project.id()).await.unwrap_err(),
            ProjectServiceError::NotFound
        ));
        assert!(svc.list_projects(stranger, None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn removing_unknown_task_fails() {
        let svc = service();
        let project = svc.create_project(OWNER, draft()).await.unwrap();
        let m = project.milestones()[0].id();
        let err = svc
            .remove_task(OWNER, project.id(), m, TaskId::generate())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProjectServiceError::Project(ProjectError::TaskNotFound)
        ));

        let (p, new_milestone) = svc
            .add_milestone(
                OWNER,
                project.id(),
                MilestoneDraft {
                    name: "Edit".into(),
                    ..MilestoneDraft::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(p.milestones().len(), 2);
        let p = svc
            .remove_milestone(OWNER, project.id(), new_milestone)
            .await
            .unwrap();
        assert_eq!(p.milestones().len(), 1);
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let svc = service();
        let err = svc
            .create_project(
                OWNER,
                ProjectDraft {
                    name: "   ".into(),
                    ..ProjectDraft::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectServiceError::Project(ProjectError::EmptyName)));
    }
}
