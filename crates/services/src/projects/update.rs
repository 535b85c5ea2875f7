use blivalley_core::Clock;
use blivalley_core::model::{Project, ProjectError, ProjectId, UserId};
use storage::repository::{ProjectRepository, StorageError};
use tracing::{debug, warn};

use crate::error::ProjectServiceError;

/// Attempts per optimistic project write before a conflict is surfaced.
pub(crate) const MAX_ATTEMPTS: u32 = 3;

/// Load a project the caller owns. Foreign projects read as missing.
pub(crate) async fn load_owned(
    projects: &dyn ProjectRepository,
    owner: UserId,
    id: ProjectId,
) -> Result<Project, ProjectServiceError> {
    match projects.get_project(id).await? {
        Some(project) if project.is_owned_by(owner) => Ok(project),
        _ => Err(ProjectServiceError::NotFound),
    }
}

/// Load, mutate and write back a project with its loaded version.
///
/// `apply` runs against a fresh copy on every attempt, so it must not rely on
/// state captured from an earlier attempt.
pub(crate) async fn mutate_owned<T, F>(
    projects: &dyn ProjectRepository,
    clock: &Clock,
    owner: UserId,
    id: ProjectId,
    mut apply: F,
) -> Result<(Project, T), ProjectServiceError>
where
    F: FnMut(&mut Project) -> Result<T, ProjectError> + Send,
    T: Send,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let mut project = load_owned(projects, owner, id).await?;
        let out = apply(&mut project)?;
        project.touch(clock.now());

        match projects.update_project(&project).await {
            Ok(version) => {
                project.set_version(version);
                return Ok((project, out));
            }
            Err(StorageError::Conflict) => {
                debug!(project_id = %id, attempt, "project version conflict, reloading");
            }
            Err(StorageError::NotFound) => return Err(ProjectServiceError::NotFound),
            Err(e) => return Err(e.into()),
        }
    }

    warn!(project_id = %id, attempts = MAX_ATTEMPTS, "giving up on contended project update");
    Err(ProjectServiceError::Conflict)
}
