use blivalley_core::model::{Project, ProjectId, ProjectStatus, UserId, ValidatedProject};

use super::SqliteRepository;
use super::mapping::{db_err, id_to_i64, map_project_row, milestones_to_json, project_id_from_i64};
use crate::repository::{ProjectRepository, StorageError};

const PROJECT_COLUMNS: &str = "id, owner_id, name, description, category, status, deadline, \
     milestones, created_at, updated_at, version";

#[async_trait::async_trait]
impl ProjectRepository for SqliteRepository {
    async fn insert_project(&self, project: &ValidatedProject) -> Result<ProjectId, StorageError> {
        let p = project.project();
        let res = sqlx::query(
            r"
            INSERT INTO projects (owner_id, name, description, category, status, deadline, milestones, created_at, updated_at, version)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(id_to_i64("owner_id", p.owner_id().value())?)
        .bind(p.name())
        .bind(p.description())
        .bind(p.category())
        .bind(p.status().as_str())
        .bind(p.deadline())
        .bind(milestones_to_json(p.milestones())?)
        .bind(p.created_at())
        .bind(p.updated_at())
        .bind(id_to_i64("version", p.version())?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        project_id_from_i64(res.last_insert_rowid())
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StorageError> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("project_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_project_row).transpose()
    }

    async fn list_projects(
        &self,
        owner: UserId,
        status: Option<ProjectStatus>,
        limit: u32,
    ) -> Result<Vec<Project>, StorageError> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects \
             WHERE owner_id = ?1 AND (?2 IS NULL OR status = ?2) \
             ORDER BY updated_at DESC, id DESC LIMIT ?3"
        );
        let rows = sqlx::query(&sql)
            .bind(id_to_i64("owner_id", owner.value())?)
            .bind(status.map(ProjectStatus::as_str))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(map_project_row).collect()
    }

    async fn update_project(&self, project: &Project) -> Result<u64, StorageError> {
        let id = id_to_i64("project_id", project.id().value())?;
        let res = sqlx::query(
            r"
            UPDATE projects SET
                name = ?1,
                description = ?2,
                category = ?3,
                status = ?4,
                deadline = ?5,
                milestones = ?6,
                updated_at = ?7,
                version = version + 1
            WHERE id = ?8 AND version = ?9
            ",
        )
        .bind(project.name())
        .bind(project.description())
        .bind(project.category())
        .bind(project.status().as_str())
        .bind(project.deadline())
        .bind(milestones_to_json(project.milestones())?)
        .bind(project.updated_at())
        .bind(id)
        .bind(id_to_i64("version", project.version())?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM projects WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
            return Err(if exists.is_some() {
                StorageError::Conflict
            } else {
                StorageError::NotFound
            });
        }
        Ok(project.version() + 1)
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), StorageError> {
        // work_sessions rows go with it through ON DELETE CASCADE
        let res = sqlx::query("DELETE FROM projects WHERE id = ?1")
            .bind(id_to_i64("project_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
