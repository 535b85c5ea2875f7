use blivalley_core::model::{NewWorkSession, ProjectId, SessionId, UserId, WorkSession};

use super::SqliteRepository;
use super::mapping::{
    bool_to_i64, db_err, environment_to_json, id_to_i64, map_session_row, session_id_from_i64,
};
use crate::repository::{SessionQuery, StorageError, WorkSessionRepository};

const SESSION_COLUMNS: &str =
    "id, user_id, project_id, milestone_id, task_id, started_at, ended_at, active, note, environment";

#[async_trait::async_trait]
impl WorkSessionRepository for SqliteRepository {
    async fn insert_session(&self, session: &NewWorkSession) -> Result<SessionId, StorageError> {
        // idx_work_sessions_one_active turns a second active row into a unique violation
        let res = sqlx::query(
            r"
            INSERT INTO work_sessions (user_id, project_id, milestone_id, task_id, started_at, ended_at, active, note, environment)
            VALUES (?1, ?2, ?3, ?4, ?5, NULL, 1, ?6, ?7)
            ",
        )
        .bind(id_to_i64("user_id", session.user_id.value())?)
        .bind(id_to_i64("project_id", session.target.project_id.value())?)
        .bind(session.target.milestone_id.as_uuid().to_string())
        .bind(session.target.task_id.as_uuid().to_string())
        .bind(session.started_at)
        .bind(session.note.as_deref())
        .bind(environment_to_json(session.environment.as_ref())?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        session_id_from_i64(res.last_insert_rowid())
    }

    async fn update_session(&self, session: &WorkSession) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE work_sessions SET ended_at = ?1, active = ?2, note = ?3
            WHERE id = ?4
            ",
        )
        .bind(session.ended_at())
        .bind(bool_to_i64(session.is_active()))
        .bind(session.note())
        .bind(id_to_i64("session_id", session.id().value())?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<WorkSession>, StorageError> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM work_sessions WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("session_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(map_session_row).transpose()
    }

    async fn active_session(&self, user: UserId) -> Result<Option<WorkSession>, StorageError> {
        let sql =
            format!("SELECT {SESSION_COLUMNS} FROM work_sessions WHERE user_id = ?1 AND active = 1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("user_id", user.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(map_session_row).transpose()
    }

    async fn list_sessions(&self, query: &SessionQuery) -> Result<Vec<WorkSession>, StorageError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions \
             WHERE user_id = ?1 \
               AND (?2 IS NULL OR project_id = ?2) \
               AND (?3 IS NULL OR task_id = ?3) \
             ORDER BY started_at DESC, id DESC LIMIT ?4"
        );
        let project = query
            .project_id
            .map(|p| id_to_i64("project_id", p.value()))
            .transpose()?;
        let rows = sqlx::query(&sql)
            .bind(id_to_i64("user_id", query.user_id.value())?)
            .bind(project)
            .bind(query.task_id.map(|t| t.as_uuid().to_string()))
            .bind(i64::from(query.limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(map_session_row).collect()
    }

    async fn project_sessions(&self, project: ProjectId) -> Result<Vec<WorkSession>, StorageError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM work_sessions WHERE project_id = ?1 ORDER BY started_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(id_to_i64("project_id", project.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(map_session_row).collect()
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM work_sessions WHERE id = ?1")
            .bind(id_to_i64("session_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
