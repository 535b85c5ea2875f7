use blivalley_core::model::{
    AuthProvider, EnvironmentSnapshot, LastSession, Milestone, MilestoneId, Project, ProjectId,
    ProjectStatus, SessionCapture, SessionId, Task, TaskId, TaskRef, Theme, User, UserId,
    UserSettings, WorkSession, WorkStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Unique-index violations become `Conflict`; everything else is a connection failure.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn project_id_from_i64(v: i64) -> Result<ProjectId, StorageError> {
    Ok(ProjectId::new(i64_to_u64("project_id", v)?))
}

pub(crate) fn session_id_from_i64(v: i64) -> Result<SessionId, StorageError> {
    Ok(SessionId::new(i64_to_u64("session_id", v)?))
}

fn parse_uuid(field: &'static str, raw: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(raw).map_err(|e| StorageError::Serialization(format!("invalid {field}: {e}")))
}

pub(crate) fn bool_to_i64(v: bool) -> i64 {
    i64::from(v)
}

//
// ─── PROJECT DOCUMENT ──────────────────────────────────────────────────────────
//

#[derive(Serialize, Deserialize)]
struct LastSessionDoc {
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct TaskDoc {
    id: Uuid,
    name: String,
    status: WorkStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_session: Option<LastSessionDoc>,
}

#[derive(Serialize, Deserialize)]
struct MilestoneDoc {
    id: Uuid,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDate>,
    status: WorkStatus,
    #[serde(default)]
    tasks: Vec<TaskDoc>,
}

impl From<&Task> for TaskDoc {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id().as_uuid(),
            name: task.name().to_owned(),
            status: task.status(),
            notes: task.notes().map(ToOwned::to_owned),
            last_session: task.last_session().map(|s| LastSessionDoc {
                timestamp: s.timestamp,
                note: s.note.clone(),
            }),
        }
    }
}

impl From<&Milestone> for MilestoneDoc {
    fn from(milestone: &Milestone) -> Self {
        Self {
            id: milestone.id().as_uuid(),
            name: milestone.name().to_owned(),
            description: milestone.description().map(ToOwned::to_owned),
            due_date: milestone.due_date(),
            status: milestone.status(),
            tasks: milestone.tasks().iter().map(TaskDoc::from).collect(),
        }
    }
}

impl TaskDoc {
    fn into_task(self) -> Result<Task, StorageError> {
        Task::from_persisted(
            TaskId::from_uuid(self.id),
            self.name,
            self.status,
            self.notes,
            self.last_session
                .map(|s| LastSession::new(s.timestamp, s.note)),
        )
        .map_err(ser)
    }
}

impl MilestoneDoc {
    fn into_milestone(self) -> Result<Milestone, StorageError> {
        let tasks = self
            .tasks
            .into_iter()
            .map(TaskDoc::into_task)
            .collect::<Result<Vec<_>, _>>()?;
        Milestone::from_persisted(
            MilestoneId::from_uuid(self.id),
            self.name,
            self.description,
            self.due_date,
            self.status,
            tasks,
        )
        .map_err(ser)
    }
}

pub(crate) fn milestones_to_json(milestones: &[Milestone]) -> Result<String, StorageError> {
    let docs: Vec<MilestoneDoc> = milestones.iter().map(MilestoneDoc::from).collect();
    serde_json::to_string(&docs).map_err(ser)
}

fn milestones_from_json(raw: &str) -> Result<Vec<Milestone>, StorageError> {
    let docs: Vec<MilestoneDoc> = serde_json::from_str(raw).map_err(ser)?;
    docs.into_iter().map(MilestoneDoc::into_milestone).collect()
}

pub(crate) fn map_project_row(row: &SqliteRow) -> Result<Project, StorageError> {
    let status: String = row.try_get("status").map_err(ser)?;
    let milestones: String = row.try_get("milestones").map_err(ser)?;
    Project::from_persisted(
        project_id_from_i64(row.try_get("id").map_err(ser)?)?,
        user_id_from_i64(row.try_get("owner_id").map_err(ser)?)?,
        row.try_get("name").map_err(ser)?,
        row.try_get("description").map_err(ser)?,
        row.try_get("category").map_err(ser)?,
        status.parse::<ProjectStatus>().map_err(ser)?,
        row.try_get("deadline").map_err(ser)?,
        milestones_from_json(&milestones)?,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
        i64_to_u64("version", row.try_get("version").map_err(ser)?)?,
    )
    .map_err(ser)
}

//
// ─── WORK SESSIONS ─────────────────────────────────────────────────────────────
//

pub(crate) fn environment_to_json(
    env: Option<&EnvironmentSnapshot>,
) -> Result<Option<String>, StorageError> {
    env.map(|e| serde_json::to_string(e).map_err(ser)).transpose()
}

pub(crate) fn map_session_row(row: &SqliteRow) -> Result<WorkSession, StorageError> {
    let milestone_id: String = row.try_get("milestone_id").map_err(ser)?;
    let task_id: String = row.try_get("task_id").map_err(ser)?;
    let environment = row
        .try_get::<Option<String>, _>("environment")
        .map_err(ser)?
        .map(|raw| serde_json::from_str::<EnvironmentSnapshot>(&raw).map_err(ser))
        .transpose()?;
    let target = TaskRef {
        project_id: project_id_from_i64(row.try_get("project_id").map_err(ser)?)?,
        milestone_id: MilestoneId::from_uuid(parse_uuid("milestone_id", &milestone_id)?),
        task_id: TaskId::from_uuid(parse_uuid("task_id", &task_id)?),
    };

    WorkSession::from_persisted(
        session_id_from_i64(row.try_get("id").map_err(ser)?)?,
        user_id_from_i64(row.try_get("user_id").map_err(ser)?)?,
        target,
        row.try_get("started_at").map_err(ser)?,
        row.try_get("ended_at").map_err(ser)?,
        row.try_get::<i64, _>("active").map_err(ser)? != 0,
        row.try_get("note").map_err(ser)?,
        environment,
    )
    .map_err(ser)
}

//
// ─── USERS ─────────────────────────────────────────────────────────────────────
//

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    let provider: String = row.try_get("provider").map_err(ser)?;
    let theme: String = row.try_get("theme").map_err(ser)?;
    let flag = |name: &str| -> Result<bool, StorageError> {
        Ok(row.try_get::<i64, _>(name).map_err(ser)? != 0)
    };
    let settings = UserSettings::from_persisted(
        theme.parse::<Theme>().map_err(ser)?,
        flag("notifications")?,
        SessionCapture {
            enabled: flag("capture_enabled")?,
            capture_open_apps: flag("capture_open_apps")?,
            capture_browser_tabs: flag("capture_browser_tabs")?,
        },
    );
    let email: String = row.try_get("email").map_err(ser)?;
    let display_name: String = row.try_get("display_name").map_err(ser)?;

    User::from_persisted(
        user_id_from_i64(row.try_get("id").map_err(ser)?)?,
        &email,
        &display_name,
        row.try_get("photo_url").map_err(ser)?,
        provider.parse::<AuthProvider>().map_err(ser)?,
        row.try_get("password_hash").map_err(ser)?,
        settings,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}
