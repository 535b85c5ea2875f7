//! Request and response bodies.

use blivalley_core::model::{
    AuthProvider, EnvironmentSnapshot, LastSession, Milestone, MilestoneDraft, MilestoneId,
    Project, ProjectDraft, ProjectId, ProjectStatus, SessionCapture, SessionId, Task, TaskDraft,
    TaskId, Theme, User, UserId, UserSettings, UserSettingsDraft, WorkSession, WorkStatus,
};
use blivalley_core::progress::ProgressSnapshot;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use services::{
    AuthSession, MilestonePatch, ProfilePatch, ProjectPatch, ProjectSummary, SessionFilter,
    StartSession, StartedSession, StoppedSession, TaskPatch, TaskTime,
};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

//
// ─── AUTH AND USERS ────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub photo_url: Option<Option<String>>,
}

impl From<ProfileRequest> for ProfilePatch {
    fn from(req: ProfileRequest) -> Self {
        Self {
            display_name: req.display_name,
            photo_url: req.photo_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub theme: Option<String>,
    pub notifications: Option<bool>,
    pub capture_enabled: Option<bool>,
    pub capture_open_apps: Option<bool>,
    pub capture_browser_tabs: Option<bool>,
}

impl From<SettingsRequest> for UserSettingsDraft {
    fn from(req: SettingsRequest) -> Self {
        Self {
            theme: req.theme,
            notifications: req.notifications,
            capture_enabled: req.capture_enabled,
            capture_open_apps: req.capture_open_apps,
            capture_browser_tabs: req.capture_browser_tabs,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettingsDto {
    pub theme: Theme,
    pub notifications: bool,
    pub session_capture: SessionCapture,
}

impl From<UserSettings> for SettingsDto {
    fn from(settings: UserSettings) -> Self {
        Self {
            theme: settings.theme(),
            notifications: settings.notifications(),
            session_capture: settings.session_capture(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub provider: AuthProvider,
    pub created_at: DateTime<Utc>,
    pub settings: SettingsDto,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            email: user.email().as_str().to_owned(),
            display_name: user.display_name().to_owned(),
            photo_url: user.photo_url().map(ToOwned::to_owned),
            provider: user.provider(),
            created_at: user.created_at(),
            settings: user.settings().into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthDto {
    pub token: String,
    pub token_type: &'static str,
    pub user: UserDto,
}

impl From<AuthSession> for AuthDto {
    fn from(session: AuthSession) -> Self {
        Self {
            user: UserDto::from(&session.user),
            token: session.token,
            token_type: "Bearer",
        }
    }
}

//
// ─── PROJECTS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub name: String,
    pub notes: Option<String>,
}

impl From<TaskRequest> for TaskDraft {
    fn from(req: TaskRequest) -> Self {
        Self {
            name: req.name,
            notes: req.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MilestoneRequest {
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub tasks: Vec<TaskRequest>,
}

impl From<MilestoneRequest> for MilestoneDraft {
    fn from(req: MilestoneRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            due_date: req.due_date,
            tasks: req.tasks.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub milestones: Vec<MilestoneRequest>,
}

impl From<CreateProjectRequest> for ProjectDraft {
    fn from(req: CreateProjectRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            category: req.category,
            deadline: req.deadline,
            milestones: req.milestones.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub deadline: Option<Option<NaiveDate>>,
}

impl From<UpdateProjectRequest> for ProjectPatch {
    fn from(req: UpdateProjectRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            category: req.category,
            status: req.status,
            deadline: req.deadline,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateMilestoneRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    pub status: Option<WorkStatus>,
}

impl From<UpdateMilestoneRequest> for MilestonePatch {
    fn from(req: UpdateMilestoneRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            due_date: req.due_date,
            status: req.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    pub status: Option<WorkStatus>,
}

impl From<UpdateTaskRequest> for TaskPatch {
    fn from(req: UpdateTaskRequest) -> Self {
        Self {
            name: req.name,
            notes: req.notes,
            status: req.status,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListProjectsQuery {
    pub status: Option<ProjectStatus>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LastSessionDto {
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

impl From<&LastSession> for LastSessionDto {
    fn from(last: &LastSession) -> Self {
        Self {
            timestamp: last.timestamp,
            note: last.note.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskDto {
    pub id: TaskId,
    pub name: String,
    pub status: WorkStatus,
    pub notes: Option<String>,
    pub last_session: Option<LastSessionDto>,
}

impl From<&Task> for TaskDto {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            name: task.name().to_owned(),
            status: task.status(),
            notes: task.notes().map(ToOwned::to_owned),
            last_session: task.last_session().map(LastSessionDto::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MilestoneDto {
    pub id: MilestoneId,
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: WorkStatus,
    pub progress: u8,
    pub tasks: Vec<TaskDto>,
}

impl From<&Milestone> for MilestoneDto {
    fn from(milestone: &Milestone) -> Self {
        Self {
            id: milestone.id(),
            name: milestone.name().to_owned(),
            description: milestone.description().map(ToOwned::to_owned),
            due_date: milestone.due_date(),
            status: milestone.status(),
            progress: milestone.progress().percent,
            tasks: milestone.tasks().iter().map(TaskDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectDto {
    pub id: ProjectId,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: ProjectStatus,
    pub deadline: Option<NaiveDate>,
    pub progress: u8,
    pub milestones: Vec<MilestoneDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl From<&Project> for ProjectDto {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id(),
            owner_id: project.owner_id(),
            name: project.name().to_owned(),
            description: project.description().map(ToOwned::to_owned),
            category: project.category().map(ToOwned::to_owned),
            status: project.status(),
            deadline: project.deadline(),
            progress: project.progress(),
            milestones: project.milestones().iter().map(MilestoneDto::from).collect(),
            created_at: project.created_at(),
            updated_at: project.updated_at(),
            version: project.version(),
        }
    }
}

/// Project plus the id of the milestone or task a request just created.
#[derive(Debug, Serialize)]
pub struct CreatedInProjectDto<I: Serialize> {
    pub id: I,
    pub project: ProjectDto,
}

#[derive(Debug, Serialize)]
pub struct ProgressDto {
    pub total: u32,
    pub not_started: u32,
    pub in_progress: u32,
    pub completed: u32,
    pub percent: u8,
}

impl From<ProgressSnapshot> for ProgressDto {
    fn from(s: ProgressSnapshot) -> Self {
        Self {
            total: s.total,
            not_started: s.not_started,
            in_progress: s.in_progress,
            completed: s.completed,
            percent: s.percent,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskTimeDto {
    pub milestone_id: MilestoneId,
    pub task_id: TaskId,
    pub tracked_secs: i64,
    pub sessions: u32,
}

impl From<&TaskTime> for TaskTimeDto {
    fn from(t: &TaskTime) -> Self {
        Self {
            milestone_id: t.milestone_id,
            task_id: t.task_id,
            tracked_secs: t.tracked_secs,
            sessions: t.sessions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryDto {
    pub project_id: ProjectId,
    pub status: ProjectStatus,
    pub progress: ProgressDto,
    pub tracked_secs: i64,
    pub tasks: Vec<TaskTimeDto>,
}

impl From<&ProjectSummary> for SummaryDto {
    fn from(summary: &ProjectSummary) -> Self {
        Self {
            project_id: summary.project.id(),
            status: summary.project.status(),
            progress: summary.progress.into(),
            tracked_secs: summary.tracked_secs,
            tasks: summary.tasks.iter().map(TaskTimeDto::from).collect(),
        }
    }
}

//
// ─── WORK SESSIONS ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub project_id: ProjectId,
    pub milestone_id: MilestoneId,
    pub task_id: TaskId,
    pub note: Option<String>,
    pub environment: Option<EnvironmentSnapshot>,
}

impl From<StartSessionRequest> for StartSession {
    fn from(req: StartSessionRequest) -> Self {
        Self {
            project_id: req.project_id,
            milestone_id: req.milestone_id,
            task_id: req.task_id,
            note: req.note,
            environment: req.environment,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StopSessionRequest {
    pub note: Option<String>,
    #[serde(default)]
    pub complete_task: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListSessionsQuery {
    pub project_id: Option<ProjectId>,
    pub task_id: Option<TaskId>,
    pub limit: Option<u32>,
}

impl From<ListSessionsQuery> for SessionFilter {
    fn from(q: ListSessionsQuery) -> Self {
        Self {
            project_id: q.project_id,
            task_id: q.task_id,
            limit: q.limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionDto {
    pub id: SessionId,
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub milestone_id: MilestoneId,
    pub task_id: TaskId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub duration_secs: Option<i64>,
    pub note: Option<String>,
    pub environment: Option<EnvironmentSnapshot>,
}

impl From<&WorkSession> for SessionDto {
    fn from(s: &WorkSession) -> Self {
        let target = s.target();
        Self {
            id: s.id(),
            user_id: s.user_id(),
            project_id: target.project_id,
            milestone_id: target.milestone_id,
            task_id: target.task_id,
            started_at: s.started_at(),
            ended_at: s.ended_at(),
            active: s.is_active(),
            duration_secs: s.duration_secs(),
            note: s.note().map(ToOwned::to_owned),
            environment: s.environment().cloned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StartedDto {
    pub session: SessionDto,
    pub stopped: Option<SessionDto>,
    pub project: ProjectDto,
}

impl From<&StartedSession> for StartedDto {
    fn from(started: &StartedSession) -> Self {
        Self {
            session: SessionDto::from(&started.session),
            stopped: started.stopped.as_ref().map(SessionDto::from),
            project: ProjectDto::from(&started.project),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StoppedDto {
    pub session: SessionDto,
    pub project: Option<ProjectDto>,
}

impl From<&StoppedSession> for StoppedDto {
    fn from(stopped: &StoppedSession) -> Self {
        Self {
            session: SessionDto::from(&stopped.session),
            project: stopped.project.as_ref().map(ProjectDto::from),
        }
    }
}
