mod ids;
mod milestone;
mod project;
mod settings;
mod status;
mod task;
mod user;
mod work_session;

pub use ids::{MilestoneId, ParseIdError, ProjectId, SessionId, TaskId, UserId};
pub use status::{ParseStatusError, ProjectStatus, WorkStatus};

pub use milestone::{Milestone, MilestoneError};
pub use project::{MilestoneDraft, Project, ProjectDraft, ProjectError, TaskDraft, ValidatedProject};
pub use settings::{SessionCapture, SettingsError, Theme, UserSettings, UserSettingsDraft};
pub use task::{LastSession, Task, TaskError};
pub use user::{AuthProvider, Email, NewUser, User, UserError};
pub use work_session::{
    BrowserTab, EnvironmentSnapshot, NewWorkSession, TaskRef, WorkSession, WorkSessionError,
};
