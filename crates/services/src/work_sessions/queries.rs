use blivalley_core::model::{ProjectId, TaskId, UserId};
use storage::repository::SessionQuery;

pub const DEFAULT_SESSION_LIMIT: u32 = 50;
pub const MAX_SESSION_LIMIT: u32 = 500;

/// Optional filters for listing a user's sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub project_id: Option<ProjectId>,
    pub task_id: Option<TaskId>,
    pub limit: Option<u32>,
}

impl SessionFilter {
    pub(crate) fn into_query(self, user_id: UserId) -> SessionQuery {
        SessionQuery {
            user_id,
            project_id: self.project_id,
            task_id: self.task_id,
            limit: self
                .limit
                .unwrap_or(DEFAULT_SESSION_LIMIT)
                .clamp(1, MAX_SESSION_LIMIT),
        }
    }
}
