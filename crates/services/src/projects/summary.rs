use std::collections::HashMap;

use blivalley_core::model::{MilestoneId, Project, TaskId, WorkSession};
use blivalley_core::progress::ProgressSnapshot;

/// Time tracked against one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTime {
    pub milestone_id: MilestoneId,
    pub task_id: TaskId,
    pub tracked_secs: i64,
    pub sessions: u32,
}

/// Progress counts and tracked time for a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub project: Project,
    pub progress: ProgressSnapshot,
    /// Sum of ended session durations, including sessions on removed tasks.
    pub tracked_secs: i64,
    pub tasks: Vec<TaskTime>,
}

impl ProjectSummary {
    /// Builds the summary in milestone/task order. Active sessions count
    /// towards `sessions` but not towards tracked time.
    #[must_use]
    pub fn build(project: Project, sessions: &[WorkSession]) -> Self {
        let mut per_task: HashMap<TaskId, (i64, u32)> = HashMap::new();
        let mut tracked_secs = 0_i64;
        for session in sessions.iter().filter(|s| s.project_id() == project.id()) {
            let secs = session.duration_secs().unwrap_or(0);
            tracked_secs = tracked_secs.saturating_add(secs);
            let entry = per_task.entry(session.target().task_id).or_default();
            entry.0 = entry.0.saturating_add(secs);
            entry.1 = entry.1.saturating_add(1);
        }

        let tasks = project
            .milestones()
            .iter()
            .flat_map(|m| m.tasks().iter().map(move |t| (m.id(), t.id())))
            .map(|(milestone_id, task_id)| {
                let (tracked_secs, sessions) = per_task.get(&task_id).copied().unwrap_or_default();
                TaskTime {
                    milestone_id,
                    task_id,
                    tracked_secs,
                    sessions,
                }
            })
            .collect();

        Self {
            progress: project.progress_snapshot(),
            project,
            tracked_secs,
            tasks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blivalley_core::model::{
        MilestoneDraft, NewWorkSession, ProjectDraft, ProjectId, SessionId, TaskDraft, TaskRef,
        UserId,
    };
    use blivalley_core::time::fixed_now;
    use chrono::Duration;

    fn project() -> Project {
        ProjectDraft {
            name: "P".into(),
            milestones: vec![MilestoneDraft {
                name: "M".into(),
                tasks: vec![
                    TaskDraft {
                        name: "A".into(),
                        notes: None,
                    },
                    TaskDraft {
                        name: "B".into(),
                        notes: None,
                    },
                ],
                ..MilestoneDraft::default()
            }],
            ..ProjectDraft::default()
        }
        .validate(UserId::new(1), fixed_now())
        .unwrap()
        .assign_id(ProjectId::new(7))
    }

    fn session(id: u64, target: TaskRef, minutes: Option<i64>) -> WorkSession {
        let mut s = NewWorkSession::start(UserId::new(1), target, fixed_now(), None, None)
            .assign_id(SessionId::new(id));
        if let Some(m) = minutes {
            s.stop(fixed_now() + Duration::minutes(m), None).unwrap();
        }
        s
    }

    #[test]
    fn sums_ended_sessions_per_task() {
        let project = project();
        let m = &project.milestones()[0];
        let a = TaskRef {
            project_id: project.id(),
            milestone_id: m.id(),
            task_id: m.tasks()[0].id(),
        };
        let sessions = vec![
            session(1, a, Some(10)),
            session(2, a, Some(5)),
            session(3, a, None),
        ];

        let summary = ProjectSummary::build(project, &sessions);
        assert_eq!(summary.tracked_secs, 900);
        assert_eq!(summary.tasks.len(), 2);
        assert_eq!(summary.tasks[0].tracked_secs, 900);
        assert_eq!(summary.tasks[0].sessions, 3);
        assert_eq!(summary.tasks[1].tracked_secs, 0);
        assert_eq!(summary.progress.total, 2);
    }
}
