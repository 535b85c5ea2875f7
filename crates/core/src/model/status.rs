use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} status: {raw}")]
pub struct ParseStatusError {
    kind: &'static str,
    raw: String,
}

//
// ─── WORK STATUS ───────────────────────────────────────────────────────────────
//

/// Progress state shared by milestones and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl WorkStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WorkStatus::NotStarted => "not_started",
            WorkStatus::InProgress => "in_progress",
            WorkStatus::Completed => "completed",
        }
    }

    #[must_use]
    pub fn is_started(self) -> bool {
        !matches!(self, WorkStatus::NotStarted)
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(ParseStatusError {
                kind: "work",
                raw: other.to_owned(),
            }),
        }
    }
}

//
// ─── PROJECT STATUS ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            other => Err(ParseStatusError {
                kind: "project",
                raw: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_status_parses_storage_form() {
        for status in [
            WorkStatus::NotStarted,
            WorkStatus::InProgress,
            WorkStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<WorkStatus>().unwrap(), status);
        }
    }

    #[test]
    fn project_status_rejects_unknown() {
        let err = "paused".parse::<ProjectStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown project status: paused");
    }

    #[test]
    fn statuses_serialize_snake_case() {
        let json = serde_json::to_string(&WorkStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
