pub mod service;
pub mod summary;
pub(crate) mod update;

pub use service::{
    DEFAULT_PROJECT_LIMIT, MAX_PROJECT_LIMIT, MilestonePatch, ProjectPatch, ProjectService, TaskPatch,
};
pub use summary::{ProjectSummary, TaskTime};
