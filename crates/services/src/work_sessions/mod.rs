mod queries;
pub mod service;

pub use queries::{DEFAULT_SESSION_LIMIT, MAX_SESSION_LIMIT, SessionFilter};
pub use service::{StartSession, StartedSession, StoppedSession, WorkSessionService};
