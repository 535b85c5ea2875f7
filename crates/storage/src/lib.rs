#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, ProjectRepository, SessionQuery, Storage, StorageError, UserRepository,
    WorkSessionRepository,
};
