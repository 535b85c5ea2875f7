use axum::{
    Router,
    routing::{get, post},
};
use services::AppServices;

mod auth;
mod health;
mod me;
mod projects;
mod sessions;

pub use health::health;

/// Everything mounted under `/api`.
pub fn api_routes() -> Router<AppServices> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/me", get(me::profile).patch(me::update_profile))
        .route("/me/settings", get(me::settings).put(me::update_settings))
        .route("/projects", get(projects::list).post(projects::create))
        .route(
            "/projects/:id",
            get(projects::get_one)
                .patch(projects::update)
                .delete(projects::delete),
        )
        .route("/projects/:id/summary", get(projects::summary))
        .route("/projects/:id/milestones", post(projects::add_milestone))
        .route(
            "/projects/:id/milestones/:milestone_id",
            axum::routing::patch(projects::update_milestone).delete(projects::remove_milestone),
        )
        .route(
            "/projects/:id/milestones/:milestone_id/tasks",
            post(projects::add_task),
        )
        .route(
            "/projects/:id/milestones/:milestone_id/tasks/:task_id",
            axum::routing::patch(projects::update_task).delete(projects::remove_task),
        )
        .route("/sessions", get(sessions::list).post(sessions::start))
        .route("/sessions/active", get(sessions::active))
        .route(
            "/sessions/:id",
            get(sessions::get_one)
                .patch(sessions::update_note)
                .delete(sessions::delete),
        )
        .route("/sessions/:id/stop", post(sessions::stop))
}
