//! JSON HTTP surface for projects, work sessions and accounts.

#![forbid(unsafe_code)]

use axum::{
    Router,
    http::{Method, header},
    routing::get,
};
use services::AppServices;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

mod dto;
pub mod error;
mod extract;
mod response;
mod routes;

pub use error::{ApiError, ApiResult};

/// Builds the full application router.
pub fn router(services: AppServices) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(routes::health))
        .nest("/api", routes::api_routes())
        .fallback(not_found)
        .with_state(services)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn not_found() -> ApiError {
    ApiError::NotFound("no such route".into())
}
