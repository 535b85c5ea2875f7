use axum::{extract::State, response::IntoResponse};
use services::AppServices;
use tracing::info;

use crate::dto::{AuthDto, LoginRequest, RegisterRequest};
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::response::{created, ok};

pub async fn register(
    State(services): State<AppServices>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = services
        .auth()
        .register(&req.email, &req.display_name, &req.password)
        .await?;
    info!(user = %session.user.id(), "account registered");
    Ok(created(AuthDto::from(session)))
}

pub async fn login(
    State(services): State<AppServices>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = services.auth().login(&req.email, &req.password).await?;
    Ok(ok(AuthDto::from(session)))
}
