use axum::{extract::State, response::IntoResponse};
use services::AppServices;

use crate::dto::{ProfileRequest, SettingsDto, SettingsRequest, UserDto};
use crate::error::ApiResult;
use crate::extract::{ApiJson, AuthUser};
use crate::response::ok;

pub async fn profile(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
) -> ApiResult<impl IntoResponse> {
    let user = services.users().profile(user).await?;
    Ok(ok(UserDto::from(&user)))
}

pub async fn update_profile(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<ProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = services.users().update_profile(user, req.into()).await?;
    Ok(ok(UserDto::from(&user)))
}

pub async fn settings(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
) -> ApiResult<impl IntoResponse> {
    let settings = services.users().settings(user).await?;
    Ok(ok(SettingsDto::from(settings)))
}

pub async fn update_settings(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<SettingsRequest>,
) -> ApiResult<impl IntoResponse> {
    let settings = services.users().update_settings(user, req.into()).await?;
    Ok(ok(SettingsDto::from(settings)))
}
