use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use blivalley_core::model::SessionId;
use services::AppServices;

use crate::dto::{
    ListSessionsQuery, SessionDto, StartSessionRequest, StartedDto, StopSessionRequest,
    StoppedDto, UpdateSessionRequest,
};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery, AuthUser, OptionalJson, parse_id};
use crate::response::{created, done, ok};

pub async fn list(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<ListSessionsQuery>,
) -> ApiResult<impl IntoResponse> {
    let sessions = services.work_sessions().list_sessions(user, query.into()).await?;
    Ok(ok(sessions.iter().map(SessionDto::from).collect::<Vec<_>>()))
}

pub async fn start(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<StartSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    let started = services.work_sessions().start(user, req.into()).await?;
    Ok(created(StartedDto::from(&started)))
}

pub async fn active(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
) -> ApiResult<impl IntoResponse> {
    let session = services.work_sessions().active_session(user).await?;
    Ok(ok(session.as_ref().map(SessionDto::from)))
}

pub async fn get_one(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let session = services
        .work_sessions()
        .get_session(user, parse_id::<SessionId>(&id)?)
        .await?;
    Ok(ok(SessionDto::from(&session)))
}

pub async fn update_note(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = services
        .work_sessions()
        .update_note(user, parse_id(&id)?, req.note)
        .await?;
    Ok(ok(SessionDto::from(&session)))
}

pub async fn delete(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    services
        .work_sessions()
        .delete_session(user, parse_id(&id)?)
        .await?;
    Ok(done())
}

/// The body is optional; an empty POST stops without a note.
pub async fn stop(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    OptionalJson(req): OptionalJson<StopSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    let StopSessionRequest {
        note,
        complete_task,
    } = req;
    let stopped = services
        .work_sessions()
        .stop(user, parse_id(&id)?, note, complete_task)
        .await?;
    Ok(ok(StoppedDto::from(&stopped)))
}
