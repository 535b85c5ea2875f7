use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use blivalley_core::model::{MilestoneId, ProjectId, TaskId};
use services::{AppServices, DEFAULT_PROJECT_LIMIT};

use crate::dto::{
    CreateProjectRequest, CreatedInProjectDto, ListProjectsQuery, MilestoneRequest, ProjectDto,
    SummaryDto, TaskRequest, UpdateMilestoneRequest, UpdateProjectRequest, UpdateTaskRequest,
};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery, AuthUser, parse_id};
use crate::response::{created, done, ok};

fn task_path(raw: &(String, String, String)) -> ApiResult<(ProjectId, MilestoneId, TaskId)> {
    Ok((parse_id(&raw.0)?, parse_id(&raw.1)?, parse_id(&raw.2)?))
}

pub async fn list(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<ListProjectsQuery>,
) -> ApiResult<impl IntoResponse> {
    let projects = services
        .projects()
        .list_projects(user, query.status, query.limit.unwrap_or(DEFAULT_PROJECT_LIMIT))
        .await?;
    Ok(ok(projects.iter().map(ProjectDto::from).collect::<Vec<_>>()))
}

pub async fn create(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    let project = services.projects().create_project(user, req.into()).await?;
    Ok(created(ProjectDto::from(&project)))
}

pub async fn get_one(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let project = services.projects().get_project(user, parse_id(&id)?).await?;
    Ok(ok(ProjectDto::from(&project)))
}

pub async fn update(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    let project = services
        .projects()
        .update_project(user, parse_id(&id)?, req.into())
        .await?;
    Ok(ok(ProjectDto::from(&project)))
}

pub async fn delete(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    services.projects().delete_project(user, parse_id(&id)?).await?;
    Ok(done())
}

pub async fn summary(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let summary = services.projects().project_summary(user, parse_id(&id)?).await?;
    Ok(ok(SummaryDto::from(&summary)))
}

pub async fn add_milestone(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<MilestoneRequest>,
) -> ApiResult<impl IntoResponse> {
    let (project, milestone_id) = services
        .projects()
        .add_milestone(user, parse_id(&id)?, req.into())
        .await?;
    Ok(created(CreatedInProjectDto {
        id: milestone_id,
        project: ProjectDto::from(&project),
    }))
}

pub async fn update_milestone(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    Path((id, milestone_id)): Path<(String, String)>,
    ApiJson(req): ApiJson<UpdateMilestoneRequest>,
) -> ApiResult<impl IntoResponse> {
    let project = services
        .projects()
        .update_milestone(user, parse_id(&id)?, parse_id(&milestone_id)?, req.into())
        .await?;
    Ok(ok(ProjectDto::from(&project)))
}

pub async fn remove_milestone(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    Path((id, milestone_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let project = services
        .projects()
        .remove_milestone(user, parse_id(&id)?, parse_id(&milestone_id)?)
        .await?;
    Ok(ok(ProjectDto::from(&project)))
}

pub async fn add_task(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    Path((id, milestone_id)): Path<(String, String)>,
    ApiJson(req): ApiJson<TaskRequest>,
) -> ApiResult<impl IntoResponse> {
    let (project, task_id) = services
        .projects()
        .add_task(user, parse_id(&id)?, parse_id(&milestone_id)?, req.into())
        .await?;
    Ok(created(CreatedInProjectDto {
        id: task_id,
        project: ProjectDto::from(&project),
    }))
}

pub async fn update_task(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    Path(raw): Path<(String, String, String)>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<impl IntoResponse> {
    let (id, milestone_id, task_id) = task_path(&raw)?;
    let project = services
        .projects()
        .update_task(user, id, milestone_id, task_id, req.into())
        .await?;
    Ok(ok(ProjectDto::from(&project)))
}

pub async fn remove_task(
    State(services): State<AppServices>,
    AuthUser(user): AuthUser,
    Path(raw): Path<(String, String, String)>,
) -> ApiResult<impl IntoResponse> {
    let (id, milestone_id, task_id) = task_path(&raw)?;
    let project = services
        .projects()
        .remove_task(user, id, milestone_id, task_id)
        .await?;
    Ok(ok(ProjectDto::from(&project)))
}
