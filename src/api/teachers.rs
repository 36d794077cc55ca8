use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use tracing::info;

use super::extract::{ValidJson, ValidPath, ValidQuery};
use super::response::{ApiResponse, Deleted, list_body};
use crate::error::AppError;
use crate::models::{CreateTeacherRequest, Entity, Teacher, TeacherListParams, UpdateTeacherRequest, next_timestamp};
use crate::state::AppState;
use crate::validation::validate_id;
use crate::views::{ApiVersion, Render};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/teachers", get(list_teachers).post(create_teacher))
        .route(
            "/teachers/{id}",
            get(get_teacher).put(update_teacher).delete(delete_teacher),
        )
}

async fn find(state: &AppState, id: &str) -> Result<Teacher, AppError> {
    state
        .repo
        .find_teacher(id)
        .await?
        .ok_or(AppError::NotFound(Entity::Teacher))
}

async fn list_teachers(
    State(state): State<AppState>,
    version: ApiVersion,
    ValidQuery(params): ValidQuery<TeacherListParams>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let query = params.validate()?;
    let page = state.repo.list_teachers(&query).await?;
    Ok(ApiResponse::ok(list_body(page, version)?))
}

async fn get_teacher(
    State(state): State<AppState>,
    version: ApiVersion,
    ValidPath(id): ValidPath<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    validate_id(&id)?;
    let teacher = find(&state, &id).await?;
    Ok(ApiResponse::ok(teacher.render(version)?))
}

async fn create_teacher(
    State(state): State<AppState>,
    version: ApiVersion,
    ValidJson(req): ValidJson<CreateTeacherRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), AppError> {
    let new = req.validate_create()?;
    let id = state.repo.insert_teacher(new).await?;
    let teacher = state
        .repo
        .find_teacher(&id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("teacher {} missing after insert", id)))?;

    info!("created teacher {} ({})", teacher.name, teacher.id);
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(teacher.render(version)?, "教師を作成しました"),
    ))
}

async fn update_teacher(
    State(state): State<AppState>,
    version: ApiVersion,
    ValidPath(id): ValidPath<String>,
    ValidJson(req): ValidJson<UpdateTeacherRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    validate_id(&id)?;
    let patch = req.validate_update()?;
    let existing = find(&state, &id).await?;

    let updated_at = next_timestamp(&existing.updated_at);
    if !state.repo.update_teacher(&id, patch, &updated_at).await? {
        return Err(AppError::NotFound(Entity::Teacher));
    }
    let teacher = find(&state, &id).await?;

    info!("updated teacher {}", teacher.id);
    Ok(ApiResponse::with_message(teacher.render(version)?, "教師を更新しました"))
}

async fn delete_teacher(
    State(state): State<AppState>,
    _version: ApiVersion,
    ValidPath(id): ValidPath<String>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    validate_id(&id)?;
    let existing = find(&state, &id).await?;
    if !state.repo.delete_teacher(&id).await? {
        return Err(AppError::DeleteFailed(Entity::Teacher));
    }

    info!("deleted teacher {} ({})", existing.name, existing.id);
    Ok(ApiResponse::with_message(
        Deleted::now(existing.id, existing.name),
        "教師を削除しました",
    ))
}
