use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use tracing::info;

use super::extract::{ValidJson, ValidPath, ValidQuery};
use super::response::{ApiResponse, Deleted, list_body};
use crate::error::AppError;
use crate::models::{Classroom, ClassroomListParams, CreateClassroomRequest, Entity, UpdateClassroomRequest, next_timestamp};
use crate::state::AppState;
use crate::validation::validate_id;
use crate::views::{ApiVersion, Render};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/classrooms", get(list_classrooms).post(create_classroom))
        .route(
            "/classrooms/{id}",
            get(get_classroom).put(update_classroom).delete(delete_classroom),
        )
}

async fn find(state: &AppState, id: &str) -> Result<Classroom, AppError> {
    state
        .repo
        .find_classroom(id)
        .await?
        .ok_or(AppError::NotFound(Entity::Classroom))
}

async fn list_classrooms(
    State(state): State<AppState>,
    version: ApiVersion,
    ValidQuery(params): ValidQuery<ClassroomListParams>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let query = params.validate()?;
    let page = state.repo.list_classrooms(&query).await?;
    Ok(ApiResponse::ok(list_body(page, version)?))
}

async fn get_classroom(
    State(state): State<AppState>,
    version: ApiVersion,
    ValidPath(id): ValidPath<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    validate_id(&id)?;
    let classroom = find(&state, &id).await?;
    Ok(ApiResponse::ok(classroom.render(version)?))
}

async fn create_classroom(
    State(state): State<AppState>,
    version: ApiVersion,
    ValidJson(req): ValidJson<CreateClassroomRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), AppError> {
    let new = req.validate_create()?;
    let id = state.repo.insert_classroom(new).await?;
    let classroom = state
        .repo
        .find_classroom(&id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("classroom {} missing after insert", id)))?;

    info!("created classroom {} ({})", classroom.name, classroom.id);
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(classroom.render(version)?, "教室を作成しました"),
    ))
}

async fn update_classroom(
    State(state): State<AppState>,
    version: ApiVersion,
    ValidPath(id): ValidPath<String>,
    ValidJson(req): ValidJson<UpdateClassroomRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    validate_id(&id)?;
    let patch = req.validate_update()?;
    let existing = find(&state, &id).await?;

    let updated_at = next_timestamp(&existing.updated_at);
    if !state.repo.update_classroom(&id, patch, &updated_at).await? {
        return Err(AppError::NotFound(Entity::Classroom));
    }
    let classroom = find(&state, &id).await?;

    info!("updated classroom {}", classroom.id);
    Ok(ApiResponse::with_message(classroom.render(version)?, "教室を更新しました"))
}

async fn delete_classroom(
    State(state): State<AppState>,
    _version: ApiVersion,
    ValidPath(id): ValidPath<String>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    validate_id(&id)?;
    let existing = find(&state, &id).await?;
    if !state.repo.delete_classroom(&id).await? {
        return Err(AppError::DeleteFailed(Entity::Classroom));
    }

    info!("deleted classroom {} ({})", existing.name, existing.id);
    Ok(ApiResponse::with_message(
        Deleted::now(existing.id, existing.name),
        "教室を削除しました",
    ))
}
