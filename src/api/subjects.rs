use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use tracing::info;

use super::extract::{ValidJson, ValidPath, ValidQuery};
use super::response::{ApiResponse, Deleted, list_body};
use crate::error::AppError;
use crate::models::{CreateSubjectRequest, Entity, Subject, SubjectListParams, UpdateSubjectRequest, next_timestamp};
use crate::state::AppState;
use crate::validation::validate_id;
use crate::views::{ApiVersion, Render};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subjects", get(list_subjects).post(create_subject))
        .route(
            "/subjects/{id}",
            get(get_subject).put(update_subject).delete(delete_subject),
        )
}

async fn find(state: &AppState, id: &str) -> Result<Subject, AppError> {
    state
        .repo
        .find_subject(id)
        .await?
        .ok_or(AppError::NotFound(Entity::Subject))
}

async fn list_subjects(
    State(state): State<AppState>,
    version: ApiVersion,
    ValidQuery(params): ValidQuery<SubjectListParams>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let query = params.validate()?;
    let page = state.repo.list_subjects(&query).await?;
    Ok(ApiResponse::ok(list_body(page, version)?))
}

async fn get_subject(
    State(state): State<AppState>,
    version: ApiVersion,
    ValidPath(id): ValidPath<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    validate_id(&id)?;
    let subject = find(&state, &id).await?;
    Ok(ApiResponse::ok(subject.render(version)?))
}

async fn create_subject(
    State(state): State<AppState>,
    version: ApiVersion,
    ValidJson(req): ValidJson<CreateSubjectRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), AppError> {
    let new = req.validate_create()?;
    let id = state.repo.insert_subject(new).await?;
    let subject = state
        .repo
        .find_subject(&id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("subject {} missing after insert", id)))?;

    info!("created subject {} ({})", subject.name, subject.id);
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(subject.render(version)?, "教科を作成しました"),
    ))
}

async fn update_subject(
    State(state): State<AppState>,
    version: ApiVersion,
    ValidPath(id): ValidPath<String>,
    ValidJson(req): ValidJson<UpdateSubjectRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    validate_id(&id)?;
    let update = req.validate_update()?;
    let existing = find(&state, &id).await?;
    let patch = update.resolve(&existing);

    let updated_at = next_timestamp(&existing.updated_at);
    if !state.repo.update_subject(&id, patch, &updated_at).await? {
        return Err(AppError::NotFound(Entity::Subject));
    }
    let subject = find(&state, &id).await?;

    info!("updated subject {}", subject.id);
    Ok(ApiResponse::with_message(subject.render(version)?, "教科を更新しました"))
}

async fn delete_subject(
    State(state): State<AppState>,
    _version: ApiVersion,
    ValidPath(id): ValidPath<String>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    validate_id(&id)?;
    let existing = find(&state, &id).await?;
    if !state.repo.delete_subject(&id).await? {
        return Err(AppError::DeleteFailed(Entity::Subject));
    }

    info!("deleted subject {} ({})", existing.name, existing.id);
    Ok(ApiResponse::with_message(
        Deleted::now(existing.id, existing.name),
        "教科を削除しました",
    ))
}
