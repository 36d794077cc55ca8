use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use tracing::{info, warn};

use super::extract::ValidJson;
use super::response::ApiResponse;
use crate::error::AppError;
use crate::models::{Entity, SchoolSettings, SchoolSettingsView, SettingsValues, next_timestamp};
use crate::state::AppState;
use crate::views::ApiVersion;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/school-settings",
        get(get_school_settings).put(update_school_settings),
    )
}

async fn load(state: &AppState) -> Result<SchoolSettings, AppError> {
    match state.repo.fetch_settings().await? {
        Some(settings) => Ok(settings),
        None => {
            warn!("school settings row missing, recreating defaults");
            Ok(state.repo.ensure_settings().await?)
        }
    }
}

async fn enhanced(state: &AppState, settings: SchoolSettings) -> Result<SchoolSettingsView, AppError> {
    let counts = state.repo.entity_counts().await?;
    Ok(SchoolSettingsView::new(settings, counts))
}

async fn get_school_settings(
    State(state): State<AppState>,
    _version: ApiVersion,
) -> Result<Json<ApiResponse<SchoolSettingsView>>, AppError> {
    let settings = load(&state).await?;
    Ok(ApiResponse::ok(enhanced(&state, settings).await?))
}

async fn update_school_settings(
    State(state): State<AppState>,
    _version: ApiVersion,
    ValidJson(body): ValidJson<Value>,
) -> Result<Json<ApiResponse<SchoolSettingsView>>, AppError> {
    let values = SettingsValues::from_body(&body)?;
    let current = load(&state).await?;

    let updated_at = next_timestamp(&current.updated_at);
    if !state.repo.update_settings(values, &updated_at).await? {
        return Err(AppError::NotFound(Entity::SchoolSettings));
    }
    let settings = state
        .repo
        .fetch_settings()
        .await?
        .ok_or(AppError::NotFound(Entity::SchoolSettings))?;

    info!("updated school settings: {:?}", values);
    Ok(ApiResponse::with_message(
        enhanced(&state, settings).await?,
        "学校設定を更新しました",
    ))
}
