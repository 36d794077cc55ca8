pub mod classrooms;
pub mod extract;
pub mod response;
pub mod school_settings;
pub mod subjects;
pub mod teachers;

use axum::http::{HeaderValue, StatusCode};
use axum::http::header::InvalidHeaderValue;
use axum::{Router, extract::State, routing::get};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(subjects::routes())
        .merge(teachers::routes())
        .merge(classrooms::routes())
        .merge(school_settings::routes())
        .with_state(state)
}

/// Adds request tracing and CORS for the browser front end.
pub fn with_layers(router: Router, cors_allow_origin: Option<&str>) -> Result<Router, InvalidHeaderValue> {
    let cors = match cors_allow_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    };
    Ok(router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    ))
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.repo.ping().await?;
    Ok(StatusCode::OK)
}
