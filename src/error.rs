use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::models::Entity;
use crate::validation::ValidationIssue;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation failed ({} issues)", .0.len())]
    Validation(Vec<ValidationIssue>),

    #[error("{} not found", .0.code_prefix())]
    NotFound(Entity),

    #[error("Failed to delete {}", .0.code_prefix())]
    DeleteFailed(Entity),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![ValidationIssue {
            path: path.into(),
            message: message.into(),
        }])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DeleteFailed(_)
            | AppError::Database(_)
            | AppError::Serialization(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationIssue>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message, details) = match self {
            AppError::Validation(issues) => (
                "VALIDATION_ERROR".to_string(),
                "入力内容に誤りがあります".to_string(),
                Some(issues),
            ),
            AppError::NotFound(entity) => (
                format!("{}_NOT_FOUND", entity.code_prefix()),
                format!("{}が見つかりません", entity.label()),
                None,
            ),
            AppError::DeleteFailed(entity) => {
                error!("delete affected no rows for {}", entity.code_prefix());
                (
                    "DELETE_FAILED".to_string(),
                    format!("{}の削除に失敗しました", entity.label()),
                    None,
                )
            }
            AppError::Database(e) => {
                error!("database error: {}", e);
                internal()
            }
            AppError::Serialization(e) => {
                error!("serialization error: {}", e);
                internal()
            }
            AppError::Internal(msg) => {
                error!("internal error: {}", msg);
                internal()
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: code,
            message,
            details,
        });

        (status, body).into_response()
    }
}

fn internal() -> (String, String, Option<Vec<ValidationIssue>>) {
    (
        "INTERNAL_SERVER_ERROR".to_string(),
        "サーバー内部エラーが発生しました".to_string(),
        None,
    )
}
