use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::models::{Paged, timestamp_now};
use crate::views::{ApiVersion, Render};

/// Success envelope shared by every route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            message: None,
        })
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            message: Some(message.into()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub deleted_id: String,
    pub deleted_name: String,
    pub deleted_at: String,
}

impl Deleted {
    pub fn now(id: String, name: String) -> Self {
        Self {
            deleted_id: id,
            deleted_name: name,
            deleted_at: timestamp_now(),
        }
    }
}

/// `{<entities>: [...], pagination: {...}}` with each item rendered for `version`.
pub fn list_body<T: Render>(page: Paged<T>, version: ApiVersion) -> Result<Value, AppError> {
    let items = page
        .items
        .iter()
        .map(|item| item.render(version))
        .collect::<Result<Vec<_>, _>>()?;

    let mut body = Map::new();
    body.insert(T::LIST_KEY.to_string(), Value::Array(items));
    body.insert("pagination".to_string(), serde_json::to_value(page.pagination)?);
    Ok(Value::Object(body))
}
