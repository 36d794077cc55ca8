use thiserror::Error;

use crate::validation::ValidationIssue;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API error {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        details: Option<Vec<ValidationIssue>>,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }

    pub fn validation_details(&self) -> &[ValidationIssue] {
        match self {
            ClientError::Api { details: Some(details), .. } => details,
            _ => &[],
        }
    }
}
