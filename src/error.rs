use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::articles::dto::ArticleSummary;

/// Error returned by HTTP handlers. Always rendered as JSON `{ "error": .. }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("This article requires a Pro subscription.")]
    TierRequired { preview: Box<ArticleSummary> },

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Duplicate(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::TierRequired { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::TierRequired { preview } => json!({
                "error": "This article requires a Pro subscription.",
                "preview": preview,
            }),
            AppError::Upstream(err) => {
                tracing::error!(error = ?err, "request failed");
                json!({ "error": "Something went wrong. Please try again later." })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
