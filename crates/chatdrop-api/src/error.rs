use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chatdrop_store::StoreError;
use chatdrop_types::api::ErrorBody;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Internal(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConversationNotFound(_) => Self::NotFound("Conversation not found".into()),
            StoreError::MessageNotFound(_) => Self::NotFound("Message not found".into()),
            StoreError::UserNotFound(_) | StoreError::FileNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            StoreError::Invalid(msg) => Self::BadRequest(msg),
            StoreError::StatusRegression { .. } => Self::Conflict(err.to_string()),
            StoreError::Io(_) | StoreError::Json(_) => Self::Internal(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::Internal(err) => {
                error!("Storage error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}
