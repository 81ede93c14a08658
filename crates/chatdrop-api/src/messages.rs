use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use chatdrop_types::api::{SendMessageRequest, UpdateStatusRequest};
use chatdrop_types::models::{Message, MessageStatus};

use crate::AppState;
use crate::error::ApiError;

/// POST /api/conversations/{id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(conversation_id) = path?;
    let Json(req) = payload?;
    let draft = req
        .into_draft()
        .map_err(|msg| ApiError::BadRequest(msg.into()))?;

    let message = state.store.add_message(conversation_id, draft).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// PUT /api/messages/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Path(message_id) = path?;
    let Json(req) = payload?;
    let status = req
        .status
        .as_deref()
        .and_then(|s| s.parse::<MessageStatus>().ok())
        .ok_or_else(|| ApiError::BadRequest("Invalid status".into()))?;

    let message = state.store.update_message_status(message_id, status).await?;
    Ok(Json(message))
}
