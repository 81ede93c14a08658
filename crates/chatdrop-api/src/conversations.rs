use std::collections::HashMap;

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use chatdrop_types::api::{
    ConversationDetail, ConversationSummary, CreateConversationRequest, LoadFromFileRequest,
};
use chatdrop_types::format::{format_timestamp, message_preview};
use chatdrop_types::models::{ConversationRecord, User};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::AppState;
use crate::error::ApiError;

/// GET /api/conversations: the chat list, most recent first.
pub async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    let users: HashMap<u64, User> = state
        .store
        .users()
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let records = state.store.list_conversations().await?;
    let now = Utc::now();

    let summaries = records
        .into_iter()
        .filter_map(|record| match users.get(&record.participant_id) {
            Some(participant) => Some(summarize(record, participant.clone(), now)),
            None => {
                warn!(
                    "Conversation {} references unknown user {}",
                    record.id, record.participant_id
                );
                None
            }
        })
        .collect();

    Ok(Json(summaries))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<ConversationDetail>, ApiError> {
    let Path(id) = path?;
    let record = state.store.conversation(id).await?;
    Ok(Json(detail(&state, record).await?))
}

pub async fn create_conversation(
    State(state): State<AppState>,
    payload: Result<Json<CreateConversationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let participant_id = req
        .participant(state.store.current_user_id())
        .ok_or_else(|| ApiError::BadRequest("User ID is required".into()))?;

    let record = state
        .store
        .create_conversation(participant_id, req.messages)
        .await?;

    Ok((StatusCode::CREATED, Json(detail(&state, record).await?)))
}

/// POST /api/conversations/load-from-file: import a definition file that
/// already sits in the data directory.
pub async fn load_from_file(
    State(state): State<AppState>,
    payload: Result<Json<LoadFromFileRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let filename = req
        .filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Filename is required".into()))?;

    let record = state.store.load_definition_file(&filename).await?;
    info!("Loaded conversation {} from {}", record.id, filename);

    Ok((StatusCode::CREATED, Json(detail(&state, record).await?)))
}

async fn detail(state: &AppState, record: ConversationRecord) -> Result<ConversationDetail, ApiError> {
    let participant = state.store.user(record.participant_id).await?;
    Ok(ConversationDetail {
        id: record.id,
        last_message_at: record.last_message_at,
        participant,
        messages: record.messages,
    })
}

fn summarize(record: ConversationRecord, participant: User, now: DateTime<Utc>) -> ConversationSummary {
    let last_message = record.last_message().cloned();
    ConversationSummary {
        id: record.id,
        last_message_at: record.last_message_at,
        preview: last_message.as_ref().map(message_preview).unwrap_or_default(),
        time_label: format_timestamp(record.last_message_at, now),
        unread_count: record.unread_count(),
        participant,
        last_message,
    }
}
