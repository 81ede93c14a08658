use axum::{Json, extract::State};
use chatdrop_types::models::User;

use crate::AppState;
use crate::error::ApiError;

/// GET /api/me: the fixed current user.
pub async fn me(State(state): State<AppState>) -> Result<Json<User>, ApiError> {
    let user = state.store.current_user().await.map_err(|e| match ApiError::from(e) {
        ApiError::NotFound(_) => ApiError::NotFound("Current user not found".into()),
        other => other,
    })?;
    Ok(Json(user))
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.store.users().await?))
}
