pub mod conversations;
pub mod error;
pub mod messages;
pub mod users;

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post, put},
};
use chatdrop_store::Store;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Store,
}

/// All JSON routes. Layers (CORS, tracing, static files) are added by the
/// binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/me", get(users::me))
        .route("/api/users", get(users::list_users))
        .route(
            "/api/conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        .route(
            "/api/conversations/load-from-file",
            post(conversations::load_from_file),
        )
        .route("/api/conversations/{id}", get(conversations::get_conversation))
        .route(
            "/api/conversations/{id}/messages",
            post(messages::send_message),
        )
        .route("/api/messages/{id}/status", put(messages::update_status))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
