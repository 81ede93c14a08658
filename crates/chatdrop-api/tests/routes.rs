use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chatdrop_api::{AppStateInner, router};
use chatdrop_store::Store;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const ME: u64 = 5;

async fn app() -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path(), ME).await.unwrap();
    store.seed_samples().await.unwrap();
    let state = Arc::new(AppStateInner { store });
    (dir, router(state))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };

    let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_and_me() {
    let (_dir, app) = app().await;

    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = call(&app, Method::GET, "/api/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], ME);
    assert_eq!(body["displayName"], "Current User");

    let (status, body) = call(&app, Method::GET, "/api/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn list_shows_summaries_newest_first() {
    let (_dir, app) = app().await;

    let (status, body) = call(&app, Method::GET, "/api/conversations", None).await;
    assert_eq!(status, StatusCode::OK);

    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 4);
    assert_eq!(list[0]["participant"]["username"], "fabian");
    assert_eq!(list[0]["unreadCount"], 1);
    assert!(list[0]["preview"].as_str().unwrap().starts_with("The problem with that approach"));
    assert_eq!(list[0]["lastMessage"]["status"], "delivered");
    // Peter's thread ends with the current user's message.
    assert_eq!(list[2]["participant"]["username"], "peter");
    assert_eq!(list[2]["unreadCount"], 0);
}

#[tokio::test]
async fn post_a_message_and_get_it_back() {
    let (_dir, app) = app().await;

    let (status, sent) = call(
        &app,
        Method::POST,
        "/api/conversations/2/messages",
        Some(json!({
            "senderId": ME,
            "type": "image",
            "content": "https://images.unsplash.com/photo-1601513237233-bd526fc3f66e",
            "metadata": { "caption": "Check out this awesome image!" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["status"], "sent");
    assert_eq!(sent["conversationId"], 2);

    let (status, conv) = call(&app, Method::GET, "/api/conversations/2", None).await;
    assert_eq!(status, StatusCode::OK);
    let messages = conv["messages"].as_array().unwrap();
    assert_eq!(messages.last().unwrap(), &sent);
    assert_eq!(conv["lastMessageAt"], sent["createdAt"]);
    assert_eq!(conv["participant"]["username"], "peter");
}

#[tokio::test]
async fn message_validation() {
    let (_dir, app) = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/conversations/1/messages",
        Some(json!({ "senderId": ME, "type": "text" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Sender ID, type, and content are required");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/conversations/1/messages",
        Some(json!({ "senderId": ME, "type": "sticker", "content": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Type must be 'text', 'image', or 'audio'");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/conversations/1/messages",
        Some(json!({ "senderId": 3, "type": "text", "content": "wrong chat" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/conversations/99/messages",
        Some(json!({ "senderId": ME, "type": "text", "content": "hello?" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Conversation not found");
}

#[tokio::test]
async fn malformed_json_is_a_json_400() {
    let (_dir, app) = app().await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/conversations/1/messages")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ nope"))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn bad_path_ids_get_a_json_400() {
    let (_dir, app) = app().await;

    for (method, uri, body) in [
        (Method::GET, "/api/conversations/abc", None),
        (
            Method::POST,
            "/api/conversations/abc/messages",
            Some(json!({ "senderId": ME, "type": "text", "content": "hi" })),
        ),
        (
            Method::PUT,
            "/api/messages/-1/status",
            Some(json!({ "status": "read" })),
        ),
    ] {
        let (status, body) = call(&app, method, uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["message"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn create_conversation_with_participant_list() {
    let (_dir, app) = app().await;

    let (status, conv) = call(
        &app,
        Method::POST,
        "/api/conversations",
        Some(json!({
            "participantUserIds": [ME, 3],
            "messages": [{ "senderId": 3, "type": "text", "content": "New thread" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(conv["id"], 5);
    assert_eq!(conv["participant"]["username"], "madeleine");
    assert_eq!(conv["messages"][0]["content"], "New thread");

    let (status, body) = call(&app, Method::POST, "/api/conversations", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User ID is required");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/conversations",
        Some(json!({ "userId": 42 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_updates() {
    let (_dir, app) = app().await;

    let (_, conv) = call(&app, Method::GET, "/api/conversations/4", None).await;
    let message_id = conv["messages"][0]["id"].as_u64().unwrap();
    assert_eq!(conv["messages"][0]["status"], "sent");

    let uri = format!("/api/messages/{message_id}/status");
    let (status, msg) = call(&app, Method::PUT, &uri, Some(json!({ "status": "read" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(msg["status"], "read");

    let (status, _) = call(&app, Method::PUT, &uri, Some(json!({ "status": "sent" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call(&app, Method::PUT, &uri, Some(json!({ "status": "seen" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid status");

    let (status, _) = call(
        &app,
        Method::PUT,
        "/api/messages/123456/status",
        Some(json!({ "status": "read" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn load_from_file() {
    let (dir, app) = app().await;
    std::fs::write(
        dir.path().join("sample-conversation.json"),
        json!({
            "conversation": { "id": 999 },
            "participants": [{ "userId": 1 }, { "userId": ME }],
            "messages": [
                { "senderId": 1, "type": "text", "content": "Hello from a file", "status": "read" },
                { "senderId": ME, "type": "audio", "content": "/a.mp3", "metadata": { "duration": 15 } }
            ]
        })
        .to_string(),
    )
    .unwrap();

    let (status, conv) = call(
        &app,
        Method::POST,
        "/api/conversations/load-from-file",
        Some(json!({ "filename": "sample-conversation.json" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(conv["messages"].as_array().unwrap().len(), 2);
    assert_eq!(conv["messages"][1]["metadata"]["duration"], 15);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/conversations/load-from-file",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Filename is required");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/conversations/load-from-file",
        Some(json!({ "filename": "../../etc/passwd" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/conversations/load-from-file",
        Some(json!({ "filename": "nope.json" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn load_from_file_rejects_non_definitions() {
    let (dir, app) = app().await;
    std::fs::write(dir.path().join("broken.json"), "{ \"participants\": [").unwrap();

    for filename in ["broken.json", "users.json"] {
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/conversations/load-from-file",
            Some(json!({ "filename": filename })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{filename}");
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("Failed to load conversation from file"),
            "{filename}: {body}"
        );
    }
}
