//! API Integration Tests
//!
//! Tests the HTTP API endpoints with a real database and a scripted
//! completion backend standing in for Groq.
//!
//! Tests are serialized because they share a global test pool.
//!
//! Note: The `more-di` DI framework doesn't support injecting custom pools.
//! We work around this by using `DatabaseConnection::set_test_pool()` to set
//! a global pool that the DI-created DatabaseConnection will use.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use di::{Injectable, inject, injectable};
use di_axum::RouterServiceProviderExtensions;
use groq_chat_api::{
    api, app,
    config::AppConfig,
    core::assistant::{Completion, CompletionRequest, TokenUsage},
    infrastructure::database::DatabaseConnection,
    infrastructure::traits::{CompletionClient, CompletionError},
};
use serde_json::{Value, json};
use serial_test::serial;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicU32, Ordering};
use tower::ServiceExt;

/// Counter for unique test database URIs
static TEST_DB_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Setup test database with migrations and returns pool
async fn setup_test_db() -> SqlitePool {
    let db_num = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let db_url = format!("sqlite:file:testdb{}?mode=memory&cache=shared", db_num);

    let pool = SqlitePool::connect(&db_url).await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();

    DatabaseConnection::set_test_pool(pool.clone());

    pool
}

/// Clean up after test
fn cleanup_test_db() {
    DatabaseConnection::clear_test_pool();
}

/// Replies "Hi there" to everything.
struct FriendlyCompletions;

#[injectable(CompletionClient)]
impl FriendlyCompletions {
    #[inject]
    fn create() -> Self {
        FriendlyCompletions
    }
}

#[async_trait]
impl CompletionClient for FriendlyCompletions {
    async fn complete(
        &self,
        _api_key: &str,
        _request: &CompletionRequest,
    ) -> Result<Completion, CompletionError> {
        Ok(Completion {
            content: "Hi there".to_owned(),
            usage: TokenUsage {
                prompt_tokens: 5,
                completion_tokens: 3,
                total_tokens: 8,
            },
        })
    }
}

/// Rejects every request the way Groq does for a bad key.
struct RejectingCompletions;

#[injectable(CompletionClient)]
impl RejectingCompletions {
    #[inject]
    fn create() -> Self {
        RejectingCompletions
    }
}

#[async_trait]
impl CompletionClient for RejectingCompletions {
    async fn complete(
        &self,
        _api_key: &str,
        _request: &CompletionRequest,
    ) -> Result<Completion, CompletionError> {
        Err(CompletionError::Upstream {
            status: 401,
            message: "Invalid API Key".to_owned(),
        })
    }
}

/// Create test app - uses the global test pool set by setup_test_db()
fn create_test_app() -> axum::Router {
    let mut services = app::base_services();
    services
        .add(AppConfig::singleton())
        .add(FriendlyCompletions::singleton());
    api::router().with_provider(services.build_provider().unwrap())
}

fn create_rejecting_app() -> axum::Router {
    let mut services = app::base_services();
    services
        .add(AppConfig::singleton())
        .add(RejectingCompletions::singleton());
    api::router().with_provider(services.build_provider().unwrap())
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    user_id: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        request = request.header("user-id", user_id.to_string());
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn register(app: &axum::Router, username: &str) -> i64 {
    let (status, json) = send(
        app,
        "POST",
        "/api/register",
        None,
        Some(json!({
            "username": username,
            "password": "hunter2",
            "email": format!("{username}@example.com"),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_i64().unwrap()
}

async fn create_conversation(app: &axum::Router, user_id: i64, title: &str) -> i64 {
    let (status, json) = send(
        app,
        "POST",
        "/api/conversations",
        Some(user_id),
        Some(json!({ "title": title })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_i64().unwrap()
}

#[tokio::test]
#[serial]
async fn test_requests_without_user_are_unauthorized() {
    let _pool = setup_test_db().await;
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/api/conversations", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Unauthorized");

    let (status, json) = send(&app, "GET", "/api/settings", Some(9999), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "User not found");

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_register_and_login() {
    let _pool = setup_test_db().await;
    let app = create_test_app();

    let user_id = register(&app, "alice").await;
    assert!(user_id > 1);

    let (status, json) = send(
        &app,
        "POST",
        "/api/login",
        None,
        Some(json!({ "username": "alice", "password": "hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], user_id);
    assert_eq!(json["role"], "user");
    assert!(json.get("password").is_none());

    let (status, json) = send(
        &app,
        "POST",
        "/api/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Invalid credentials");

    let (status, json) = send(
        &app,
        "POST",
        "/api/register",
        None,
        Some(json!({ "username": "alice", "password": "x", "email": "a@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Username already exists");

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_registration_adds_inactive_default_webhook() {
    let _pool = setup_test_db().await;
    let app = create_test_app();
    let user_id = register(&app, "bob").await;

    let (status, json) = send(&app, "GET", "/api/webhooks", Some(user_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let webhooks = json.as_array().unwrap();
    assert_eq!(webhooks.len(), 1);
    assert_eq!(webhooks[0]["name"], "Default Notifications");
    assert_eq!(webhooks[0]["active"], false);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_conversation_crud() {
    let _pool = setup_test_db().await;
    let app = create_test_app();
    let user_id = register(&app, "carol").await;

    let (status, json) = send(&app, "GET", "/api/conversations", Some(user_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 0);

    let id = create_conversation(&app, user_id, "First").await;

    let (status, json) = send(
        &app,
        "PATCH",
        &format!("/api/conversations/{id}"),
        Some(user_id),
        Some(json!({ "title": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Renamed");

    let (status, json) = send(
        &app,
        "GET",
        &format!("/api/conversations/{id}"),
        Some(user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Renamed");
    assert_eq!(json["messages"].as_array().unwrap().len(), 0);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/conversations/{id}"),
        Some(user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) = send(
        &app,
        "GET",
        &format!("/api/conversations/{id}"),
        Some(user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Conversation not found");

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_conversations_are_private() {
    let _pool = setup_test_db().await;
    let app = create_test_app();
    let owner = register(&app, "dave").await;
    let stranger = register(&app, "eve").await;
    let id = create_conversation(&app, owner, "Secret").await;

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/conversations/{id}"),
        Some(stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/conversations/{id}"),
        Some(stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, json) = send(&app, "GET", "/api/conversations", Some(stranger), None).await;
    assert_eq!(json.as_array().unwrap().len(), 0);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_first_conversation_earns_badge() {
    let _pool = setup_test_db().await;
    let app = create_test_app();
    let user_id = register(&app, "frank").await;
    create_conversation(&app, user_id, "Hello").await;

    let (status, json) = send(&app, "GET", "/api/user-badges", Some(user_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let badges = json.as_array().unwrap();
    assert_eq!(badges.len(), 1);
    assert_eq!(badges[0]["badgeId"], 1);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_settings_created_on_first_update() {
    let _pool = setup_test_db().await;
    let app = create_test_app();
    let user_id = register(&app, "grace").await;

    let (status, json) = send(&app, "GET", "/api/settings", Some(user_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["defaultModel"], "llama3-8b-8192");
    assert_eq!(json["temperature"], 70);

    let (status, json) = send(
        &app,
        "PATCH",
        "/api/settings",
        Some(user_id),
        Some(json!({ "theme": "dark", "maxTokens": 512 })),
    )
    .await;
    assert!(status == StatusCode::OK || status == StatusCode::CREATED);
    assert_eq!(json["theme"], "dark");
    assert_eq!(json["maxTokens"], 512);

    let (status, json) = send(
        &app,
        "PATCH",
        "/api/settings",
        Some(user_id),
        Some(json!({ "temperature": 101 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("temperature"));

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_api_key_crud() {
    let _pool = setup_test_db().await;
    let app = create_test_app();
    let user_id = register(&app, "heidi").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/api-keys",
        Some(user_id),
        Some(json!({ "name": "CI", "key": "gsk_123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["key"], "gsk_123");
    assert_eq!(json["active"], true);
    let id = json["id"].as_i64().unwrap();

    let (status, json) = send(
        &app,
        "PATCH",
        &format!("/api/api-keys/{id}"),
        Some(user_id),
        Some(json!({ "active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["active"], false);
    assert_eq!(json["name"], "CI");

    let (status, json) = send(&app, "GET", "/api/user-badges", Some(user_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        json.as_array()
            .unwrap()
            .iter()
            .any(|badge| badge["badgeId"] == 4)
    );

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/api-keys/{id}"),
        Some(user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) = send(
        &app,
        "DELETE",
        &format!("/api/api-keys/{id}"),
        Some(user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "API key not found");

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_webhook_url_is_validated() {
    let _pool = setup_test_db().await;
    let app = create_test_app();
    let user_id = register(&app, "ivan").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/webhooks",
        Some(user_id),
        Some(json!({ "name": "Bad", "url": "ftp://example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &app,
        "POST",
        "/api/webhooks",
        Some(user_id),
        Some(json!({ "name": "Slack", "url": "https://hooks.example.com/abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["active"], true);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_increment_reports_new_badges_once() {
    let _pool = setup_test_db().await;
    let app = create_test_app();
    let user_id = register(&app, "judy").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/achievements/increment",
        Some(user_id),
        Some(json!({ "type": "messages", "amount": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["achievement"]["count"], 9);
    assert_eq!(json["newBadges"].as_array().unwrap().len(), 0);

    let (_, json) = send(
        &app,
        "POST",
        "/api/achievements/increment",
        Some(user_id),
        Some(json!({ "type": "messages" })),
    )
    .await;
    assert_eq!(json["achievement"]["count"], 10);
    assert_eq!(json["newBadges"][0]["name"], "Chat Enthusiast");

    let (_, json) = send(
        &app,
        "POST",
        "/api/achievements/increment",
        Some(user_id),
        Some(json!({ "type": "messages" })),
    )
    .await;
    assert_eq!(json["achievement"]["count"], 11);
    assert_eq!(json["newBadges"].as_array().unwrap().len(), 0);

    let (status, _) = send(
        &app,
        "POST",
        "/api/achievements/increment",
        Some(user_id),
        Some(json!({ "type": "messages", "amount": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = send(&app, "GET", "/api/badges", Some(user_id), None).await;
    assert_eq!(json.as_array().unwrap().len(), 5);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_send_message_round_trip() {
    let _pool = setup_test_db().await;
    let app = create_test_app();
    let user_id = register(&app, "mallory").await;
    let conversation_id = create_conversation(&app, user_id, "Chat").await;

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/settings",
        Some(user_id),
        Some(json!({ "groqApiKey": "gsk_user" })),
    )
    .await;
    assert!(status.is_success());

    let (status, json) = send(
        &app,
        "POST",
        "/api/messages",
        Some(user_id),
        Some(json!({ "conversationId": conversation_id, "content": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["userMessage"]["content"], "Hello");
    assert_eq!(json["userMessage"]["role"], "user");
    assert_eq!(json["userMessage"]["tokenCount"], 2);
    assert_eq!(json["aiMessage"]["content"], "Hi there");
    assert_eq!(json["aiMessage"]["role"], "assistant");
    assert_eq!(json["aiMessage"]["tokenCount"], 3);

    let (_, json) = send(
        &app,
        "GET",
        &format!("/api/conversations/{conversation_id}"),
        Some(user_id),
        None,
    )
    .await;
    assert_eq!(json["messages"].as_array().unwrap().len(), 2);

    let (_, json) = send(&app, "GET", "/api/analytics", Some(user_id), None).await;
    assert_eq!(json["analytics"].as_array().unwrap().len(), 1);
    assert_eq!(json["analytics"][0]["tokensUsed"], 8);
    assert_eq!(json["analytics"][0]["cost"], 1);
    assert_eq!(json["summary"]["totalTokens"], 8);
    assert_eq!(json["summary"]["totalCost"], 0.01);
    assert_eq!(json["summary"]["count"], 1);

    let (_, json) = send(&app, "GET", "/api/achievements", Some(user_id), None).await;
    let messages = json
        .as_array()
        .unwrap()
        .iter()
        .find(|achievement| achievement["type"] == "messages")
        .unwrap();
    assert_eq!(messages["count"], 1);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_send_message_to_foreign_conversation() {
    let _pool = setup_test_db().await;
    let app = create_test_app();
    let owner = register(&app, "niaj").await;
    let stranger = register(&app, "olivia").await;
    let conversation_id = create_conversation(&app, owner, "Mine").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/messages",
        Some(stranger),
        Some(json!({ "conversationId": conversation_id, "content": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Conversation not found");

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_send_message_without_key() {
    let _pool = setup_test_db().await;
    let app = create_test_app();
    let user_id = register(&app, "peggy").await;
    let conversation_id = create_conversation(&app, user_id, "Keyless").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/messages",
        Some(user_id),
        Some(json!({ "conversationId": conversation_id, "content": "Hello" })),
    )
    .await;

    // Only meaningful when no process-wide key leaks in from the environment.
    if std::env::var("GROQ_API_KEY").map_or(true, |key| key.trim().is_empty()) {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Groq API key not found");
    }

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_upstream_failure_keeps_user_message() {
    let _pool = setup_test_db().await;
    let app = create_rejecting_app();
    let user_id = register(&app, "rupert").await;
    let conversation_id = create_conversation(&app, user_id, "Broken").await;
    send(
        &app,
        "PATCH",
        "/api/settings",
        Some(user_id),
        Some(json!({ "groqApiKey": "gsk_bad" })),
    )
    .await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/messages",
        Some(user_id),
        Some(json!({ "conversationId": conversation_id, "content": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], "AI service error");
    assert_eq!(json["error"], "Invalid API Key");

    let (_, json) = send(
        &app,
        "GET",
        &format!("/api/conversations/{conversation_id}"),
        Some(user_id),
        None,
    )
    .await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");

    let (_, json) = send(&app, "GET", "/api/analytics", Some(user_id), None).await;
    assert_eq!(json["summary"]["count"], 0);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_analytics_date_range() {
    let pool = setup_test_db().await;
    let app = create_test_app();
    let user_id = register(&app, "sybil").await;

    for (tokens, cost, date) in [
        (100_i64, 1_i64, "2024-01-10T12:00:00Z"),
        (250, 1, "2024-01-31T23:30:00Z"),
        (400, 1, "2024-02-01T00:00:00Z"),
    ] {
        sqlx::query("INSERT INTO analytics (user_id, tokens_used, cost, date) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(tokens)
            .bind(cost)
            .bind(date)
            .execute(&pool)
            .await
            .unwrap();
    }

    let (status, json) = send(
        &app,
        "GET",
        "/api/analytics?startDate=2024-01-01&endDate=2024-01-31",
        Some(user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["summary"]["count"], 2);
    assert_eq!(json["summary"]["totalTokens"], 350);
    assert_eq!(json["summary"]["totalCost"], 0.02);

    let (status, _) = send(
        &app,
        "GET",
        "/api/analytics?startDate=yesterday",
        Some(user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    cleanup_test_db();
}

#[tokio::test]
#[serial]
async fn test_malformed_requests_get_json_errors() {
    let _pool = setup_test_db().await;
    let app = create_test_app();
    let user_id = register(&app, "trent").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/messages",
        Some(user_id),
        Some(json!({ "conversationId": "abc", "content": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("conversationId"));

    let (status, json) = send(
        &app,
        "POST",
        "/api/register",
        None,
        Some(json!({ "username": "victor" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].is_string());

    let (status, json) = send(
        &app,
        "GET",
        "/api/conversations/abc",
        Some(user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].is_string());

    let request = Request::builder()
        .method("POST")
        .uri("/api/conversations")
        .header("user-id", user_id.to_string())
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["message"].is_string());

    cleanup_test_db();
}
