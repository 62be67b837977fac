use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use gramguard::api::AppState;
use gramguard::config::Config;
use gramguard::moderation::BullyingClassifier;
use gramguard::services::CommentError;
use http_body_util::BodyExt;
use sea_orm::EntityTrait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

const PASSWORD: &str = "correct horse";
const BOUNDARY: &str = "gramguard-test-boundary";

/// Returns a fixed score per exact comment text, 0.0 for anything else.
struct ScriptedClassifier {
    scores: HashMap<&'static str, f64>,
}

#[async_trait::async_trait]
impl BullyingClassifier for ScriptedClassifier {
    async fn score(&self, text: &str) -> f64 {
        self.scores.get(text).copied().unwrap_or(0.0)
    }

    fn is_degraded(&self) -> bool {
        false
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;
    config.uploads.directory = std::env::temp_dir()
        .join(format!("gramguard-uploads-{}", uuid::Uuid::new_v4()))
        .display()
        .to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn spawn_app() -> (Router, Arc<AppState>) {
    spawn_app_with(test_config()).await
}

async fn spawn_app_with(config: Config) -> (Router, Arc<AppState>) {
    let classifier = Arc::new(ScriptedClassifier {
        scores: HashMap::from([
            ("you are a loser", 0.6),
            ("nobody likes you", 0.9),
            ("meh", 0.4),
            ("nice photo", 0.05),
        ]),
    });

    let state =
        gramguard::api::create_app_state_with_classifier(config, classifier, None)
            .await
            .expect("Failed to create app state");
    let app = gramguard::api::router(state.clone()).await;
    (app, state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value, Option<String>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json, set_cookie)
}

async fn register(app: &Router, username: &str) -> i64 {
    let (status, body, _) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": PASSWORD,
            "full_name": format!("{username} Tester"),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    body["data"]["id"].as_i64().unwrap()
}

async fn login(app: &Router, username: &str) -> String {
    let (status, body, cookie) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    cookie.expect("login should set a session cookie")
}

async fn signup(app: &Router, username: &str) -> (i32, String) {
    let id = register(app, username).await;
    let cookie = login(app, username).await;
    (i32::try_from(id).unwrap(), cookie)
}

async fn seed_post(state: &AppState, user_id: i32) -> i32 {
    state
        .store()
        .post_repo()
        .create(user_id, "sunset.jpg", "golden hour")
        .await
        .unwrap()
        .id
}

async fn set_reputation(state: &AppState, username: &str, score: f64) {
    state
        .store()
        .set_user_reputation(username, score)
        .await
        .unwrap()
        .unwrap();
}

async fn comment(app: &Router, cookie: &str, post_id: i32, text: &str) -> (StatusCode, Value) {
    let (status, body, _) = send(
        app,
        "POST",
        &format!("/api/posts/{post_id}/comments"),
        Some(cookie),
        Some(json!({ "comment": text })),
    )
    .await;
    (status, body)
}

fn assert_close(actual: &Value, expected: f64) {
    let actual = actual.as_f64().expect("expected a number");
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let (app, _) = spawn_app().await;

    for uri in ["/api/feed", "/api/explore", "/api/auth/me", "/api/system/status"] {
        let (status, body, _) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].is_string());
    }

    let (status, _, _) = send(&app, "GET", "/api/health/live", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_and_login() {
    let (app, _) = spawn_app().await;
    register(&app, "alice").await;

    let (status, body, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "email": "other@example.com",
            "password": PASSWORD,
            "full_name": "Other",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Username already exists"));

    let (status, body, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": "alice2",
            "email": "alice@example.com",
            "password": PASSWORD,
            "full_name": "Other",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Email already exists"));

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = login(&app, "alice").await;
    let (status, body, _) = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], json!("alice"));
    assert_eq!(body["data"]["reputation_state"], json!("trusted"));
    assert_close(&body["data"]["reputation_score"], 10.0);

    let (status, _, _) = send(&app, "POST", "/api/auth/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bullying_comment_decays_reputation() {
    let (app, state) = spawn_app().await;
    let (owner_id, _) = signup(&app, "owner").await;
    let (_, cookie) = signup(&app, "bully").await;
    let post_id = seed_post(&state, owner_id).await;

    let (status, body) = comment(&app, &cookie, post_id, "you are a loser").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let data = &body["data"];
    assert_eq!(data["text"], json!("you are a loser"));
    assert_eq!(data["author"], json!("bully"));
    assert_eq!(data["bullying_detected"], json!(true));
    assert_eq!(data["restricted"], json!(false));
    assert_close(&data["user_reputation"], 9.4);
    assert_close(&data["reputation_loss"], 0.6);
    assert!(data["created_at"].as_str().unwrap().contains(" at "));

    // Scores at the threshold do not count as bullying.
    let (status, body) = comment(&app, &cookie, post_id, "meh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bullying_detected"], json!(false));
    assert_close(&body["data"]["user_reputation"], 9.4);
    assert_close(&body["data"]["reputation_loss"], 0.0);

    let (status, body, _) = send(
        &app,
        "GET",
        &format!("/api/posts/{post_id}/comments"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_crossing_threshold_restricts_user() {
    let (app, state) = spawn_app().await;
    let (owner_id, _) = signup(&app, "owner").await;
    let (_, cookie) = signup(&app, "edgy").await;
    let post_id = seed_post(&state, owner_id).await;
    set_reputation(&state, "edgy", 5.2).await;

    let (status, body) = comment(&app, &cookie, post_id, "nobody likes you").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_close(&body["data"]["user_reputation"], 4.3);
    assert_close(&body["data"]["reputation_loss"], 0.9);
    assert_eq!(body["data"]["bullying_detected"], json!(true));
    assert_eq!(body["data"]["restricted"], json!(true));

    let (status, body) = comment(&app, &cookie, post_id, "nice photo").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        json!("Your account is restricted. You cannot comment on posts.")
    );

    let (_, body, _) = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(body["data"]["reputation_state"], json!("restricted"));
    assert_close(&body["data"]["reputation_score"], 4.3);
}

#[tokio::test]
async fn test_restricted_user_cannot_comment() {
    let (app, state) = spawn_app().await;
    let (owner_id, owner_cookie) = signup(&app, "owner").await;
    let (_, cookie) = signup(&app, "muted").await;
    let post_id = seed_post(&state, owner_id).await;
    set_reputation(&state, "muted", 4.8).await;

    let (status, _) = comment(&app, &cookie, post_id, "nice photo").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Blank text is rejected before the reputation gate.
    let (status, body) = comment(&app, &cookie, post_id, "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Comment cannot be empty"));

    let (_, body, _) = send(
        &app,
        "GET",
        &format!("/api/posts/{post_id}/comments"),
        Some(&owner_cookie),
        None,
    )
    .await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let user = state.store().get_user_by_username("muted").await.unwrap().unwrap();
    assert!((user.reputation_score - 4.8).abs() < 1e-9);
}

#[tokio::test]
async fn test_reputation_never_negative() {
    let (app, state) = spawn_app().await;
    let (owner_id, _) = signup(&app, "owner").await;
    let (_, cookie) = signup(&app, "floor").await;
    let post_id = seed_post(&state, owner_id).await;
    set_reputation(&state, "floor", 5.0).await;

    let (status, body) = comment(&app, &cookie, post_id, "nobody likes you").await;
    assert_eq!(status, StatusCode::OK);
    assert_close(&body["data"]["user_reputation"], 4.1);

    set_reputation(&state, "floor", 5.0).await;
    let store = state.store();
    let outcome = store
        .insert_scored_comment(gramguard::db::ScoredComment {
            user_id: store.get_user_by_username("floor").await.unwrap().unwrap().id,
            post_id,
            text: "direct",
            bullying_score: 0.9,
            penalty: 7.5,
            restriction_threshold: 5.0,
        })
        .await
        .unwrap();
    match outcome {
        gramguard::db::InsertOutcome::Created { new_score, .. } => {
            assert!(new_score.abs() < 1e-9);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

async fn submit_concurrently(
    state: &Arc<AppState>,
    user_id: i32,
    post_id: i32,
    text: &'static str,
    count: usize,
) -> Vec<Result<f64, CommentError>> {
    let handles: Vec<_> = (0..count)
        .map(|_| {
            let state = state.clone();
            tokio::spawn(async move {
                state
                    .comment_service()
                    .submit(user_id, post_id, text)
                    .await
                    .map(|submission| submission.user_reputation)
            })
        })
        .collect();

    let mut results = Vec::with_capacity(count);
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_comments_on_file_database() {
    let db_path = std::env::temp_dir().join(format!("gramguard-{}.db", uuid::Uuid::new_v4()));
    let mut config = test_config();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    let (app, state) = spawn_app_with(config).await;

    let (user_id, _) = signup(&app, "racer").await;
    let post_id = seed_post(&state, user_id).await;

    let clean = submit_concurrently(&state, user_id, post_id, "nice photo", 8).await;
    for result in &clean {
        assert!(result.is_ok(), "clean comment failed: {result:?}");
    }
    let profile = state
        .store()
        .user_repo()
        .get_by_username("racer")
        .await
        .unwrap()
        .unwrap();
    assert!((profile.reputation_score - 9.6).abs() < 1e-9);

    set_reputation(&state, "racer", 5.8).await;
    let bullying = submit_concurrently(&state, user_id, post_id, "nobody likes you", 8).await;
    let accepted = bullying.iter().filter(|r| r.is_ok()).count();
    let refused = bullying
        .iter()
        .filter(|r| matches!(r, Err(CommentError::Restricted)))
        .count();
    assert_eq!(accepted, 1, "results: {bullying:?}");
    assert_eq!(refused, 7, "results: {bullying:?}");

    let profile = state
        .store()
        .user_repo()
        .get_by_username("racer")
        .await
        .unwrap()
        .unwrap();
    assert!((profile.reputation_score - 4.9).abs() < 1e-9);

    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_comment_on_missing_post() {
    let (app, _) = spawn_app().await;
    let (_, cookie) = signup(&app, "lost").await;

    let (status, _) = comment(&app, &cookie, 999, "nice photo").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_follow_rules() {
    let (app, state) = spawn_app().await;
    let (alice_id, alice) = signup(&app, "alice").await;
    let (bob_id, _) = signup(&app, "bob").await;
    let (carol_id, _) = signup(&app, "carol").await;

    let follow = |cookie: String, target: i32| {
        let app = app.clone();
        async move {
            send(
                &app,
                "POST",
                &format!("/api/users/{target}/follow"),
                Some(&cookie),
                None,
            )
            .await
        }
    };

    let (status, body, _) = follow(alice.clone(), alice_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Cannot follow yourself"));

    let (status, body, _) = follow(alice.clone(), bob_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["following"], json!(true));

    let (_, body, _) = send(&app, "GET", "/api/users/bob", Some(&alice), None).await;
    assert_eq!(body["data"]["is_following"], json!(true));
    assert_eq!(body["data"]["follower_count"], json!(1));

    let (status, _, _) = follow(alice.clone(), 4242).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    set_reputation(&state, "alice", 3.0).await;

    let (status, body, _) = follow(alice.clone(), carol_id).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        json!("Your account is restricted. You cannot follow other users.")
    );

    // Unfollowing is still allowed while restricted.
    let (status, body, _) = follow(alice.clone(), bob_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["following"], json!(false));
}

#[tokio::test]
async fn test_like_toggle() {
    let (app, state) = spawn_app().await;
    let (owner_id, cookie) = signup(&app, "liker").await;
    let post_id = seed_post(&state, owner_id).await;
    let uri = format!("/api/posts/{post_id}/like");

    let (status, body, _) = send(&app, "POST", &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["liked"], json!(true));

    let (_, body, _) = send(&app, "GET", &format!("/api/posts/{post_id}"), Some(&cookie), None).await;
    assert_eq!(body["data"]["like_count"], json!(1));
    assert_eq!(body["data"]["liked"], json!(true));

    let (_, body, _) = send(&app, "POST", &uri, Some(&cookie), None).await;
    assert_eq!(body["data"]["liked"], json!(false));

    let (status, _, _) = send(&app, "POST", "/api/posts/777/like", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: image/jpeg\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn send_multipart(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: &str,
    body: Vec<u8>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_upload_feed_and_explore() {
    let (app, _) = spawn_app().await;
    let (_, alice) = signup(&app, "alice").await;
    let (bob_id, bob) = signup(&app, "bob").await;

    let (status, body) = send_multipart(
        &app,
        "POST",
        "/api/posts",
        &bob,
        multipart_body(&[
            ("caption", None, b"first light"),
            ("image", Some("my photo.jpg"), b"\xff\xd8\xff\xe0jpeg"),
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let image = body["data"]["image"].as_str().unwrap().to_string();
    assert!(image.ends_with("_my_photo.jpg"));
    assert_eq!(body["data"]["caption"], json!("first light"));

    let (status, body) = send_multipart(
        &app,
        "POST",
        "/api/posts",
        &bob,
        multipart_body(&[("caption", None, b"no image")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("No file selected"));

    // Alice does not follow bob yet: his post shows up in explore, and he
    // is suggested in her feed.
    let (_, body, _) = send(&app, "GET", "/api/explore", Some(&alice), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body, _) = send(&app, "GET", "/api/feed", Some(&alice), None).await;
    assert!(body["data"]["posts"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["suggestions"][0]["username"], json!("bob"));

    send(&app, "POST", &format!("/api/users/{bob_id}/follow"), Some(&alice), None).await;

    let (_, body, _) = send(&app, "GET", "/api/feed", Some(&alice), None).await;
    assert_eq!(body["data"]["posts"][0]["image"], json!(image));
    assert!(body["data"]["suggestions"].as_array().unwrap().is_empty());

    let request = Request::builder()
        .uri(format!("/images/{image}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_settings_and_search() {
    let (app, _) = spawn_app().await;
    let (_, alice) = signup(&app, "alice").await;
    signup(&app, "bob").await;

    let (status, body) = send_multipart(
        &app,
        "PUT",
        "/api/settings",
        &alice,
        multipart_body(&[
            ("full_name", None, b"Alice Liddell"),
            ("bio", None, b"down the rabbit hole"),
            ("profile_pic", Some("me.png"), b"\x89PNG"),
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["full_name"], json!("Alice Liddell"));
    assert_eq!(body["data"]["bio"], json!("down the rabbit hole"));
    assert!(body["data"]["profile_pic"].as_str().unwrap().ends_with("_me.png"));

    let (status, body) = send_multipart(
        &app,
        "PUT",
        "/api/settings",
        &alice,
        multipart_body(&[("email", None, b"bob@example.com")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Email already exists"));

    let (_, body, _) = send(&app, "GET", "/api/users/search?q=Liddell", Some(&alice), None).await;
    assert_eq!(body["data"][0]["username"], json!("alice"));

    let (_, body, _) = send(&app, "GET", "/api/users/search?q=", Some(&alice), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_deleted_user_session_is_rejected() {
    let (app, state) = spawn_app().await;
    let (user_id, cookie) = signup(&app, "ghost").await;

    gramguard::entities::users::Entity::delete_by_id(user_id)
        .exec(&state.store().conn)
        .await
        .unwrap();

    let (status, body, _) = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_status_reports_degraded_classifier() {
    let mut config = test_config();
    config.classifier.model_path = "/nonexistent/model.onnx".to_string();

    let state = gramguard::api::create_app_state_from_config(config, None)
        .await
        .unwrap();
    let app = gramguard::api::router(state.clone()).await;
    let (owner_id, cookie) = signup(&app, "watcher").await;
    let post_id = seed_post(&state, owner_id).await;

    let (status, body, _) = send(&app, "GET", "/api/system/status", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["classifier_degraded"], json!(true));
    assert_eq!(body["data"]["database"], json!(true));

    let (status, body) = comment(&app, &cookie, post_id, "you are a loser").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bullying_detected"], json!(false));
    assert_close(&body["data"]["user_reputation"], 10.0);
}
