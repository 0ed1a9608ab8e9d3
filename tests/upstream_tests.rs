//! Client and ingestion behavior against an in-process stub of the
//! evaluation service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use social_analytics::cache::AnalyticsCache;
use social_analytics::client::{ClientError, UpstreamClient};
use social_analytics::config::Credentials;
use social_analytics::ingest::Ingestor;

#[derive(Clone, Default)]
struct StubState {
    auth_calls: Arc<AtomicUsize>,
    users_calls: Arc<AtomicUsize>,
    expected_token: Arc<Mutex<String>>,
}

fn authorized(headers: &HeaderMap, state: &StubState) -> bool {
    let expected = format!("Bearer {}", state.expected_token.lock().unwrap());
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        == Some(expected.as_str())
}

async fn stub_auth(State(state): State<StubState>) -> Json<Value> {
    let n = state.auth_calls.fetch_add(1, Ordering::SeqCst) + 1;
    let token = format!("token-{}", n);
    *state.expected_token.lock().unwrap() = token.clone();
    Json(json!({ "access_token": token }))
}

async fn stub_users(State(state): State<StubState>, headers: HeaderMap) -> Response {
    state.users_calls.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers, &state) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({ "users": { "u1": "Alice", "u2": "Bob" } })).into_response()
}

async fn stub_users_always_401(State(state): State<StubState>) -> Response {
    state.users_calls.fetch_add(1, Ordering::SeqCst);
    StatusCode::UNAUTHORIZED.into_response()
}

async fn stub_posts(
    State(state): State<StubState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers, &state) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let posts = match user_id.as_str() {
        "u1" => json!([
            { "id": "p1", "userId": "u1", "title": "first", "content": "one", "timestamp": 100 },
            // No timestamp: ingestion must backfill with the wall clock.
            { "id": "p2", "userId": "u1", "title": "second", "content": "two" },
        ]),
        "u2" => json!([
            { "id": "p3", "userId": "u2", "title": "third", "content": "three", "timestamp": 300 },
        ]),
        _ => json!([]),
    };
    Json(json!({ "posts": posts })).into_response()
}

async fn stub_comments(
    State(state): State<StubState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers, &state) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let count = match post_id.as_str() {
        "p1" => 2,
        "p3" => 5,
        _ => 0,
    };
    let comments: Vec<Value> = (0..count).map(|i| json!({ "id": i, "body": "hi" })).collect();
    Json(json!({ "comments": comments })).into_response()
}

fn stub_router(state: StubState) -> Router {
    Router::new()
        .route("/auth", post(stub_auth))
        .route("/users", get(stub_users))
        .route("/users/{id}/posts", get(stub_posts))
        .route("/posts/{id}/comments", get(stub_comments))
        .with_state(state)
}

async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn test_credentials() -> Credentials {
    Credentials {
        email: "svc@example.com".to_string(),
        name: "svc".to_string(),
        roll_no: "1".to_string(),
        access_code: "code".to_string(),
        client_id: "id".to_string(),
        client_secret: "secret".to_string(),
    }
}

async fn wait_for(mut condition: impl FnMut() -> bool, what: &str) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {}", what);
}

#[tokio::test]
async fn authenticate_stores_token_used_by_requests() {
    let stub = StubState::default();
    let base = spawn_stub(stub_router(stub.clone())).await;
    let client = UpstreamClient::new(&base, test_credentials());

    client.authenticate().await.unwrap();
    let body: Value = client.get_json("/users").await.unwrap();

    assert_eq!(body["users"]["u1"], "Alice");
    assert_eq!(stub.auth_calls.load(Ordering::SeqCst), 1);
    assert_eq!(stub.users_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn expired_token_triggers_one_reauth_and_one_retry() {
    let stub = StubState::default();
    let base = spawn_stub(stub_router(stub.clone())).await;
    let client = UpstreamClient::new(&base, test_credentials());
    client.authenticate().await.unwrap();

    // Invalidate the token on the stub side, as an upstream expiry would.
    *stub.expected_token.lock().unwrap() = "rotated-away".to_string();

    let body: Value = client.get_json("/users").await.unwrap();

    assert_eq!(body["users"]["u2"], "Bob");
    // Initial exchange plus exactly one refresh.
    assert_eq!(stub.auth_calls.load(Ordering::SeqCst), 2);
    // Rejected attempt plus exactly one retry.
    assert_eq!(stub.users_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn second_401_fails_instead_of_looping() {
    let stub = StubState::default();
    let router = Router::new()
        .route("/auth", post(stub_auth))
        .route("/users", get(stub_users_always_401))
        .with_state(stub.clone());
    let base = spawn_stub(router).await;
    let client = UpstreamClient::new(&base, test_credentials());

    let err = client.get_json::<Value>("/users").await.unwrap_err();

    assert!(matches!(err, ClientError::Upstream(_)));
    assert_eq!(stub.auth_calls.load(Ordering::SeqCst), 1);
    assert_eq!(stub.users_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn missing_token_surfaces_as_auth_error() {
    let stub = StubState::default();
    let router = Router::new()
        .route("/auth", post(|| async { Json(json!({ "ok": true })) }))
        .with_state(stub);
    let base = spawn_stub(router).await;
    let client = UpstreamClient::new(&base, test_credentials());

    let err = client.authenticate().await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(_)));
}

#[tokio::test]
async fn full_rebuild_populates_cache_and_backfills_timestamps() {
    let stub = StubState::default();
    let base = spawn_stub(stub_router(stub.clone())).await;
    let client = Arc::new(UpstreamClient::new(&base, test_credentials()));
    let cache = Arc::new(AnalyticsCache::new());
    let ingestor = Ingestor::new(client.clone(), cache.clone());
    client.authenticate().await.unwrap();

    let floor = Utc::now().timestamp_millis();
    ingestor.initialize_data().await;

    let mut user_ids = cache.user_ids();
    user_ids.sort();
    assert_eq!(user_ids, vec!["u1".to_string(), "u2".to_string()]);

    let top = cache.top_users(5);
    assert_eq!(top.len(), 2);
    assert_eq!(top[0], ("u1".to_string(), Some("Alice".to_string()), 2));
    assert_eq!(top[1], ("u2".to_string(), Some("Bob".to_string()), 1));

    let latest = cache.latest_posts(10);
    assert_eq!(latest.len(), 3);
    let backfilled = latest.iter().find(|p| p.id == "p2").unwrap();
    assert!(backfilled.timestamp >= floor);

    // Comment counts arrive from fire-and-forget tasks.
    wait_for(
        || {
            cache
                .popular_posts()
                .is_some_and(|popular| popular.iter().any(|(p, count)| p.id == "p3" && *count == 5))
        },
        "comment counts to settle",
    )
    .await;
}

#[tokio::test]
async fn unreachable_upstream_degrades_to_empty_results() {
    let client = Arc::new(UpstreamClient::new("http://127.0.0.1:9", test_credentials()));
    let cache = Arc::new(AnalyticsCache::new());
    let ingestor = Ingestor::new(client, cache.clone());

    assert!(ingestor.fetch_users().await.is_empty());
    assert!(ingestor.fetch_posts_for_user("u1").await.is_empty());
    assert_eq!(ingestor.fetch_comments_for_post("p1").await, 0);
    assert!(cache.users_is_empty());
    assert!(cache.posts_is_empty());
}

#[tokio::test]
async fn overlapping_rebuilds_keep_structures_valid() {
    let stub = StubState::default();
    let base = spawn_stub(stub_router(stub.clone())).await;
    let client = Arc::new(UpstreamClient::new(&base, test_credentials()));
    let cache = Arc::new(AnalyticsCache::new());
    let ingestor = Ingestor::new(client.clone(), cache.clone());
    client.authenticate().await.unwrap();

    tokio::join!(ingestor.initialize_data(), ingestor.initialize_data());

    // The interleaving is a race; the shapes must survive it.
    let mut user_ids = cache.user_ids();
    user_ids.sort();
    assert_eq!(user_ids, vec!["u1".to_string(), "u2".to_string()]);

    let latest = cache.latest_posts(100);
    assert!(latest.len() >= 3 && latest.len() <= 6);
    assert!(latest.iter().all(|p| p.user_id == "u1" || p.user_id == "u2"));

    // Per-user snapshots are replaced, not accumulated, so the counts are
    // exact regardless of which rebuild finished last.
    let top = cache.top_users(5);
    assert_eq!(top[0].2, 2);
    assert_eq!(top[1].2, 1);
}
