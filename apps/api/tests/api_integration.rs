//! End-to-end API integration tests
//!
//! These tests verify the complete HTTP API flows over the in-memory store:
//! - Team creation, lookup and deactivation
//! - User activity changes and review lists
//! - Pull request creation, merge and reassignment
//! - Error envelopes and status codes

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use reviewer_api::api::{build_router, AppState};
use reviewer_api::infrastructure::memory::InMemoryStore;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for oneshot

/// Setup test application over a fresh in-memory store
fn setup_app() -> Router {
    build_router(AppState::in_memory(InMemoryStore::new(), Some(7)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
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

async fn add_team(app: &Router, name: &str, members: &[(&str, bool)]) -> (StatusCode, Value) {
    let members: Vec<Value> = members
        .iter()
        .map(|(id, active)| {
            json!({
                "user_id": id,
                "username": format!("user-{}", id),
                "is_active": active
            })
        })
        .collect();

    send(
        app,
        "POST",
        "/team/add",
        Some(json!({ "team_name": name, "members": members })),
    )
    .await
}

async fn reassign(app: &Router, pr: &str, old: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/pullRequest/reassign",
        Some(json!({ "pull_request_id": pr, "old_user_id": old })),
    )
    .await
}

async fn create_pr(app: &Router, id: &str, author: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/pullRequest/create",
        Some(json!({
            "pull_request_id": id,
            "pull_request_name": format!("PR {}", id),
            "author_id": author
        })),
    )
    .await
}

fn reviewers(pr: &Value) -> Vec<String> {
    pr["assigned_reviewers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_create_and_get_team() {
    let app = setup_app();

    let (status, json) = add_team(&app, "backend", &[("u2", true), ("u1", false)]).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["team"]["team_name"], "backend");

    let (status, json) = send(&app, "GET", "/team/get?team_name=backend", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["team_name"], "backend");
    assert_eq!(json["members"][0]["user_id"], "u1");
    assert_eq!(json["members"][0]["is_active"], false);
    assert_eq!(json["members"][1]["user_id"], "u2");
    assert_eq!(json["members"][1]["username"], "user-u2");
}

#[tokio::test]
async fn test_duplicate_team_is_rejected() {
    let app = setup_app();
    add_team(&app, "backend", &[("u1", true)]).await;

    let (status, json) = add_team(&app, "backend", &[("u2", true)]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "TEAM_EXISTS");
}

#[tokio::test]
async fn test_get_team_errors() {
    let app = setup_app();

    let (status, json) = send(&app, "GET", "/team/get?team_name=ghosts", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");

    let (status, json) = send(&app, "GET", "/team/get", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_set_is_active() {
    let app = setup_app();
    add_team(&app, "backend", &[("u1", true)]).await;

    let (status, json) = send(
        &app,
        "POST",
        "/users/setIsActive",
        Some(json!({ "user_id": "u1", "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["user_id"], "u1");
    assert_eq!(json["user"]["team_name"], "backend");
    assert_eq!(json["user"]["is_active"], false);

    let (status, json) = send(
        &app,
        "POST",
        "/users/setIsActive",
        Some(json!({ "user_id": "ghost", "is_active": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_pull_request_assigns_teammates() {
    let app = setup_app();
    add_team(&app, "backend", &[("a", true), ("r1", true), ("r2", true)]).await;

    let (status, json) = create_pr(&app, "pr-1", "a").await;

    assert_eq!(status, StatusCode::CREATED);
    let pr = &json["pr"];
    assert_eq!(pr["pull_request_id"], "pr-1");
    assert_eq!(pr["author_id"], "a");
    assert_eq!(pr["status"], "OPEN");
    assert_eq!(reviewers(pr), vec!["r1", "r2"]);
    assert!(pr["createdAt"].is_string());
    assert!(pr.get("mergedAt").is_none());
}

#[tokio::test]
async fn test_create_pull_request_errors() {
    let app = setup_app();
    add_team(&app, "backend", &[("a", true)]).await;
    create_pr(&app, "pr-1", "a").await;

    let (status, json) = create_pr(&app, "pr-1", "a").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "PR_EXISTS");

    let (status, json) = create_pr(&app, "pr-2", "ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_merge_is_idempotent() {
    let app = setup_app();
    add_team(&app, "backend", &[("a", true), ("r1", true)]).await;
    create_pr(&app, "pr-1", "a").await;

    let merge = json!({ "pull_request_id": "pr-1" });
    let (status, first) = send(&app, "POST", "/pullRequest/merge", Some(merge.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["pr"]["status"], "MERGED");
    assert!(first["pr"]["mergedAt"].is_string());

    let (status, second) = send(&app, "POST", "/pullRequest/merge", Some(merge)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["pr"]["mergedAt"], first["pr"]["mergedAt"]);

    let (status, _) = send(
        &app,
        "POST",
        "/pullRequest/merge",
        Some(json!({ "pull_request_id": "missing" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reassign_flow() {
    let app = setup_app();
    add_team(&app, "backend", &[("a", true), ("r1", true), ("r2", true)]).await;
    create_pr(&app, "pr-1", "a").await;
    // r1 moves to qa, where c1 is the only active teammate.
    add_team(&app, "qa", &[("r1", true), ("c1", true), ("c2", false)]).await;

    let (status, json) = reassign(&app, "pr-1", "r1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["replaced_by"], "c1");
    assert_eq!(reviewers(&json["pr"]), vec!["c1", "r2"]);

    let (status, json) = send(&app, "GET", "/users/getReview?user_id=c1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user_id"], "c1");
    assert_eq!(json["pull_requests"][0]["pull_request_id"], "pr-1");
    assert_eq!(json["pull_requests"][0]["status"], "OPEN");

    let (_, json) = send(&app, "GET", "/users/getReview?user_id=r1", None).await;
    assert_eq!(json["pull_requests"], json!([]));
}

#[tokio::test]
async fn test_reassign_refusals() {
    let app = setup_app();
    add_team(&app, "backend", &[("a", true), ("r1", true), ("r2", true)]).await;
    create_pr(&app, "pr-1", "a").await;

    let (status, json) = reassign(&app, "pr-1", "r1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "NO_CANDIDATE");

    let (status, json) = reassign(&app, "pr-1", "a").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "NOT_ASSIGNED");

    let (status, json) = reassign(&app, "nope", "r1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");

    send(
        &app,
        "POST",
        "/pullRequest/merge",
        Some(json!({ "pull_request_id": "pr-1" })),
    )
    .await;
    let (status, json) = reassign(&app, "pr-1", "r1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "PR_MERGED");
}

#[tokio::test]
async fn test_deactivate_team_repairs_open_reviews() {
    let app = setup_app();
    add_team(
        &app,
        "backend",
        &[("a", true), ("r1", true), ("r2", true), ("c1", false)],
    )
    .await;
    create_pr(&app, "pr-1", "a").await;
    add_team(&app, "platform", &[("r1", true), ("r2", true)]).await;
    send(
        &app,
        "POST",
        "/users/setIsActive",
        Some(json!({ "user_id": "c1", "is_active": true })),
    )
    .await;

    let (status, json) = send(
        &app,
        "POST",
        "/team/deactivate",
        Some(json!({ "team_name": "platform" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deactivated_users"], 2);
    assert_eq!(json["reassigned_prs"], 1);
    assert!(json["duration"].is_string());

    let (_, json) = send(&app, "GET", "/team/get?team_name=platform", None).await;
    assert_eq!(json["members"][0]["is_active"], false);
    assert_eq!(json["members"][1]["is_active"], false);

    let (_, json) = send(&app, "GET", "/users/getReview?user_id=c1", None).await;
    assert_eq!(json["pull_requests"][0]["pull_request_id"], "pr-1");
}

#[tokio::test]
async fn test_statistics() {
    let app = setup_app();
    add_team(&app, "backend", &[("a", true), ("r1", true), ("r2", true)]).await;
    create_pr(&app, "pr-1", "a").await;
    create_pr(&app, "pr-2", "r1").await;
    send(
        &app,
        "POST",
        "/pullRequest/merge",
        Some(json!({ "pull_request_id": "pr-2" })),
    )
    .await;

    let (status, json) = send(&app, "GET", "/statistics", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_prs"], 2);
    assert_eq!(json["open_prs"], 1);
    assert_eq!(json["merged_prs"], 1);
    assert_eq!(json["prs_by_author"]["user-a"], 1);
    assert_eq!(json["prs_by_author"]["user-r1"], 1);
    assert_eq!(json["reviewer_assignments"]["user-r2"], 2);
    assert_eq!(json["average_reviewers_per_pr"], 2.0);
}

#[tokio::test]
async fn test_blank_identifier_is_a_bad_request() {
    let app = setup_app();

    let (status, json) = send(
        &app,
        "POST",
        "/users/setIsActive",
        Some(json!({ "user_id": "  ", "is_active": true })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}
