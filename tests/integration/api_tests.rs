//! API integration tests
//!
//! Drive the full router in-process over an in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use faena_server::{
    api,
    config::AppConfig,
    models::UserClaims,
    repository::Repository,
    services::Services,
    AppState,
};

const SECRET: &str = "integration-secret";
const ADMIN: &str = "admin-uid";

fn app() -> Router {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = SECRET.to_string();
    config.auth.admin_uids = vec![ADMIN.to_string()];

    let services = Services::new(Repository::in_memory(), &config).expect("services");
    api::create_router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

fn token(uid: &str) -> String {
    let now = Utc::now().timestamp();
    UserClaims {
        sub: uid.to_string(),
        email: None,
        exp: now + 3600,
        iat: now,
    }
    .create_token(SECRET)
    .expect("token")
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    uid: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(format!("/api/v1{}", uri));
    if let Some(uid) = uid {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token(uid)));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn seed_catalog(app: &Router) {
    for (id, name) in [("O1", "Rosa"), ("O2", "Iván")] {
        let (status, _) = send(
            app,
            Method::POST,
            "/operators",
            Some(ADMIN),
            Some(json!({ "id": id, "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, _) = send(
        app,
        Method::POST,
        "/equipment",
        Some(ADMIN),
        Some(json!({ "id": "E1", "name": "Excavator 320" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

/// Link a uid to an operator so it can sign in as that operator
async fn enroll_operator(app: &Router, uid: &str, operator_id: &str) {
    let (status, _) = send(
        app,
        Method::PUT,
        &format!("/users/{}", uid),
        Some(ADMIN),
        Some(json!({ "operator_id": operator_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_authentication_and_roles() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/me", Some("stranger"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::GET, "/me", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    seed_catalog(&app).await;
    enroll_operator(&app, "rosa-uid", "O1").await;
    let (status, body) = send(&app, Method::GET, "/me", Some("rosa-uid"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "operator");
    assert_eq!(body["operator_id"], "O1");

    // Operators cannot manage the catalog
    let (status, _) = send(
        &app,
        Method::POST,
        "/equipment",
        Some("rosa-uid"),
        Some(json!({ "id": "E2", "name": "Loader" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_overlapping_binding_is_rejected() {
    let app = app();
    seed_catalog(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/weekly-assignments",
        Some(ADMIN),
        Some(json!({
            "operator_id": "O1",
            "equipment_id": "E1",
            "start_date": "2024-01-01",
            "end_date": "2024-01-05",
            "shift": "day"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/weekly-assignments",
        Some(ADMIN),
        Some(json!({
            "operator_id": "O2",
            "equipment_id": "E1",
            "start_date": "2024-01-03",
            "end_date": "2024-01-04",
            "shift": "night"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap_or_default().contains("O1"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/weekly-assignments",
        Some(ADMIN),
        Some(json!({
            "operator_id": "O2",
            "equipment_id": "E1",
            "start_date": "2024-01-06",
            "end_date": "2024-01-06",
            "shift": "night"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_assignment_lifecycle_through_api() {
    let app = app();
    seed_catalog(&app).await;
    enroll_operator(&app, "rosa-uid", "O1").await;
    enroll_operator(&app, "ivan-uid", "O2").await;

    let (status, assignment) = send(
        &app,
        Method::POST,
        "/assignments",
        Some(ADMIN),
        Some(json!({
            "operator_id": "O1",
            "equipment_id": "E1",
            "date": "2024-01-02",
            "activity": "Trench digging",
            "location": "North pit",
            "requester": "Site office"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(assignment["status"], "pending");
    let id = assignment["id"].as_str().expect("id").to_string();

    // Finishing straight from pending is illegal
    let (status, _) = send(&app, Method::POST, &format!("/assignments/{}/finish", id), Some("rosa-uid"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Another operator cannot drive it
    let (status, _) = send(&app, Method::POST, &format!("/assignments/{}/start", id), Some("ivan-uid"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, started) = send(&app, Method::POST, &format!("/assignments/{}/start", id), Some("rosa-uid"), None).await;
    assert_eq!(status, StatusCode::OK);
    let start_time = started["start_time"].clone();

    for step in ["pause", "resume", "finish"] {
        let (status, _) = send(&app, Method::POST, &format!("/assignments/{}/{}", id, step), Some("rosa-uid"), None).await;
        assert_eq!(status, StatusCode::OK, "{} failed", step);
    }

    let (status, finished) = send(&app, Method::GET, &format!("/assignments/{}", id), Some("rosa-uid"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(finished["status"], "finished");
    assert_eq!(finished["start_time"], start_time);
    assert!(finished["duration_minutes"].as_i64().expect("duration") >= 0);

    // Nothing is legal after finishing
    let (status, _) = send(&app, Method::POST, &format!("/assignments/{}/start", id), Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Operators only list their own work
    let (_, listed) = send(&app, Method::GET, "/assignments", Some("ivan-uid"), None).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_loan_flow_with_public_tracking() {
    let app = app();
    seed_catalog(&app).await;

    let (status, tracking) = send(
        &app,
        Method::POST,
        "/public/loans",
        None,
        Some(json!({
            "applicant_name": "Luis Pérez",
            "applicant_id": "12345678",
            "equipment_id": "E1",
            "requested_from": "2024-01-10T08:00:00Z",
            "requested_to": "2024-01-10T12:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let code = tracking["tracking_code"].as_str().expect("code").to_string();
    assert_eq!(tracking["status"], "pending");

    let (_, loans) = send(&app, Method::GET, "/loans", Some(ADMIN), None).await;
    let id = loans[0]["id"].as_str().expect("loan id").to_string();

    // Empty window
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/loans/{}/approve", id),
        Some(ADMIN),
        Some(json!({
            "approved_from": "2024-01-10T09:00:00Z",
            "approved_to": "2024-01-10T09:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/loans/{}/approve", id),
        Some(ADMIN),
        Some(json!({
            "approved_from": "2024-01-10T09:00:00Z",
            "approved_to": "2024-01-10T11:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Return before delivery
    let (status, _) = send(&app, Method::POST, &format!("/loans/{}/return", id), Some(ADMIN), Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/loans/{}/deliver", id),
        Some(ADMIN),
        Some(json!({ "name": "Luis Pérez", "id": "12345678" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, tracked) = send(&app, Method::GET, &format!("/public/loans/{}", code.to_lowercase()), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tracked["status"], "in_loan");

    let (status, returned) = send(&app, Method::POST, &format!("/loans/{}/return", id), Some(ADMIN), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["status"], "returned");
    assert!(returned["effective_minutes"].as_i64().is_some());
}

#[tokio::test]
async fn test_request_approval_creates_assignments() {
    let app = app();
    seed_catalog(&app).await;

    let (status, tracking) = send(
        &app,
        Method::POST,
        "/public/requests",
        None,
        Some(json!({
            "requester_name": "Site office",
            "activity": "Road grading",
            "location": "Access road",
            "requested_date": "2024-01-08"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let code = tracking["tracking_code"].as_str().expect("code").to_string();

    let (_, requests) = send(&app, Method::GET, "/requests?status=pending", Some(ADMIN), None).await;
    let id = requests[0]["id"].as_str().expect("request id").to_string();

    let (status, approved) = send(
        &app,
        Method::POST,
        &format!("/requests/{}/approve", id),
        Some(ADMIN),
        Some(json!({ "slots": [{ "operator_id": "O1", "equipment_id": "E1" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["assignment_ids"].as_array().map(Vec::len), Some(1));

    let assignment_id = approved["assignment_ids"][0].as_str().expect("assignment id").to_string();
    let (status, _) = send(&app, Method::POST, &format!("/assignments/{}/start", assignment_id), Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, tracked) = send(&app, Method::GET, &format!("/public/requests/{}", code), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tracked["status"], "approved");
    assert_eq!(tracked["execution_status"], "in_progress");

    // Decisions are final
    let (status, _) = send(&app, Method::POST, &format!("/requests/{}/reject", id), Some(ADMIN), Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_operator_change_feed_hides_restricted_collections() {
    let app = app();
    seed_catalog(&app).await;
    enroll_operator(&app, "uid-o1", "O1").await;

    let (status, _) = send(&app, Method::GET, "/events?collection=pushTokens", Some("uid-o1"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = Request::builder()
        .uri("/api/v1/events")
        .header(header::AUTHORIZATION, format!("Bearer {}", token("uid-o1")))
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let mut feed = response.into_body();

    let (status, _) = send(
        &app,
        Method::PUT,
        "/push-tokens",
        Some(ADMIN),
        Some(json!({ "token": "ExponentPushToken[ADMIN-SECRET-123]" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        Method::POST,
        "/equipment",
        Some(ADMIN),
        Some(json!({ "id": "E9", "name": "Dozer D6" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // the equipment change is the first one the operator may see
    let frame = tokio::time::timeout(std::time::Duration::from_secs(5), feed.frame())
        .await
        .expect("change within timeout")
        .expect("open stream")
        .expect("frame");
    let text = String::from_utf8(frame.into_data().expect("data frame").to_vec()).expect("utf8");
    assert!(text.contains("event: change"));
    assert!(text.contains("\"equipment\""));
    assert!(!text.contains("ADMIN-SECRET-123"));
    assert!(!text.contains("pushTokens"));
}
