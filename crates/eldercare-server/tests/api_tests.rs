//! HTTP API tests driven through the router with `oneshot`.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use eldercare_core::workflow::{AccountService, WorkflowSettings};
use eldercare_core::Database;
use eldercare_server::dispatch::LogNotifier;
use eldercare_server::{build_router, AppState, REQUEST_ID_HEADER};
use serde_json::{json, Value};
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "root@care.org";
const PASSWORD: &str = "correct-horse";

fn app() -> Router {
    let db = Database::open_in_memory().unwrap();
    AccountService::new(&db).bootstrap_admin(ADMIN_EMAIL, PASSWORD).unwrap();
    build_router(AppState::new(db, WorkflowSettings::default(), 24, Arc::new(LogNotifier)))
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request(method, uri, token, body)).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn register_guardian(app: &Router, email: &str) -> String {
    let (status, _) = call(
        app,
        Method::POST,
        "/api/guardians/register",
        None,
        Some(json!({ "name": "Ann", "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    login(app, "/api/guardians/login", email).await
}

async fn login(app: &Router, path: &str, email: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        path,
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().unwrap().to_string()
}

fn jane_doe() -> Value {
    json!({
        "fullName": "Jane Doe",
        "dob": "1950-01-01",
        "gender": "female",
        "address": "12 Elm St",
        "medicalNotes": "none"
    })
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_guardian_submits_elder() {
    let app = app();
    let token = register_guardian(&app, "ann@example.com").await;

    let (status, body) = call(&app, Method::POST, "/api/elders", Some(&token), Some(jane_doe())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "DISABLED_PENDING_REVIEW");
    assert_eq!(body["fullName"], "Jane Doe");

    let (status, mine) = call(&app, Method::GET, "/api/elders/mine", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_auth_errors() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/elders/mine", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let (status, _) = call(&app, Method::GET, "/api/elders/mine", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = register_guardian(&app, "ann@example.com").await;
    let (status, body) = call(&app, Method::GET, "/api/operator/elders", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap().contains("guardian"));

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/guardians/register",
        None,
        Some(json!({ "name": "Ann", "email": "ANN@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cookie_session_and_logout() {
    let app = app();
    register_guardian(&app, "ann@example.com").await;

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/guardians/login",
            None,
            Some(json!({ "email": "ann@example.com", "password": PASSWORD })),
        ))
        .await
        .unwrap();
    let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("token="));
    let pair = cookie.split(';').next().unwrap().to_string();

    let me = Request::builder()
        .uri("/api/auth/me")
        .header(COOKIE, &pair)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(me).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["role"], "guardian");
    assert_eq!(body["profile"]["email"], "ann@example.com");

    let logout = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/logout")
        .header(COOKIE, &pair)
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.clone().oneshot(logout).await.unwrap().status(), StatusCode::NO_CONTENT);

    let again = Request::builder()
        .uri("/api/auth/me")
        .header(COOKIE, &pair)
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.clone().oneshot(again).await.unwrap().status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admission_over_http() {
    let app = app();
    let guardian = register_guardian(&app, "ann@example.com").await;
    let admin = login(&app, "/api/staff/login", ADMIN_EMAIL).await;

    let (_, elder) = call(&app, Method::POST, "/api/elders", Some(&guardian), Some(jane_doe())).await;
    let id = elder["id"].as_str().unwrap();

    let (status, pending) = call(
        &app,
        Method::GET,
        "/api/operator/elders?status=DISABLED_PENDING_REVIEW",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, _) = call(&app, Method::GET, "/api/operator/elders?status=SLEEPING", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, approved) = call(
        &app,
        Method::POST,
        &format!("/api/operator/elders/{id}/approve"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "APPROVED_AWAITING_PAYMENT");

    // Activation before payment
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/operator/elders/{id}/activate"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let payment_id = approved["paymentId"].as_str().unwrap();
    let (status, payment) = call(
        &app,
        Method::POST,
        &format!("/api/payments/{payment_id}/confirm"),
        Some(&guardian),
        Some(json!({ "success": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "SUCCESS");

    let (status, active) = call(
        &app,
        Method::POST,
        &format!("/api/operator/elders/{id}/activate"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["status"], "ACTIVE");

    // A finished elder cannot be approved again
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/operator/elders/{id}/approve"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_donation_received_once() {
    let app = app();
    let admin = login(&app, "/api/staff/login", ADMIN_EMAIL).await;

    let (status, donation) = call(
        &app,
        Method::POST,
        "/api/donations",
        None,
        Some(json!({
            "donorName": "Sam",
            "donorEmail": "sam@mail.org",
            "donationType": "item",
            "itemName": "Blankets",
            "quantity": 5
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/donations/{}/receive", donation["id"].as_str().unwrap());

    let (status, received) = call(&app, Method::POST, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(received["status"], "received");

    let (status, _) = call(&app, Method::POST, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, items) = call(&app, Method::GET, "/api/inventory", Some(&admin), None).await;
    assert_eq!(items[0]["quantity"], 5);

    let (status, hits) = call(&app, Method::GET, "/api/inventory/search?q=blanket", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits[0]["item"]["name"], "Blankets");
}

#[tokio::test]
async fn test_csv_export() {
    let app = app();
    let admin = login(&app, "/api/staff/login", ADMIN_EMAIL).await;
    let guardian = register_guardian(&app, "ann@example.com").await;
    call(&app, Method::POST, "/api/elders", Some(&guardian), Some(jane_doe())).await;

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/admin/export/elders.csv", Some(&admin), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let csv = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.contains("Jane Doe"));

    let (status, _) = call(&app, Method::GET, "/api/admin/export/elders.csv", Some(&guardian), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = app();
    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-42");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = app();
    let token = register_guardian(&app, "ann@example.com").await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/elders")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"fullName\":"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}
