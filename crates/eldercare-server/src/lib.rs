//! HTTP/JSON API for the elder-care facility.
//!
//! Handlers are thin: they extract the caller, take the database lock for
//! one synchronous workflow call, hand any resulting notifications to the
//! [`Dispatcher`](dispatch::Dispatcher) and serialize the entity.

use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Instrument};

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Every route plus CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    routes::router()
        .layer(middleware::from_fn(request_tracing))
        .layer(cors)
        .with_state(state)
}

/// Wrap each request in a span keyed by a request id, echoed back in
/// `x-request-id`.
async fn request_tracing(request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        let mut response = next.run(request).await;
        info!(status = response.status().as_u16(), "request finished");
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}
