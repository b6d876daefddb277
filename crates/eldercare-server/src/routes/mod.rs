//! Route table.

mod accounts;
mod admin;
mod care;
mod donations;
mod elders;
mod medical;
mod operator;
mod rooms;

use axum::routing::get;
use axum::{Json, Router};
use eldercare_core::{Lifecycle, Transition};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(accounts::router())
        .merge(elders::router())
        .merge(operator::router())
        .merge(rooms::router())
        .merge(care::router())
        .merge(medical::router())
        .merge(donations::router())
        .merge(admin::router())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `?status=` filter on list endpoints.
#[derive(Debug, Default, Deserialize)]
struct StatusQuery {
    status: Option<String>,
}

impl StatusQuery {
    fn parse<S: Lifecycle>(&self) -> Result<Option<S>, ApiError> {
        self.status
            .as_deref()
            .map(|s| S::parse(s).ok_or_else(|| ApiError::bad_request(format!("Unknown status: {s}"))))
            .transpose()
    }
}

/// Body naming an elder.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElderRef {
    elder_id: String,
}

/// Hand off a transition's notifications and return its entity.
fn deliver<T>(state: &AppState, transition: Transition<T>) -> Json<T> {
    state.dispatch(transition.notifications);
    Json(transition.entity)
}
