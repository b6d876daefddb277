use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use eldercare_core::models::{Elder, ElderStatus, Payment, PaymentStatus};
use eldercare_core::workflow::ElderService;
use serde::Deserialize;

use super::{deliver, StatusQuery};
use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/operator/elders", get(list_elders))
        .route("/api/operator/elders/:id/approve", post(approve))
        .route("/api/operator/elders/:id/reject", post(reject))
        .route("/api/operator/elders/:id/payment-reminder", post(payment_reminder))
        .route("/api/operator/elders/:id/activate", post(activate))
        .route("/api/operator/elders/:id/caretaker", post(assign_caretaker))
        .route("/api/operator/payments", get(list_payments))
        .route("/api/caretaker/elders", get(caretaker_elders))
}

async fn list_elders(
    State(state): State<AppState>,
    auth: Auth,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Elder>>, ApiError> {
    let status: Option<ElderStatus> = query.parse()?;
    let elders = state.with_elders(move |elders| elders.list_by_status(&auth.actor, status)).await?;
    Ok(Json(elders))
}

async fn list_payments(
    State(state): State<AppState>,
    auth: Auth,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let status: Option<PaymentStatus> = query.parse()?;
    let payments = state
        .with_elders(move |elders| elders.list_payments(&auth.actor, status))
        .await?;
    Ok(Json(payments))
}

async fn approve(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<Elder>, ApiError> {
    let transition = state.with_elders(move |elders| elders.approve(&auth.actor, &id)).await?;
    Ok(deliver(&state, transition))
}

#[derive(Debug, Deserialize)]
struct Rejection {
    #[serde(default)]
    reason: String,
}

async fn reject(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
    Json(body): Json<Rejection>,
) -> Result<Json<Elder>, ApiError> {
    let transition = state
        .with_elders(move |elders| elders.reject(&auth.actor, &id, &body.reason))
        .await?;
    Ok(deliver(&state, transition))
}

async fn payment_reminder(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<Elder>, ApiError> {
    let transition = state
        .with_elders(move |elders| elders.send_payment_reminder(&auth.actor, &id))
        .await?;
    Ok(deliver(&state, transition))
}

async fn activate(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<Elder>, ApiError> {
    let transition = state.with_elders(move |elders| elders.activate(&auth.actor, &id)).await?;
    Ok(deliver(&state, transition))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaretakerRef {
    caretaker_id: String,
}

async fn assign_caretaker(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
    Json(body): Json<CaretakerRef>,
) -> Result<Json<Elder>, ApiError> {
    let transition = state
        .with_elders(move |elders| elders.assign_caretaker(&auth.actor, &id, &body.caretaker_id))
        .await?;
    Ok(deliver(&state, transition))
}

async fn caretaker_elders(State(state): State<AppState>, auth: Auth) -> Result<Json<Vec<Elder>>, ApiError> {
    let elders = state.with_elders(move |elders| elders.list_for_caretaker(&auth.actor)).await?;
    Ok(Json(elders))
}
