use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use eldercare_core::models::{Elder, Meal, NewElder, Payment, Prescription};
use eldercare_core::workflow::{CareService, ConsultationService, ElderService};
use serde::Deserialize;

use super::deliver;
use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/elders", post(submit))
        .route("/api/elders/mine", get(mine))
        .route("/api/elders/:id", get(get_elder).delete(delete_elder))
        .route("/api/elders/:id/meals", get(meals))
        .route("/api/elders/:id/prescriptions", get(prescriptions))
        .route("/api/elders/:id/payments", post(reopen_payment))
        .route("/api/payments/mine", get(my_payments))
        .route("/api/payments/:id/confirm", post(confirm_payment))
}

async fn submit(
    State(state): State<AppState>,
    auth: Auth,
    Json(body): Json<NewElder>,
) -> Result<(StatusCode, Json<Elder>), ApiError> {
    let elder = state.with_elders(move |elders| elders.submit(&auth.actor, body)).await?;
    Ok((StatusCode::CREATED, Json(elder)))
}

async fn mine(State(state): State<AppState>, auth: Auth) -> Result<Json<Vec<Elder>>, ApiError> {
    let elders = state.with_elders(move |elders| elders.list_for_guardian(&auth.actor)).await?;
    Ok(Json(elders))
}

async fn get_elder(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<Elder>, ApiError> {
    let elder = state.with_elders(move |elders| elders.get(&auth.actor, &id)).await?;
    Ok(Json(elder))
}

async fn delete_elder(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.with_elders(move |elders| elders.delete(&auth.actor, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn meals(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<Vec<Meal>>, ApiError> {
    let meals = state
        .with_db(move |db| CareService::new(db).meals_for_elder(&auth.actor, &id))
        .await?;
    Ok(Json(meals))
}

async fn prescriptions(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<Vec<Prescription>>, ApiError> {
    let prescriptions = state
        .with_db(move |db| ConsultationService::new(db).prescriptions_for_elder(&auth.actor, &id))
        .await?;
    Ok(Json(prescriptions))
}

async fn reopen_payment(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let transition = state
        .with_elders(move |elders| elders.reopen_payment(&auth.actor, &id))
        .await?;
    Ok((StatusCode::CREATED, deliver(&state, transition)))
}

async fn my_payments(State(state): State<AppState>, auth: Auth) -> Result<Json<Vec<Payment>>, ApiError> {
    let payments = state
        .with_elders(move |elders| elders.payments_for_guardian(&auth.actor))
        .await?;
    Ok(Json(payments))
}

/// Mock gateway result.
#[derive(Debug, Deserialize)]
struct PaymentOutcome {
    success: bool,
}

async fn confirm_payment(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
    Json(body): Json<PaymentOutcome>,
) -> Result<Json<Payment>, ApiError> {
    let transition = state
        .with_elders(move |elders| elders.confirm_payment(&auth.actor, &id, body.success))
        .await?;
    Ok(deliver(&state, transition))
}
