use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use eldercare_core::models::{
    Appointment, Consultation, ConsultationDecision, NewConsultation, NewPrescription, Prescription,
};
use eldercare_core::workflow::ConsultationService;
use serde::Deserialize;

use super::deliver;
use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/consultations", get(list).post(create))
        .route("/api/consultations/:id/approve", post(approve))
        .route("/api/consultations/:id/reject", post(reject))
        .route("/api/appointments", get(appointments))
        .route("/api/appointments/:id/complete", post(complete))
        .route("/api/appointments/:id/cancel", post(cancel))
        .route("/api/prescriptions", post(prescribe))
}

async fn list(State(state): State<AppState>, auth: Auth) -> Result<Json<Vec<Consultation>>, ApiError> {
    let consultations = state
        .with_db(move |db| ConsultationService::new(db).list(&auth.actor))
        .await?;
    Ok(Json(consultations))
}

async fn create(
    State(state): State<AppState>,
    auth: Auth,
    Json(body): Json<NewConsultation>,
) -> Result<(StatusCode, Json<Consultation>), ApiError> {
    let consultation = state
        .with_db(move |db| ConsultationService::new(db).create(&auth.actor, body))
        .await?;
    Ok((StatusCode::CREATED, Json(consultation)))
}

async fn approve(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
    body: Option<Json<ConsultationDecision>>,
) -> Result<Json<Consultation>, ApiError> {
    let decision = body.map(|Json(d)| d).unwrap_or_default();
    let transition = state
        .with_db(move |db| ConsultationService::new(db).approve(&auth.actor, &id, decision))
        .await?;
    Ok(deliver(&state, transition))
}

async fn reject(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
    body: Option<Json<ConsultationDecision>>,
) -> Result<Json<Consultation>, ApiError> {
    let decision = body.map(|Json(d)| d).unwrap_or_default();
    let transition = state
        .with_db(move |db| ConsultationService::new(db).reject(&auth.actor, &id, decision))
        .await?;
    Ok(deliver(&state, transition))
}

async fn appointments(State(state): State<AppState>, auth: Auth) -> Result<Json<Vec<Appointment>>, ApiError> {
    let appointments = state
        .with_db(move |db| ConsultationService::new(db).appointments(&auth.actor))
        .await?;
    Ok(Json(appointments))
}

#[derive(Debug, Default, Deserialize)]
struct VisitNotes {
    notes: Option<String>,
}

async fn complete(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
    body: Option<Json<VisitNotes>>,
) -> Result<Json<Appointment>, ApiError> {
    let notes = body.and_then(|Json(b)| b.notes);
    let appointment = state
        .with_db(move |db| {
            ConsultationService::new(db).complete_appointment(&auth.actor, &id, notes)
        })
        .await?;
    Ok(Json(appointment))
}

async fn cancel(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
    body: Option<Json<VisitNotes>>,
) -> Result<Json<Appointment>, ApiError> {
    let notes = body.and_then(|Json(b)| b.notes);
    let appointment = state
        .with_db(move |db| ConsultationService::new(db).cancel_appointment(&auth.actor, &id, notes))
        .await?;
    Ok(Json(appointment))
}

async fn prescribe(
    State(state): State<AppState>,
    auth: Auth,
    Json(body): Json<NewPrescription>,
) -> Result<(StatusCode, Json<Prescription>), ApiError> {
    let prescription = state
        .with_db(move |db| ConsultationService::new(db).prescribe(&auth.actor, body))
        .await?;
    Ok((StatusCode::CREATED, Json(prescription)))
}
