use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use eldercare_core::models::{Event, EventInput, Meal, NewMeal};
use eldercare_core::workflow::CareService;

use super::ElderRef;
use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/meals", post(create_meal))
        .route("/api/meals/:id", delete(delete_meal))
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/:id", put(update_event).delete(delete_event))
        .route("/api/events/:id/enroll", post(enroll))
        .route("/api/events/:id/enroll/:elder_id", delete(unenroll))
}

async fn create_meal(
    State(state): State<AppState>,
    auth: Auth,
    Json(body): Json<NewMeal>,
) -> Result<(StatusCode, Json<Meal>), ApiError> {
    let meal = state.with_db(move |db| CareService::new(db).create_meal(&auth.actor, body)).await?;
    Ok((StatusCode::CREATED, Json(meal)))
}

async fn delete_meal(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.with_db(move |db| CareService::new(db).delete_meal(&auth.actor, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_events(State(state): State<AppState>, auth: Auth) -> Result<Json<Vec<Event>>, ApiError> {
    let events = state.with_db(move |db| CareService::new(db).events(&auth.actor)).await?;
    Ok(Json(events))
}

async fn create_event(
    State(state): State<AppState>,
    auth: Auth,
    Json(body): Json<EventInput>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let event = state
        .with_db(move |db| CareService::new(db).create_event(&auth.actor, body))
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
    Json(body): Json<EventInput>,
) -> Result<Json<Event>, ApiError> {
    let event = state
        .with_db(move |db| CareService::new(db).update_event(&auth.actor, &id, body))
        .await?;
    Ok(Json(event))
}

async fn delete_event(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.with_db(move |db| CareService::new(db).delete_event(&auth.actor, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn enroll(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
    Json(body): Json<ElderRef>,
) -> Result<Json<Event>, ApiError> {
    let event = state
        .with_db(move |db| CareService::new(db).enroll(&auth.actor, &id, &body.elder_id))
        .await?;
    Ok(Json(event))
}

async fn unenroll(
    State(state): State<AppState>,
    auth: Auth,
    Path((id, elder_id)): Path<(String, String)>,
) -> Result<Json<Event>, ApiError> {
    let event = state
        .with_db(move |db| CareService::new(db).unenroll(&auth.actor, &id, &elder_id))
        .await?;
    Ok(Json(event))
}
