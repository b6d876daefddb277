use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use eldercare_core::models::{NewRoom, Room, RoomUpdate};
use eldercare_core::workflow::RoomService;

use super::ElderRef;
use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/rooms", get(list).post(create))
        .route("/api/rooms/:id", put(update).delete(delete))
        .route("/api/rooms/:id/assign", post(assign))
        .route("/api/rooms/:id/release", post(release))
}

async fn list(State(state): State<AppState>, auth: Auth) -> Result<Json<Vec<Room>>, ApiError> {
    let rooms = state.with_db(move |db| RoomService::new(db).list(&auth.actor)).await?;
    Ok(Json(rooms))
}

async fn create(
    State(state): State<AppState>,
    auth: Auth,
    Json(body): Json<NewRoom>,
) -> Result<(StatusCode, Json<Room>), ApiError> {
    let room = state.with_db(move |db| RoomService::new(db).create(&auth.actor, body)).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn update(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
    Json(body): Json<RoomUpdate>,
) -> Result<Json<Room>, ApiError> {
    let room = state.with_db(move |db| RoomService::new(db).update(&auth.actor, &id, body)).await?;
    Ok(Json(room))
}

async fn delete(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.with_db(move |db| RoomService::new(db).delete(&auth.actor, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn assign(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
    Json(body): Json<ElderRef>,
) -> Result<Json<Room>, ApiError> {
    let room = state
        .with_db(move |db| RoomService::new(db).assign(&auth.actor, &id, &body.elder_id))
        .await?;
    Ok(Json(room))
}

async fn release(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<Room>, ApiError> {
    let room = state.with_db(move |db| RoomService::new(db).release(&auth.actor, &id)).await?;
    Ok(Json(room))
}
