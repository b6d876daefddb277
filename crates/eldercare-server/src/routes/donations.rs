use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use eldercare_core::models::{Donation, DonationStatus, InventoryInput, InventoryItem, NewDonation};
use eldercare_core::workflow::{DonationService, InventoryMatch};
use serde::Deserialize;

use super::{deliver, StatusQuery};
use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_SEARCH_LIMIT: usize = 10;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/donations", get(list).post(create))
        .route("/api/donations/:id/receive", post(receive))
        .route("/api/inventory", get(inventory).post(create_item))
        .route("/api/inventory/search", get(search))
        .route("/api/inventory/:id", put(update_item).delete(delete_item))
}

/// Public: no session required.
async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewDonation>,
) -> Result<(StatusCode, Json<Donation>), ApiError> {
    let donation = state.with_db(move |db| DonationService::new(db).create(body)).await?;
    Ok((StatusCode::CREATED, Json(donation)))
}

async fn list(
    State(state): State<AppState>,
    auth: Auth,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Donation>>, ApiError> {
    let status: Option<DonationStatus> = query.parse()?;
    let donations = state
        .with_db(move |db| DonationService::new(db).list(&auth.actor, status))
        .await?;
    Ok(Json(donations))
}

async fn receive(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<Donation>, ApiError> {
    let transition = state
        .with_db(move |db| DonationService::new(db).receive(&auth.actor, &id))
        .await?;
    Ok(deliver(&state, transition))
}

async fn inventory(State(state): State<AppState>, auth: Auth) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let items = state.with_db(move |db| DonationService::new(db).inventory(&auth.actor)).await?;
    Ok(Json(items))
}

async fn create_item(
    State(state): State<AppState>,
    auth: Auth,
    Json(body): Json<InventoryInput>,
) -> Result<(StatusCode, Json<InventoryItem>), ApiError> {
    let item = state
        .with_db(move |db| DonationService::new(db).create_item(&auth.actor, body))
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_item(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
    Json(body): Json<InventoryInput>,
) -> Result<Json<InventoryItem>, ApiError> {
    let item = state
        .with_db(move |db| DonationService::new(db).update_item(&auth.actor, &id, body))
        .await?;
    Ok(Json(item))
}

async fn delete_item(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.with_db(move |db| DonationService::new(db).delete_item(&auth.actor, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

async fn search(
    State(state): State<AppState>,
    auth: Auth,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<InventoryMatch>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let matches = state
        .with_db(move |db| DonationService::new(db).search(&auth.actor, &query.q, limit))
        .await?;
    Ok(Json(matches))
}
