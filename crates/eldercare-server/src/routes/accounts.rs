use axum::extract::{Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use eldercare_core::models::{Guardian, LoginRequest, NewGuardian, NewStaff, Role, Staff, StaffUpdate};
use eldercare_core::workflow::{AccountKind, AccountService};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{Auth, TOKEN_COOKIE};
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/guardians/register", post(register))
        .route("/api/guardians/login", post(guardian_login))
        .route("/api/staff/login", post(staff_login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/admin/staff", get(list_staff).post(create_staff))
        .route("/api/admin/staff/:id", put(update_staff).delete(delete_staff))
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<NewGuardian>,
) -> Result<(StatusCode, Json<Guardian>), ApiError> {
    let guardian = state.with_db(move |db| AccountService::new(db).register_guardian(body)).await?;
    Ok((StatusCode::CREATED, Json(guardian)))
}

async fn guardian_login(state: State<AppState>, body: Json<LoginRequest>) -> Result<Response, ApiError> {
    login(state, AccountKind::Guardian, body).await
}

async fn staff_login(state: State<AppState>, body: Json<LoginRequest>) -> Result<Response, ApiError> {
    login(state, AccountKind::Staff, body).await
}

/// Token in the body for API clients, and as a cookie for browsers.
async fn login(
    State(state): State<AppState>,
    kind: AccountKind,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let ttl = state.session_ttl_hours;
    let outcome = state
        .with_db(move |db| AccountService::new(db).with_session_ttl(ttl).login(kind, &body))
        .await?;
    let cookie = format!(
        "{TOKEN_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        outcome.token,
        ttl.saturating_mul(3600)
    );
    Ok(([(SET_COOKIE, cookie)], Json(outcome)).into_response())
}

async fn logout(State(state): State<AppState>, auth: Auth) -> Result<Response, ApiError> {
    state.with_db(move |db| AccountService::new(db).logout(&auth.token)).await?;
    let cleared = format!("{TOKEN_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, cleared)]).into_response())
}

async fn me(State(state): State<AppState>, auth: Auth) -> Result<Json<Value>, ApiError> {
    let role = auth.actor.role;
    let profile = state.with_db(move |db| AccountService::new(db).profile(&auth.actor)).await?;
    Ok(Json(json!({ "role": role, "profile": profile })))
}

#[derive(Debug, Deserialize)]
struct RoleQuery {
    role: Option<String>,
}

async fn list_staff(
    State(state): State<AppState>,
    auth: Auth,
    Query(query): Query<RoleQuery>,
) -> Result<Json<Vec<Staff>>, ApiError> {
    let role = query
        .role
        .as_deref()
        .map(|r| Role::parse(r).ok_or_else(|| ApiError::bad_request(format!("Unknown role: {r}"))))
        .transpose()?;
    let staff = state
        .with_db(move |db| AccountService::new(db).list_staff(&auth.actor, role))
        .await?;
    Ok(Json(staff))
}

async fn create_staff(
    State(state): State<AppState>,
    auth: Auth,
    Json(body): Json<NewStaff>,
) -> Result<(StatusCode, Json<Staff>), ApiError> {
    let staff = state
        .with_db(move |db| AccountService::new(db).create_staff(&auth.actor, body))
        .await?;
    Ok((StatusCode::CREATED, Json(staff)))
}

async fn update_staff(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
    Json(body): Json<StaffUpdate>,
) -> Result<Json<Staff>, ApiError> {
    let staff = state
        .with_db(move |db| AccountService::new(db).update_staff(&auth.actor, &id, body))
        .await?;
    Ok(Json(staff))
}

async fn delete_staff(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.with_db(move |db| AccountService::new(db).delete_staff(&auth.actor, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
