use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use eldercare_core::export::ReportService;
use eldercare_core::DashboardStats;

use crate::auth::Auth;
use crate::error::ApiError;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/dashboard", get(dashboard))
        .route("/api/admin/export/elders.csv", get(export_elders))
        .route("/api/admin/export/donations.csv", get(export_donations))
}

async fn dashboard(State(state): State<AppState>, auth: Auth) -> Result<Json<DashboardStats>, ApiError> {
    let stats = state.with_db(move |db| ReportService::new(db).dashboard(&auth.actor)).await?;
    Ok(Json(stats))
}

async fn export_elders(State(state): State<AppState>, auth: Auth) -> Result<Response, ApiError> {
    let csv = state.with_db(move |db| ReportService::new(db).elders_csv(&auth.actor)).await?;
    Ok(csv_response("elders.csv", csv))
}

async fn export_donations(State(state): State<AppState>, auth: Auth) -> Result<Response, ApiError> {
    let csv = state.with_db(move |db| ReportService::new(db).donations_csv(&auth.actor)).await?;
    Ok(csv_response("donations.csv", csv))
}

fn csv_response(filename: &str, csv: String) -> Response {
    (
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        csv,
    )
        .into_response()
}
