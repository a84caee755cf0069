//! Dashboard and profitability handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::DateRange;

use crate::error::AppError;
use crate::AppState;

/// Dashboard summary; sections fail independently
pub async fn get_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let service = state.dashboard_service();
    (StatusCode::OK, Json(service.summary().await))
}

#[derive(Debug, Deserialize)]
pub struct ProfitabilityQuery {
    pub desde: Option<NaiveDate>,
    pub hasta: Option<NaiveDate>,
}

/// Profitability report, optionally for a period
pub async fn get_profitability(
    State(state): State<AppState>,
    Query(query): Query<ProfitabilityQuery>,
) -> impl IntoResponse {
    let period = match (query.desde, query.hasta) {
        (Some(start), Some(end)) if start <= end => Some(DateRange { start, end }),
        (None, None) => None,
        _ => {
            return AppError::Validation {
                field: "desde".to_string(),
                message: "Both desde and hasta are required, with desde <= hasta".to_string(),
            }
            .into_response()
        }
    };
    let service = state.dashboard_service();

    match service.profitability(period).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => e.into_response(),
    }
}
