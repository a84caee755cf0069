//! Advance ledger HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::services::advance::ApplyDeductionInput;
use crate::AppState;

/// Advance balance of a producer
pub async fn get_advance_balance(
    State(state): State<AppState>,
    Path(producer_id): Path<i64>,
) -> impl IntoResponse {
    let service = state.advance_service();

    match service.get_balance(producer_id).await {
        Ok(balance) => (StatusCode::OK, Json(balance)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Recover a producer's advances from a batch's settlement value
pub async fn apply_advance_deduction(
    State(state): State<AppState>,
    Path(producer_id): Path<i64>,
    Json(input): Json<ApplyDeductionInput>,
) -> impl IntoResponse {
    let service = state.advance_service();

    match service
        .apply_deduction(producer_id, input.lote_id, input.monto)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => e.into_response(),
    }
}
