//! Liquidation HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shared::DiscountOverrides;

use crate::services::liquidation::{CreateLiquidationInput, UpdatePaymentStatusInput};
use crate::AppState;

/// Settlement of a batch computed without writing upstream
pub async fn preview_liquidation(
    State(state): State<AppState>,
    Path(batch_id): Path<i64>,
    Query(overrides): Query<DiscountOverrides>,
) -> impl IntoResponse {
    let service = state.liquidation_service();

    match service.preview(batch_id, Some(&overrides)).await {
        Ok(preview) => (StatusCode::OK, Json(preview)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Settle a weighed batch; the body with discount overrides is optional
pub async fn create_liquidation(
    State(state): State<AppState>,
    Path(batch_id): Path<i64>,
    input: Option<Json<CreateLiquidationInput>>,
) -> impl IntoResponse {
    let Json(input) = input.unwrap_or_default();
    let service = state.liquidation_service();

    match service.create(batch_id, input.descuentos.as_ref()).await {
        Ok(liquidation) => (StatusCode::CREATED, Json(liquidation)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Liquidation detail with payment status defaulted
pub async fn get_liquidation(
    State(state): State<AppState>,
    Path(liquidation_id): Path<i64>,
) -> impl IntoResponse {
    let service = state.liquidation_service();

    match service.get_detail(liquidation_id).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Move a liquidation's payment status forward
pub async fn update_liquidation_status(
    State(state): State<AppState>,
    Path(liquidation_id): Path<i64>,
    Json(input): Json<UpdatePaymentStatusInput>,
) -> impl IntoResponse {
    let service = state.liquidation_service();

    match service.update_status(liquidation_id, input.estado_pago).await {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(e) => e.into_response(),
    }
}
