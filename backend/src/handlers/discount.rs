//! Discount calculation handler

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{compute_discounts, DiscountOverrides};
use validator::Validate;

use crate::error::AppError;
use crate::AppState;

/// Input for computing discounts
#[derive(Debug, Deserialize, Validate)]
pub struct CalculateDiscountsInput {
    pub monto_bruto: Decimal,
    #[validate(range(max = 100000))]
    pub numero_jabas: u32,
    #[serde(default)]
    pub peso_kg: Option<Decimal>,
    #[serde(default)]
    pub configuracion: Option<DiscountOverrides>,
}

/// Compute discounts with the server's rates, overridable per field
pub async fn calculate_discounts(
    State(state): State<AppState>,
    Json(input): Json<CalculateDiscountsInput>,
) -> impl IntoResponse {
    if let Err(e) = input.validate() {
        return AppError::from(e).into_response();
    }

    let config = match &input.configuracion {
        Some(overrides) => state.config.discounts.with_overrides(overrides),
        None => state.config.discounts,
    };

    match compute_discounts(input.monto_bruto, input.numero_jabas, input.peso_kg, &config) {
        Ok(breakdown) => (StatusCode::OK, Json(breakdown)).into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}
