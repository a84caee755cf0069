//! Kardex HTTP handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use shared::{MovementEntry, MovementRequest, SourceDocument};
use validator::Validate;

use crate::error::AppError;
use crate::AppState;

/// Input for recording a movement
#[derive(Debug, Deserialize, Validate)]
pub struct RecordMovementInput {
    pub source: SourceDocument,
    pub entry: MovementEntry,
    #[validate(length(min = 1, max = 255))]
    pub concepto: Option<String>,
}

impl From<RecordMovementInput> for MovementRequest {
    fn from(input: RecordMovementInput) -> Self {
        MovementRequest {
            source: input.source,
            entry: input.entry,
            concept: input.concepto,
        }
    }
}

/// Append a movement to the kardex
pub async fn record_movement(
    State(state): State<AppState>,
    Json(input): Json<RecordMovementInput>,
) -> impl IntoResponse {
    if let Err(e) = input.validate() {
        return AppError::from(e).into_response();
    }
    let service = state.kardex_service();

    match service.record_movement(input.into()).await {
        Ok(movement) => (StatusCode::CREATED, Json(movement)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Check running balances across the whole kardex
pub async fn verify_kardex(State(state): State<AppState>) -> impl IntoResponse {
    let service = state.kardex_service();

    match service.verify_ledger().await {
        Ok(check) => (StatusCode::OK, Json(check)).into_response(),
        Err(e) => e.into_response(),
    }
}
