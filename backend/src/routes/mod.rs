//! Route definitions for the Sayariq server

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/descuentos/calcular", post(handlers::calculate_discounts))
        .nest("/lotes", batch_routes())
        .nest("/liquidaciones", liquidation_routes())
        .nest("/productores", producer_routes())
        .nest("/kardex", kardex_routes())
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/rentabilidad", get(handlers::get_profitability))
}

/// Batch settlement routes
fn batch_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:batch_id/liquidacion/preview",
            get(handlers::preview_liquidation),
        )
        .route("/:batch_id/liquidacion", post(handlers::create_liquidation))
}

/// Liquidation routes
fn liquidation_routes() -> Router<AppState> {
    Router::new()
        .route("/:liquidation_id", get(handlers::get_liquidation))
        .route(
            "/:liquidation_id/estado",
            put(handlers::update_liquidation_status),
        )
}

/// Producer advance routes
fn producer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:producer_id/adelantos/saldo",
            get(handlers::get_advance_balance),
        )
        .route(
            "/:producer_id/adelantos/descontar",
            post(handlers::apply_advance_deduction),
        )
}

/// Kardex routes
fn kardex_routes() -> Router<AppState> {
    Router::new()
        .route("/movimientos", post(handlers::record_movement))
        .route("/verificar", get(handlers::verify_kardex))
}

/// Same-origin proxy routes (GET/POST/PUT/DELETE forwarded verbatim)
pub fn proxy_routes() -> Router<AppState> {
    Router::new().route(
        "/*path",
        get(handlers::proxy_request)
            .post(handlers::proxy_request)
            .put(handlers::proxy_request)
            .delete(handlers::proxy_request),
    )
}
