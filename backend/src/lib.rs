//! Sayariq back-office server
//!
//! Backend-for-frontend in front of the Sayariq REST API: proxies the
//! dashboard's same-origin routes, settles batches (discounts, advance
//! recovery, liquidation) and records kardex movements.

use std::sync::Arc;

use axum::{routing::get, Router};
use shared::LedgerKey;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;

use error::AppResult;
use external::SayariqClient;
use services::{AdvanceService, DashboardService, KardexService, KeyedLocks, LiquidationService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub client: SayariqClient,
    pub config: Arc<Config>,
    /// Serializes advance deductions per producer
    pub producer_locks: KeyedLocks<i64>,
    /// Serializes kardex appends per ledger
    pub ledger_locks: KeyedLocks<LedgerKey>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let client = SayariqClient::new(&config.upstream)?;
        Ok(Self {
            client,
            config: Arc::new(config),
            producer_locks: KeyedLocks::new(),
            ledger_locks: KeyedLocks::new(),
        })
    }

    pub fn kardex_service(&self) -> KardexService {
        KardexService::new(self.client.clone(), self.ledger_locks.clone())
    }

    pub fn advance_service(&self) -> AdvanceService {
        AdvanceService::new(
            self.client.clone(),
            self.kardex_service(),
            self.producer_locks.clone(),
        )
    }

    pub fn liquidation_service(&self) -> LiquidationService {
        LiquidationService::new(
            self.client.clone(),
            self.advance_service(),
            self.kardex_service(),
            self.config.discounts,
        )
    }

    pub fn dashboard_service(&self) -> DashboardService {
        DashboardService::new(self.client.clone())
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .nest("/api/proxy", routes::proxy_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Sayariq Back Office API v1.0"
}
