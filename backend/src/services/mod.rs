//! Business logic services for the Sayariq back office

pub mod advance;
pub mod dashboard;
pub mod kardex;
pub mod liquidation;
pub mod locks;

pub use advance::AdvanceService;
pub use dashboard::DashboardService;
pub use kardex::KardexService;
pub use liquidation::LiquidationService;
pub use locks::{KeyGuard, KeyedLocks};
