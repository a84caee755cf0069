//! Shared types and settlement computations for the Sayariq back office
//!
//! This crate holds the pure arithmetic used by the backend server and by the
//! browser dashboard (via WASM): discounts, liquidations, advance deductions
//! and kardex running balances.

pub mod error;
pub mod models;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use types::*;
pub use validation::*;
