//! HTTP handlers

mod advance;
mod dashboard;
mod discount;
mod health;
mod kardex;
mod liquidation;
mod proxy;

pub use advance::*;
pub use dashboard::*;
pub use discount::*;
pub use health::*;
pub use kardex::*;
pub use liquidation::*;
pub use proxy::*;
