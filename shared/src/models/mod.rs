//! Domain models for the Sayariq back office

mod advance;
mod batch;
mod category;
mod discount;
mod kardex;
mod liquidation;
mod producer;
mod profitability;
mod weight;

pub use advance::*;
pub use batch::*;
pub use category::*;
pub use discount::*;
pub use kardex::*;
pub use liquidation::*;
pub use producer::*;
pub use profitability::*;
pub use weight::*;
