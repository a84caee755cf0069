//! Common types used across the platform

use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Date range for queries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

impl DateRange {
    /// Calendar months touched by the range, counting partial months as whole
    pub fn months(&self) -> u32 {
        let index = |d: chrono::NaiveDate| d.year() * 12 + d.month0() as i32;
        (index(self.end) - index(self.start) + 1).max(1) as u32
    }
}
