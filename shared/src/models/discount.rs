//! Settlement discounts (descuentos)
//!
//! Fees withheld from a producer's gross fruit value: a per-crate (jaba)
//! charge plus freight, issuance, harvest and processing charges expressed as
//! percentages of the gross amount.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CalcError, CalcResult};

/// Discount rates applied on settlement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DiscountConfig {
    /// Charge per crate (jaba) delivered
    pub crate_unit_price: Decimal,
    pub freight_pct: Decimal,
    pub issuance_pct: Decimal,
    pub harvest_pct: Decimal,
    pub processing_pct: Decimal,
}

impl Default for DiscountConfig {
    fn default() -> Self {
        Self {
            crate_unit_price: Decimal::new(500, 2),
            freight_pct: Decimal::from(2),
            issuance_pct: Decimal::from(1),
            harvest_pct: Decimal::new(15, 1),
            processing_pct: Decimal::from(3),
        }
    }
}

/// Per-field overrides merged over a base [`DiscountConfig`]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscountOverrides {
    #[serde(default)]
    pub crate_unit_price: Option<Decimal>,
    #[serde(default)]
    pub freight_pct: Option<Decimal>,
    #[serde(default)]
    pub issuance_pct: Option<Decimal>,
    #[serde(default)]
    pub harvest_pct: Option<Decimal>,
    #[serde(default)]
    pub processing_pct: Option<Decimal>,
}

impl DiscountConfig {
    /// Return a copy with every field present in `overrides` replaced
    pub fn with_overrides(self, overrides: &DiscountOverrides) -> Self {
        Self {
            crate_unit_price: overrides.crate_unit_price.unwrap_or(self.crate_unit_price),
            freight_pct: overrides.freight_pct.unwrap_or(self.freight_pct),
            issuance_pct: overrides.issuance_pct.unwrap_or(self.issuance_pct),
            harvest_pct: overrides.harvest_pct.unwrap_or(self.harvest_pct),
            processing_pct: overrides.processing_pct.unwrap_or(self.processing_pct),
        }
    }

    pub fn validate(&self) -> CalcResult<()> {
        let fields = [
            ("crate_unit_price", self.crate_unit_price),
            ("freight_pct", self.freight_pct),
            ("issuance_pct", self.issuance_pct),
            ("harvest_pct", self.harvest_pct),
            ("processing_pct", self.processing_pct),
        ];
        for (field, value) in fields {
            if value < Decimal::ZERO {
                return Err(CalcError::validation(field, "Discount rates cannot be negative"));
            }
        }
        Ok(())
    }
}

/// Itemized discounts for one settlement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscountBreakdown {
    pub gross_amount: Decimal,
    pub crate_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<Decimal>,
    pub crate_fee: Decimal,
    pub freight_fee: Decimal,
    pub issuance_fee: Decimal,
    pub harvest_fee: Decimal,
    pub processing_fee: Decimal,
    pub total_discounts: Decimal,
    /// Gross minus discounts, never below zero
    pub net_amount: Decimal,
}

/// Error for an amount whose arithmetic leaves the `Decimal` range
pub fn out_of_range(field: &str) -> CalcError {
    CalcError::validation(field, "amount out of range")
}

fn percent_of(amount: Decimal, pct: Decimal) -> CalcResult<Decimal> {
    amount
        .checked_mul(pct)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(|| out_of_range("gross_amount"))
}

/// Sum that fails instead of overflowing
pub fn checked_sum<'a>(
    values: impl IntoIterator<Item = &'a Decimal>,
    field: &str,
) -> CalcResult<Decimal> {
    values.into_iter().try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(*v).ok_or_else(|| out_of_range(field))
    })
}

/// Compute the discounts withheld from a gross amount
///
/// The net amount is floored at zero: processing losses are never invoiced
/// back to the producer.
pub fn compute_discounts(
    gross_amount: Decimal,
    crate_count: u32,
    weight_kg: Option<Decimal>,
    config: &DiscountConfig,
) -> CalcResult<DiscountBreakdown> {
    if gross_amount < Decimal::ZERO {
        return Err(CalcError::validation(
            "gross_amount",
            "Gross amount cannot be negative",
        ));
    }
    if let Some(kg) = weight_kg {
        if kg < Decimal::ZERO {
            return Err(CalcError::validation("weight_kg", "Weight cannot be negative"));
        }
    }
    config.validate()?;

    let crate_fee = Decimal::from(crate_count)
        .checked_mul(config.crate_unit_price)
        .ok_or_else(|| out_of_range("crate_unit_price"))?;
    let freight_fee = percent_of(gross_amount, config.freight_pct)?;
    let issuance_fee = percent_of(gross_amount, config.issuance_pct)?;
    let harvest_fee = percent_of(gross_amount, config.harvest_pct)?;
    let processing_fee = percent_of(gross_amount, config.processing_pct)?;

    let total_discounts = checked_sum(
        &[crate_fee, freight_fee, issuance_fee, harvest_fee, processing_fee],
        "gross_amount",
    )?;
    // Both sides are non-negative, so the difference cannot overflow
    let net_amount = (gross_amount - total_discounts).max(Decimal::ZERO);

    Ok(DiscountBreakdown {
        gross_amount,
        crate_count,
        weight_kg,
        crate_fee,
        freight_fee,
        issuance_fee,
        harvest_fee,
        processing_fee,
        total_discounts,
        net_amount,
    })
}
