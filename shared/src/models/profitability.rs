//! Profitability (rentabilidad) report

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{checked_sum, out_of_range};
use crate::error::CalcResult;
use crate::types::DateRange;

/// Monthly fixed cost of the plant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedCost {
    pub id: i64,
    #[serde(rename = "concepto")]
    pub concept: String,
    #[serde(rename = "monto_mensual")]
    pub monthly_amount: Decimal,
}

/// Revenue against settlement and fixed costs for a period
///
/// `fixed_costs` is the monthly charge prorated over the calendar months the
/// period touches; without a period one month is charged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfitabilityReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<DateRange>,
    pub revenue: Decimal,
    pub settlement_cost: Decimal,
    pub fixed_costs: Decimal,
    pub margin: Decimal,
    /// Margin over revenue in percent; zero when there is no revenue
    pub margin_percent: Decimal,
}

/// Compute profitability from sale totals, liquidation gross values and fixed costs
pub fn profitability(
    period: Option<DateRange>,
    sales: &[Decimal],
    settlements: &[Decimal],
    fixed_costs: &[FixedCost],
) -> CalcResult<ProfitabilityReport> {
    let months = Decimal::from(period.as_ref().map_or(1, DateRange::months));

    let revenue = checked_sum(sales, "ventas")?;
    let settlement_cost = checked_sum(settlements, "liquidaciones")?;
    let monthly = checked_sum(fixed_costs.iter().map(|c| &c.monthly_amount), "costos_fijos")?;
    let fixed = monthly
        .checked_mul(months)
        .ok_or_else(|| out_of_range("costos_fijos"))?;
    let margin = revenue
        .checked_sub(settlement_cost)
        .and_then(|m| m.checked_sub(fixed))
        .ok_or_else(|| out_of_range("margin"))?;
    let margin_percent = if revenue.is_zero() {
        Decimal::ZERO
    } else {
        margin
            .checked_div(revenue)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or_else(|| out_of_range("margin"))?
            .round_dp(2)
    };

    Ok(ProfitabilityReport {
        period,
        revenue,
        settlement_cost,
        fixed_costs: fixed,
        margin,
        margin_percent,
    })
}
