//! Liquidation (settlement) models and builder

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    checked_sum, compute_discounts, find_category, out_of_range, Advance, Batch, Category, CategoryId, DiscountBreakdown,
    DiscountConfig, Producer, WeightClassification,
};
use crate::error::{CalcError, CalcResult};
use crate::validation::{validate_bucket_weights, validate_weight_total};

/// Payment status of a liquidation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pendiente,
    Pagado,
    Anulado,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pendiente => "PENDIENTE",
            PaymentStatus::Pagado => "PAGADO",
            PaymentStatus::Anulado => "ANULADO",
        }
    }

    /// Forward only; a paid or voided liquidation is never reopened
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pendiente, PaymentStatus::Pagado)
                | (PaymentStatus::Pendiente, PaymentStatus::Anulado)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value of one category's classified weight
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiquidationLineItem {
    pub category: CategoryId,
    pub weight_kg: Decimal,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Settlement of one batch for its producer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Liquidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "lote_id")]
    pub batch_id: i64,
    #[serde(rename = "productor_id")]
    pub producer_id: i64,
    pub line_items: Vec<LiquidationLineItem>,
    pub gross_fruit_value: Decimal,
    pub discounts: DiscountBreakdown,
    pub advances_applied: Vec<Decimal>,
    pub total_advances_deducted: Decimal,
    /// Not floored: negative when advances exceed the discounted value
    pub net_payable: Decimal,
    #[serde(default)]
    pub estado_pago: PaymentStatus,
}

impl Liquidation {
    pub fn is_overdrawn(&self) -> bool {
        self.net_payable < Decimal::ZERO
    }

    /// Gross value minus discounts, before any advance is recovered
    pub fn net_before_advances(&self) -> Decimal {
        self.gross_fruit_value - self.discounts.total_discounts
    }
}

/// Build the settlement of a batch
///
/// `advances_applied` are amounts already capped by the advance ledger.
pub fn build_liquidation(
    batch: &Batch,
    weights: &WeightClassification,
    categories: &[Category],
    advances_applied: &[Decimal],
    config: &DiscountConfig,
) -> CalcResult<Liquidation> {
    let mut line_items = Vec::new();

    for (category_id, weight_kg) in weights.buckets() {
        if weight_kg <= Decimal::ZERO {
            continue;
        }
        let category = find_category(categories, category_id).ok_or_else(|| {
            CalcError::validation(
                category_id.as_str(),
                format!("Category {} not found", category_id),
            )
        })?;
        if !category.active {
            return Err(CalcError::validation(
                category_id.as_str(),
                format!("Category {} is inactive", category_id),
            ));
        }
        if !category.is_settleable {
            continue;
        }
        let subtotal = weight_kg
            .checked_mul(category.unit_price)
            .ok_or_else(|| out_of_range(category_id.as_str()))?;
        line_items.push(LiquidationLineItem {
            category: category_id,
            weight_kg,
            unit_price: category.unit_price,
            subtotal,
        });
    }

    if line_items.is_empty() {
        return Err(CalcError::validation(
            "pesos",
            "No settleable category has a positive weight",
        ));
    }

    let gross_fruit_value = checked_sum(line_items.iter().map(|i| &i.subtotal), "gross_amount")?;
    let discounts = compute_discounts(
        gross_fruit_value,
        batch.crate_count,
        Some(batch.gross_weight_kg),
        config,
    )?;
    let total_advances_deducted = checked_sum(advances_applied, "adelantos")?;
    let net_payable = (gross_fruit_value - discounts.total_discounts)
        .checked_sub(total_advances_deducted)
        .ok_or_else(|| out_of_range("adelantos"))?;

    Ok(Liquidation {
        id: None,
        batch_id: batch.id,
        producer_id: batch.producer_id,
        line_items,
        gross_fruit_value,
        discounts,
        advances_applied: advances_applied.to_vec(),
        total_advances_deducted,
        net_payable,
        estado_pago: PaymentStatus::Pendiente,
    })
}

/// Everything needed to settle one batch, gathered from upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationInput {
    pub batch: Batch,
    pub producer: Producer,
    pub weights: WeightClassification,
    pub categories: Vec<Category>,
    /// Producer advances with an outstanding balance
    pub outstanding_advances: Vec<Advance>,
    pub settlement_date: NaiveDate,
}

impl LiquidationInput {
    /// Check the assembled data is internally consistent
    pub fn validate(&self) -> CalcResult<()> {
        if self.weights.batch_id != self.batch.id {
            return Err(CalcError::validation(
                "lote_id",
                "Weight classification belongs to another batch",
            ));
        }
        if self.batch.producer_id != self.producer.id {
            return Err(CalcError::validation(
                "productor_id",
                "Producer does not own this batch",
            ));
        }
        if self
            .outstanding_advances
            .iter()
            .any(|a| a.producer_id != self.producer.id)
        {
            return Err(CalcError::validation(
                "adelantos",
                "Advance belongs to another producer",
            ));
        }
        validate_bucket_weights(&self.weights)?;
        validate_weight_total(&self.weights, self.batch.gross_weight_kg)?;
        Ok(())
    }
}
