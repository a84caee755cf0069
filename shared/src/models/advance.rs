//! Producer advances (adelantos) and their recovery on settlement

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CalcError, CalcResult};

/// Cash paid to a producer ahead of settlement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Advance {
    pub id: i64,
    #[serde(rename = "productor_id")]
    pub producer_id: i64,
    #[serde(rename = "monto")]
    pub amount: Decimal,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    /// Amount still to be recovered
    #[serde(rename = "saldo_pendiente")]
    pub remaining_balance: Decimal,
}

impl Advance {
    pub fn deducted(&self) -> Decimal {
        self.amount - self.remaining_balance
    }

    pub fn is_closed(&self) -> bool {
        self.remaining_balance <= Decimal::ZERO
    }
}

/// Aggregate advance position of a producer
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AdvanceBalance {
    pub total_advanced: Decimal,
    pub total_deducted: Decimal,
    pub pending: Decimal,
}

/// Summarize a producer's advances; no advances yields all zeros
pub fn advance_balance(advances: &[Advance]) -> AdvanceBalance {
    advances
        .iter()
        .fold(AdvanceBalance::default(), |acc, advance| AdvanceBalance {
            total_advanced: acc.total_advanced + advance.amount,
            total_deducted: acc.total_deducted + advance.deducted(),
            pending: acc.pending + advance.remaining_balance,
        })
}

/// One deduction taken from a single advance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedDeduction {
    pub advance_id: i64,
    pub balance_before: Decimal,
    pub amount_applied: Decimal,
    pub balance_after: Decimal,
}

/// Result of recovering advances against a settlement value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeductionOutcome {
    pub applied: Vec<AppliedDeduction>,
    /// Settlement value left after all deductions
    pub remaining_batch_value: Decimal,
}

impl DeductionOutcome {
    pub fn total_applied(&self) -> Decimal {
        self.applied.iter().map(|a| a.amount_applied).sum()
    }

    pub fn amounts(&self) -> Vec<Decimal> {
        self.applied.iter().map(|a| a.amount_applied).collect()
    }
}

/// Plan deductions against a producer's advances, oldest first
///
/// Advances are ordered by date (ties by id). Each deduction is capped at
/// `min(remaining_balance, remaining_batch_value)`. Advances already closed
/// are skipped. The input slice is not modified.
pub fn plan_deductions(advances: &[Advance], batch_value: Decimal) -> CalcResult<DeductionOutcome> {
    if batch_value < Decimal::ZERO {
        return Err(CalcError::validation(
            "amount",
            "Settlement value to deduct from cannot be negative",
        ));
    }

    let mut ordered: Vec<&Advance> = advances.iter().filter(|a| !a.is_closed()).collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    let (applied, remaining_batch_value) = ordered.into_iter().fold(
        (Vec::new(), batch_value),
        |(mut applied, remaining), advance| {
            if remaining.is_zero() {
                return (applied, remaining);
            }
            let amount = advance.remaining_balance.min(remaining);
            applied.push(AppliedDeduction {
                advance_id: advance.id,
                balance_before: advance.remaining_balance,
                amount_applied: amount,
                balance_after: advance.remaining_balance - amount,
            });
            (applied, remaining - amount)
        },
    );

    Ok(DeductionOutcome {
        applied,
        remaining_batch_value,
    })
}

/// Advances with the outcome's balances written back, as new values
pub fn apply_outcome(advances: &[Advance], outcome: &DeductionOutcome) -> Vec<Advance> {
    advances
        .iter()
        .map(|advance| {
            match outcome.applied.iter().find(|a| a.advance_id == advance.id) {
                Some(applied) => Advance {
                    remaining_balance: applied.balance_after,
                    ..advance.clone()
                },
                None => advance.clone(),
            }
        })
        .collect()
}
