//! Validation utilities for the Sayariq back office

use rust_decimal::Decimal;

use crate::error::{CalcError, CalcResult};
use crate::models::WeightClassification;

// ============================================================================
// Weight Validations
// ============================================================================

/// Every classification bucket must be a non-negative amount
pub fn validate_bucket_weights(weights: &WeightClassification) -> CalcResult<()> {
    for (category, kg) in weights.buckets() {
        if kg < Decimal::ZERO {
            return Err(CalcError::validation(
                category.as_str(),
                "Classified weight cannot be negative",
            ));
        }
    }
    Ok(())
}

/// Classified weight cannot exceed the weight received at the warehouse
pub fn validate_weight_total(
    weights: &WeightClassification,
    gross_weight_kg: Decimal,
) -> CalcResult<()> {
    let total = weights.total_kg();
    if total > gross_weight_kg {
        return Err(CalcError::validation(
            "pesos",
            format!(
                "Classified weight {} kg exceeds intake weight {} kg",
                total, gross_weight_kg
            ),
        ));
    }
    Ok(())
}

// ============================================================================
// Producer Validations
// ============================================================================

/// Validate a Peruvian identity document: 8-digit DNI or 11-digit RUC
pub fn validate_document_number(document: &str) -> Result<(), &'static str> {
    if !document.chars().all(|c| c.is_ascii_digit()) {
        return Err("Document number must contain digits only");
    }
    match document.len() {
        8 | 11 => Ok(()),
        _ => Err("Document number must be a DNI (8 digits) or RUC (11 digits)"),
    }
}
