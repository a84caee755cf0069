//! WebAssembly module for the Sayariq dashboard
//!
//! Provides client-side computation for:
//! - Settlement discounts while a form is being edited
//! - Liquidation previews from already-loaded batch data
//! - Oldest-first advance deductions
//! - Document number validation

use rust_decimal::Decimal;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;
pub use shared::{CalcError, CalcResult};

/// Everything the dashboard holds when previewing a liquidation
#[derive(Debug, Deserialize)]
struct LiquidationRequest {
    lote: Batch,
    pesos: WeightClassification,
    categorias: Vec<Category>,
    #[serde(default)]
    adelantos: Vec<Advance>,
    #[serde(default)]
    descuentos: Option<DiscountOverrides>,
}

#[derive(Debug, Deserialize)]
struct DiscountRequest {
    monto_bruto: Decimal,
    numero_jabas: u32,
    #[serde(default)]
    peso_kg: Option<Decimal>,
    #[serde(default)]
    configuracion: Option<DiscountOverrides>,
}

fn js_error(context: &str, e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, e))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| js_error("Serialization failed", e))
}

fn parse_decimal(value: &str) -> Result<Decimal, JsValue> {
    value
        .trim()
        .parse::<Decimal>()
        .map_err(|e| js_error("Invalid amount", e))
}

/// Compute the discount breakdown for `{ monto_bruto, numero_jabas, peso_kg?, configuracion? }`
#[wasm_bindgen]
pub fn compute_discounts_json(request_json: &str) -> Result<String, JsValue> {
    let request: DiscountRequest =
        serde_json::from_str(request_json).map_err(|e| js_error("Invalid discount JSON", e))?;
    let config = match &request.configuracion {
        Some(overrides) => DiscountConfig::default().with_overrides(overrides),
        None => DiscountConfig::default(),
    };

    let breakdown = compute_discounts(
        request.monto_bruto,
        request.numero_jabas,
        request.peso_kg,
        &config,
    )
    .map_err(|e| js_error("Discount calculation failed", e))?;
    to_json(&breakdown)
}

impl LiquidationRequest {
    fn config(&self) -> DiscountConfig {
        match &self.descuentos {
            Some(overrides) => DiscountConfig::default().with_overrides(overrides),
            None => DiscountConfig::default(),
        }
    }

    /// Same consistency checks the server runs before settling
    fn validate(&self) -> CalcResult<()> {
        if self.pesos.batch_id != self.lote.id {
            return Err(CalcError::validation(
                "lote_id",
                "Weight classification belongs to another batch",
            ));
        }
        if self
            .adelantos
            .iter()
            .any(|a| a.producer_id != self.lote.producer_id)
        {
            return Err(CalcError::validation(
                "adelantos",
                "Advance belongs to another producer",
            ));
        }
        validate_bucket_weights(&self.pesos)?;
        validate_weight_total(&self.pesos, self.lote.gross_weight_kg)
    }

    fn preview(&self) -> CalcResult<Liquidation> {
        self.validate()?;
        let config = self.config();
        let build = |applied: &[Decimal]| {
            build_liquidation(&self.lote, &self.pesos, &self.categorias, applied, &config)
        };

        let base = build(&[])?;
        let deductions = plan_deductions(&self.adelantos, base.discounts.net_amount)?;
        build(&deductions.amounts())
    }
}

/// Build a liquidation preview; advances are planned against the recoverable value
#[wasm_bindgen]
pub fn build_liquidation_json(request_json: &str) -> Result<String, JsValue> {
    let request: LiquidationRequest =
        serde_json::from_str(request_json).map_err(|e| js_error("Invalid liquidation JSON", e))?;
    let liquidation = request
        .preview()
        .map_err(|e| js_error("Liquidation failed", e))?;

    if liquidation.is_overdrawn() {
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "Liquidation for batch {} has a negative net payable: {}",
            liquidation.batch_id, liquidation.net_payable
        )));
    }
    to_json(&liquidation)
}

/// Plan oldest-first deductions of `advances_json` against `batch_value`
#[wasm_bindgen]
pub fn plan_deductions_json(advances_json: &str, batch_value: &str) -> Result<String, JsValue> {
    let advances: Vec<Advance> =
        serde_json::from_str(advances_json).map_err(|e| js_error("Invalid advances JSON", e))?;
    let outcome = plan_deductions(&advances, parse_decimal(batch_value)?)
        .map_err(|e| js_error("Advance deduction failed", e))?;
    to_json(&outcome)
}

/// Net amount after default discounts, as a string to keep decimal precision
#[wasm_bindgen]
pub fn net_amount(gross_amount: &str, crate_count: u32) -> Result<String, JsValue> {
    let breakdown = compute_discounts(
        parse_decimal(gross_amount)?,
        crate_count,
        None,
        &DiscountConfig::default(),
    )
    .map_err(|e| js_error("Discount calculation failed", e))?;
    Ok(breakdown.net_amount.to_string())
}

/// Validate a DNI (8 digits) or RUC (11 digits)
#[wasm_bindgen]
pub fn validate_document(document: &str) -> js_sys::Array {
    let result = js_sys::Array::new();
    match validate_document_number(document.trim()) {
        Ok(()) => {
            result.push(&JsValue::TRUE);
        }
        Err(message) => {
            result.push(&JsValue::FALSE);
            result.push(&JsValue::from_str(message));
        }
    }
    result
}
