//! Batch (lote) models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A batch of harvested fruit received at the plant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: i64,
    #[serde(rename = "tipo_producto")]
    pub product_type: String,
    /// Gross weight at warehouse intake
    #[serde(rename = "peso_bruto")]
    pub gross_weight_kg: Decimal,
    #[serde(rename = "numero_jabas")]
    pub crate_count: u32,
    #[serde(rename = "productor_id")]
    pub producer_id: i64,
    #[serde(rename = "fecha_ingreso")]
    pub intake_date: NaiveDate,
    #[serde(rename = "estado", default)]
    pub status: BatchStatus,
}

/// Processing status of a batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    #[default]
    Pendiente,
    Pesado,
    Liquidado,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pendiente => "pendiente",
            BatchStatus::Pesado => "pesado",
            BatchStatus::Liquidado => "liquidado",
        }
    }

    /// Batches only move forward: pending -> weighed -> settled
    pub fn can_transition_to(&self, next: BatchStatus) -> bool {
        matches!(
            (self, next),
            (BatchStatus::Pendiente, BatchStatus::Pesado)
                | (BatchStatus::Pesado, BatchStatus::Liquidado)
        )
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Pendiente => write!(f, "Pending"),
            BatchStatus::Pesado => write!(f, "Weighed"),
            BatchStatus::Liquidado => write!(f, "Settled"),
        }
    }
}
