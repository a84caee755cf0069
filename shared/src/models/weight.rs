//! Weight classification (peso lote) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CategoryId;

/// Classified weights for one processing event of a batch
///
/// Every bucket is a non-negative kilogram amount. Buckets absent from the
/// upstream payload deserialize as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeightClassification {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "lote_id")]
    pub batch_id: i64,
    #[serde(default)]
    pub exportable: Decimal,
    #[serde(default)]
    pub primera: Decimal,
    #[serde(default)]
    pub segunda: Decimal,
    #[serde(default)]
    pub tercera: Decimal,
    #[serde(default)]
    pub cuarta: Decimal,
    #[serde(default)]
    pub quinta: Decimal,
    #[serde(default)]
    pub nino: Decimal,
    #[serde(default)]
    pub industrial: Decimal,
    #[serde(default)]
    pub jugo: Decimal,
    #[serde(default)]
    pub podrido: Decimal,
    #[serde(default)]
    pub descarte: Decimal,
    #[serde(rename = "fecha_registro", default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl WeightClassification {
    pub fn weight_for(&self, category: CategoryId) -> Decimal {
        match category {
            CategoryId::Exportable => self.exportable,
            CategoryId::Primera => self.primera,
            CategoryId::Segunda => self.segunda,
            CategoryId::Tercera => self.tercera,
            CategoryId::Cuarta => self.cuarta,
            CategoryId::Quinta => self.quinta,
            CategoryId::Nino => self.nino,
            CategoryId::Industrial => self.industrial,
            CategoryId::Jugo => self.jugo,
            CategoryId::Podrido => self.podrido,
            CategoryId::Descarte => self.descarte,
        }
    }

    /// Buckets in their fixed order
    pub fn buckets(&self) -> impl Iterator<Item = (CategoryId, Decimal)> + '_ {
        CategoryId::ALL.into_iter().map(|c| (c, self.weight_for(c)))
    }

    pub fn total_kg(&self) -> Decimal {
        self.buckets().map(|(_, kg)| kg).sum()
    }
}
