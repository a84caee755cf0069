//! Price categories applied to classified weight

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Closed set of weight buckets recorded for every batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CategoryId {
    Exportable,
    Primera,
    Segunda,
    Tercera,
    Cuarta,
    Quinta,
    Nino,
    Industrial,
    Jugo,
    Podrido,
    Descarte,
}

impl CategoryId {
    pub const ALL: [CategoryId; 11] = [
        CategoryId::Exportable,
        CategoryId::Primera,
        CategoryId::Segunda,
        CategoryId::Tercera,
        CategoryId::Cuarta,
        CategoryId::Quinta,
        CategoryId::Nino,
        CategoryId::Industrial,
        CategoryId::Jugo,
        CategoryId::Podrido,
        CategoryId::Descarte,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryId::Exportable => "exportable",
            CategoryId::Primera => "primera",
            CategoryId::Segunda => "segunda",
            CategoryId::Tercera => "tercera",
            CategoryId::Cuarta => "cuarta",
            CategoryId::Quinta => "quinta",
            CategoryId::Nino => "nino",
            CategoryId::Industrial => "industrial",
            CategoryId::Jugo => "jugo",
            CategoryId::Podrido => "podrido",
            CategoryId::Descarte => "descarte",
        }
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryId::Exportable => write!(f, "Exportable"),
            CategoryId::Primera => write!(f, "Primera"),
            CategoryId::Segunda => write!(f, "Segunda"),
            CategoryId::Tercera => write!(f, "Tercera"),
            CategoryId::Cuarta => write!(f, "Cuarta"),
            CategoryId::Quinta => write!(f, "Quinta"),
            CategoryId::Nino => write!(f, "Niño"),
            CategoryId::Industrial => write!(f, "Industrial"),
            CategoryId::Jugo => write!(f, "Jugo"),
            CategoryId::Podrido => write!(f, "Podrido"),
            CategoryId::Descarte => write!(f, "Descarte"),
        }
    }
}

impl std::str::FromStr for CategoryId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryId::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Price tier reference data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    #[serde(rename = "nombre")]
    pub name: String,
    /// Price per kilogram
    #[serde(rename = "precio_unitario")]
    pub unit_price: Decimal,
    #[serde(rename = "es_liquidable")]
    pub is_settleable: bool,
    #[serde(rename = "activo", default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Find a category by id in a reference list
pub fn find_category(categories: &[Category], id: CategoryId) -> Option<&Category> {
    categories.iter().find(|c| c.id == id)
}
