//! Producer (persona) models

use serde::{Deserialize, Serialize};

/// A fruit producer registered in the back office
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Producer {
    pub id: i64,
    #[serde(rename = "nombre_completo")]
    pub full_name: String,
    /// DNI or RUC
    #[serde(rename = "documento_identidad")]
    pub document_number: String,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
}
