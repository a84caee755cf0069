//! Kardex: append-only ledger of physical (weight) and financial (cash) movements
//!
//! Every movement carries the running balance of its ledger key at insert
//! time. For any key, the balance of movement N equals the balance of
//! movement N-1 plus the signed delta of movement N.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CategoryId;

/// Document that originated a movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceDocumentKind {
    Liquidacion,
    Venta,
    Adelanto,
    Manual,
}

impl SourceDocumentKind {
    /// Path segment under `/kardex-integral`
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceDocumentKind::Liquidacion => "liquidacion",
            SourceDocumentKind::Venta => "venta",
            SourceDocumentKind::Adelanto => "adelanto",
            SourceDocumentKind::Manual => "manual",
        }
    }
}

/// Reference (never ownership) to the originating document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDocument {
    #[serde(rename = "tipo_documento")]
    pub kind: SourceDocumentKind,
    /// Manual entries may have no document
    #[serde(rename = "documento_id", default)]
    pub id: Option<i64>,
}

/// Financial accounts tracked by the kardex
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Caja,
    Banco,
    Adelantos,
    Ventas,
    Produccion,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Fisico,
    Financiero,
}

/// Ledger a movement's running balance belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerKey {
    Account(AccountType),
    Lot(i64),
}

impl std::fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerKey::Account(account) => write!(f, "cuenta:{:?}", account),
            LedgerKey::Lot(lot_id) => write!(f, "lote:{}", lot_id),
        }
    }
}

/// What a new movement changes, before its balance is known
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "tipo", rename_all = "lowercase")]
pub enum MovementEntry {
    Fisico {
        lote_id: i64,
        categoria: CategoryId,
        delta_kg: Decimal,
    },
    Financiero {
        cuenta: AccountType,
        delta_monto: Decimal,
    },
}

impl MovementEntry {
    pub fn key(&self) -> LedgerKey {
        match self {
            MovementEntry::Fisico { lote_id, .. } => LedgerKey::Lot(*lote_id),
            MovementEntry::Financiero { cuenta, .. } => LedgerKey::Account(*cuenta),
        }
    }

    pub fn delta(&self) -> Decimal {
        match self {
            MovementEntry::Fisico { delta_kg, .. } => *delta_kg,
            MovementEntry::Financiero { delta_monto, .. } => *delta_monto,
        }
    }

    pub fn kind(&self) -> MovementKind {
        match self {
            MovementEntry::Fisico { .. } => MovementKind::Fisico,
            MovementEntry::Financiero { .. } => MovementKind::Financiero,
        }
    }

    fn negated(&self) -> Self {
        match self {
            MovementEntry::Fisico {
                lote_id,
                categoria,
                delta_kg,
            } => MovementEntry::Fisico {
                lote_id: *lote_id,
                categoria: *categoria,
                delta_kg: -*delta_kg,
            },
            MovementEntry::Financiero { cuenta, delta_monto } => MovementEntry::Financiero {
                cuenta: *cuenta,
                delta_monto: -*delta_monto,
            },
        }
    }
}

/// Request to append a movement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovementRequest {
    pub source: SourceDocument,
    pub entry: MovementEntry,
    #[serde(rename = "concepto", default)]
    pub concept: Option<String>,
}

/// A recorded ledger row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KardexMovement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub source: SourceDocument,
    #[serde(flatten)]
    pub entry: MovementEntry,
    /// Balance of the ledger key after this movement
    #[serde(rename = "saldo")]
    pub running_balance: Decimal,
    #[serde(rename = "concepto", default)]
    pub concept: Option<String>,
    #[serde(rename = "fecha")]
    pub recorded_at: DateTime<Utc>,
}

impl KardexMovement {
    /// Build the row for `request` on top of the ledger history
    pub fn from_request(
        request: MovementRequest,
        history: &[KardexMovement],
        recorded_at: DateTime<Utc>,
    ) -> Self {
        let running_balance =
            next_running_balance(history, request.entry.key(), request.entry.delta());
        Self {
            id: None,
            source: request.source,
            entry: request.entry,
            running_balance,
            concept: request.concept,
            recorded_at,
        }
    }

    pub fn key(&self) -> LedgerKey {
        self.entry.key()
    }

    pub fn delta(&self) -> Decimal {
        self.entry.delta()
    }

    /// Correction for this movement: same document, opposite delta
    pub fn offsetting(&self) -> MovementRequest {
        let concept = match self.id {
            Some(id) => format!("Reversión del movimiento {}", id),
            None => "Reversión de movimiento".to_string(),
        };
        MovementRequest {
            source: self.source,
            entry: self.entry.negated(),
            concept: Some(concept),
        }
    }
}

/// Order a history by timestamp, then id
pub fn sort_history(movements: &mut [KardexMovement]) {
    movements.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at).then(a.id.cmp(&b.id)));
}

/// Latest balance recorded for a key, zero when the key has no movements
pub fn current_balance(history: &[KardexMovement], key: LedgerKey) -> Decimal {
    history
        .iter()
        .filter(|m| m.key() == key)
        .max_by(|a, b| a.recorded_at.cmp(&b.recorded_at).then(a.id.cmp(&b.id)))
        .map(|m| m.running_balance)
        .unwrap_or(Decimal::ZERO)
}

pub fn next_running_balance(history: &[KardexMovement], key: LedgerKey, delta: Decimal) -> Decimal {
    current_balance(history, key) + delta
}

/// First movement whose balance does not follow from its predecessor
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BalanceMismatch {
    /// Position in the ordered history
    pub position: usize,
    pub movement_id: Option<i64>,
    pub key: String,
    pub expected: Decimal,
    pub found: Decimal,
}

/// Verify the running-balance invariant over a whole history
pub fn verify_running_balances(movements: &[KardexMovement]) -> Result<(), BalanceMismatch> {
    let mut ordered = movements.to_vec();
    sort_history(&mut ordered);

    let mut balances: std::collections::HashMap<LedgerKey, Decimal> =
        std::collections::HashMap::new();
    for (position, movement) in ordered.iter().enumerate() {
        let previous = balances.get(&movement.key()).copied().unwrap_or(Decimal::ZERO);
        let expected = previous + movement.delta();
        if movement.running_balance != expected {
            return Err(BalanceMismatch {
                position,
                movement_id: movement.id,
                key: movement.key().to_string(),
                expected,
                found: movement.running_balance,
            });
        }
        balances.insert(movement.key(), expected);
    }
    Ok(())
}
