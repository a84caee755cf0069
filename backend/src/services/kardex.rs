//! Kardex movement recording against the upstream ledger

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::{
    sort_history, verify_running_balances, BalanceMismatch, KardexMovement, LedgerKey,
    MovementRequest,
};

use crate::error::AppResult;
use crate::external::SayariqClient;
use crate::services::locks::KeyedLocks;

/// Kardex service appending movements with their running balance
#[derive(Clone)]
pub struct KardexService {
    client: SayariqClient,
    locks: KeyedLocks<LedgerKey>,
}

/// Id returned by the upstream for a stored movement
#[derive(Debug, Deserialize)]
struct CreatedMovement {
    id: i64,
}

/// Outcome of checking a ledger's running balances
#[derive(Debug, Clone, Serialize)]
pub struct LedgerCheck {
    pub movements: usize,
    pub consistent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mismatch: Option<BalanceMismatch>,
}

/// Upstream query selecting the movements of one ledger key
pub fn history_path(key: LedgerKey) -> String {
    match key {
        LedgerKey::Account(account) => {
            let account = serde_json::to_value(account)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            format!("/kardex-integral/movimientos?tipo=financiero&cuenta={}", account)
        }
        LedgerKey::Lot(lot_id) => {
            format!("/kardex-integral/movimientos?tipo=fisico&lote_id={}", lot_id)
        }
    }
}

impl KardexService {
    /// Create a new KardexService instance
    pub fn new(client: SayariqClient, locks: KeyedLocks<LedgerKey>) -> Self {
        Self { client, locks }
    }

    /// Movements recorded for one ledger key, oldest first
    pub async fn history(&self, key: LedgerKey) -> AppResult<Vec<KardexMovement>> {
        let mut movements: Vec<KardexMovement> = self.client.get(&history_path(key)).await?;
        // The filter is applied upstream; guard against a backend that ignores it
        movements.retain(|m| m.key() == key);
        sort_history(&mut movements);
        Ok(movements)
    }

    /// Append a movement; its running balance follows the key's last balance
    pub async fn record_movement(&self, request: MovementRequest) -> AppResult<KardexMovement> {
        let key = request.entry.key();
        let _guard = self.locks.acquire(&key).await;

        let history = self.history(key).await?;
        let mut movement = KardexMovement::from_request(request, &history, Utc::now());

        let path = format!("/kardex-integral/{}", movement.source.kind.as_str());
        let created: CreatedMovement = self.client.post(&path, &movement).await?;
        movement.id = Some(created.id);

        tracing::info!(
            movement_id = created.id,
            ledger = %key,
            delta = %movement.delta(),
            balance = %movement.running_balance,
            "Kardex movement recorded"
        );
        Ok(movement)
    }

    /// Record the offsetting movement for an existing one
    pub async fn reverse_movement(&self, original: &KardexMovement) -> AppResult<KardexMovement> {
        self.record_movement(original.offsetting()).await
    }

    /// Offset movements newest first; failures are logged, not returned
    pub async fn reverse_movements(&self, movements: &[KardexMovement]) {
        for movement in movements.iter().rev() {
            if let Err(e) = self.reverse_movement(movement).await {
                tracing::error!(
                    movement_id = ?movement.id,
                    ledger = %movement.key(),
                    error = %e,
                    "Failed to reverse kardex movement"
                );
            }
        }
    }

    /// Check the running-balance invariant over the full upstream ledger
    pub async fn verify_ledger(&self) -> AppResult<LedgerCheck> {
        let movements: Vec<KardexMovement> =
            self.client.get("/kardex-integral/movimientos").await?;
        let check = match verify_running_balances(&movements) {
            Ok(()) => LedgerCheck {
                movements: movements.len(),
                consistent: true,
                mismatch: None,
            },
            Err(mismatch) => {
                tracing::warn!(?mismatch, "Kardex running balance mismatch");
                LedgerCheck {
                    movements: movements.len(),
                    consistent: false,
                    mismatch: Some(mismatch),
                }
            }
        };
        Ok(check)
    }
}
