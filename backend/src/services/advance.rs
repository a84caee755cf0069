//! Advance (adelanto) ledger access and deduction on settlement

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    advance_balance, plan_deductions, AccountType, Advance, AdvanceBalance, AppliedDeduction,
    DeductionOutcome, KardexMovement, MovementEntry, MovementRequest, SourceDocument,
    SourceDocumentKind,
};

use crate::error::AppResult;
use crate::external::SayariqClient;
use crate::services::kardex::KardexService;
use crate::services::locks::{KeyGuard, KeyedLocks};

/// Advance service for balances and oldest-first deductions
#[derive(Clone)]
pub struct AdvanceService {
    client: SayariqClient,
    kardex: KardexService,
    producer_locks: KeyedLocks<i64>,
}

/// Balance update sent upstream for one advance
#[derive(Debug, Serialize)]
struct BalanceUpdate {
    saldo_pendiente: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    lote_id: Option<i64>,
}

/// Deductions whose balances and ledger rows were written upstream
#[derive(Debug, Clone)]
pub struct CommittedDeductions {
    pub batch_id: i64,
    pub outcome: DeductionOutcome,
    /// One `adelantos` movement per applied deduction
    pub movements: Vec<KardexMovement>,
}

fn deduction_movement(batch_id: i64, applied: &AppliedDeduction) -> MovementRequest {
    MovementRequest {
        source: SourceDocument {
            kind: SourceDocumentKind::Adelanto,
            id: Some(applied.advance_id),
        },
        entry: MovementEntry::Financiero {
            cuenta: AccountType::Adelantos,
            delta_monto: -applied.amount_applied,
        },
        concept: Some(format!("Descuento de adelanto en lote {}", batch_id)),
    }
}

/// Input for applying a deduction
#[derive(Debug, Deserialize)]
pub struct ApplyDeductionInput {
    pub lote_id: i64,
    /// Settlement value available to recover advances from
    pub monto: Decimal,
}

impl AdvanceService {
    /// Create a new AdvanceService instance
    pub fn new(
        client: SayariqClient,
        kardex: KardexService,
        producer_locks: KeyedLocks<i64>,
    ) -> Self {
        Self {
            client,
            kardex,
            producer_locks,
        }
    }

    /// All advances of a producer; none is an empty list, not an error
    pub async fn list_advances(&self, producer_id: i64) -> AppResult<Vec<Advance>> {
        let advances: Option<Vec<Advance>> = self
            .client
            .get(&format!("/adelantos?productor_id={}", producer_id))
            .await?;
        let mut advances = advances.unwrap_or_default();
        advances.retain(|a| a.producer_id == producer_id);
        Ok(advances)
    }

    /// Advances that still have a balance to recover
    pub async fn outstanding_advances(&self, producer_id: i64) -> AppResult<Vec<Advance>> {
        let mut advances = self.list_advances(producer_id).await?;
        advances.retain(|a| !a.is_closed());
        Ok(advances)
    }

    pub async fn get_balance(&self, producer_id: i64) -> AppResult<AdvanceBalance> {
        let advances = self.list_advances(producer_id).await?;
        if advances.is_empty() {
            tracing::debug!(producer_id, "Producer has no advances");
        }
        Ok(advance_balance(&advances))
    }

    /// Deductions that would be taken for `amount`, without writing anything
    pub async fn preview_deduction(
        &self,
        producer_id: i64,
        amount: Decimal,
    ) -> AppResult<DeductionOutcome> {
        let advances = self.outstanding_advances(producer_id).await?;
        Ok(plan_deductions(&advances, amount)?)
    }

    /// Serialize deductions for one producer
    pub async fn lock_producer(&self, producer_id: i64) -> KeyGuard<i64> {
        self.producer_locks.acquire(&producer_id).await
    }

    /// Recover a producer's advances from a batch's settlement value
    ///
    /// Runs under the producer's lock so two settlements cannot spend the
    /// same advance balance.
    pub async fn apply_deduction(
        &self,
        producer_id: i64,
        batch_id: i64,
        amount: Decimal,
    ) -> AppResult<DeductionOutcome> {
        let _guard = self.lock_producer(producer_id).await;

        let advances = self.outstanding_advances(producer_id).await?;
        let outcome = plan_deductions(&advances, amount)?;
        let committed = self.commit_deductions(batch_id, outcome).await?;

        tracing::info!(
            producer_id,
            batch_id,
            deducted = %committed.outcome.total_applied(),
            remaining = %committed.outcome.remaining_batch_value,
            "Advance deductions applied"
        );
        Ok(committed.outcome)
    }

    async fn write_balance(
        &self,
        advance_id: i64,
        balance: Decimal,
        batch_id: Option<i64>,
    ) -> AppResult<()> {
        let update = BalanceUpdate {
            saldo_pendiente: balance,
            lote_id: batch_id,
        };
        let _: serde_json::Value = self
            .client
            .put(&format!("/adelantos/{}", advance_id), &update)
            .await?;
        Ok(())
    }

    /// Write a planned outcome: every balance first, then one ledger row each
    ///
    /// The caller holds the producer lock. On failure the writes already made
    /// are undone before the error is returned.
    pub async fn commit_deductions(
        &self,
        batch_id: i64,
        outcome: DeductionOutcome,
    ) -> AppResult<CommittedDeductions> {
        for (position, applied) in outcome.applied.iter().enumerate() {
            let written = self
                .write_balance(applied.advance_id, applied.balance_after, Some(batch_id))
                .await;
            if let Err(e) = written {
                // The failed write may still have landed upstream
                self.restore_balances(&outcome.applied[..=position]).await;
                return Err(e);
            }
        }

        let mut movements = Vec::with_capacity(outcome.applied.len());
        for applied in &outcome.applied {
            match self
                .kardex
                .record_movement(deduction_movement(batch_id, applied))
                .await
            {
                Ok(movement) => movements.push(movement),
                Err(e) => {
                    self.kardex.reverse_movements(&movements).await;
                    self.restore_balances(&outcome.applied).await;
                    return Err(e);
                }
            }
        }

        Ok(CommittedDeductions {
            batch_id,
            outcome,
            movements,
        })
    }

    /// Undo committed deductions with offsetting rows and the previous balances
    pub async fn revert_deductions(&self, committed: &CommittedDeductions) {
        tracing::warn!(
            batch_id = committed.batch_id,
            deducted = %committed.outcome.total_applied(),
            "Reverting advance deductions"
        );
        self.kardex.reverse_movements(&committed.movements).await;
        self.restore_balances(&committed.outcome.applied).await;
    }

    async fn restore_balances(&self, applied: &[AppliedDeduction]) {
        for deduction in applied.iter().rev() {
            if let Err(e) = self
                .write_balance(deduction.advance_id, deduction.balance_before, None)
                .await
            {
                tracing::error!(
                    advance_id = deduction.advance_id,
                    balance = %deduction.balance_before,
                    error = %e,
                    "Failed to restore advance balance"
                );
            }
        }
    }
}
