//! Liquidation service: assembles settlement inputs from upstream data,
//! builds the settlement and shapes liquidation detail responses

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    build_liquidation, plan_deductions, Batch, BatchStatus, Category, DeductionOutcome,
    DiscountConfig, DiscountOverrides, KardexMovement, Liquidation, LiquidationInput,
    MovementEntry, MovementRequest, PaymentStatus, Producer, SourceDocument, SourceDocumentKind,
    WeightClassification,
};

use crate::error::{AppError, AppResult};
use crate::external::SayariqClient;
use crate::services::advance::AdvanceService;
use crate::services::kardex::KardexService;

/// Liquidation service for settling weighed batches
#[derive(Clone)]
pub struct LiquidationService {
    client: SayariqClient,
    advances: AdvanceService,
    kardex: KardexService,
    discounts: DiscountConfig,
}

/// Settlement computed without writing anything upstream
#[derive(Debug, Clone, Serialize)]
pub struct LiquidationPreview {
    pub liquidation: Liquidation,
    pub deductions: DeductionOutcome,
    pub producer: Producer,
}

/// Input for settling a batch
#[derive(Debug, Default, Deserialize)]
pub struct CreateLiquidationInput {
    #[serde(default)]
    pub descuentos: Option<DiscountOverrides>,
}

/// Input for moving a liquidation's payment status
#[derive(Debug, Deserialize)]
pub struct UpdatePaymentStatusInput {
    pub estado_pago: PaymentStatus,
}

#[derive(Debug, Deserialize)]
struct CreatedLiquidation {
    id: i64,
}

/// Default `estado_pago` to `PENDIENTE` on every liquidation in a detail payload
///
/// Accepts an array of liquidations or a single one; any other shape is an
/// upstream error. Other fields are left untouched.
pub fn normalize_liquidation_detail(payload: Value) -> AppResult<Value> {
    fn default_status(item: &mut Value) -> AppResult<()> {
        match item {
            Value::Object(map) => {
                map.entry("estado_pago")
                    .or_insert_with(|| Value::String(PaymentStatus::Pendiente.as_str().into()));
                Ok(())
            }
            other => Err(AppError::Upstream {
                status: 200,
                message: format!("Unexpected liquidation item: {}", other),
            }),
        }
    }

    match payload {
        Value::Array(mut items) => {
            for item in items.iter_mut() {
                default_status(item)?;
            }
            Ok(Value::Array(items))
        }
        mut object @ Value::Object(_) => {
            default_status(&mut object)?;
            Ok(object)
        }
        other => Err(AppError::Upstream {
            status: 200,
            message: format!("Unexpected liquidation payload: {}", other),
        }),
    }
}

/// The record of one liquidation inside a detail payload
///
/// Arrays are searched by id; a single-item array without ids is taken as is.
pub(crate) fn payment_record(detail: &Value, liquidation_id: i64) -> Option<&Value> {
    match detail {
        Value::Array(items) => items
            .iter()
            .find(|item| item.get("id").and_then(Value::as_i64) == Some(liquidation_id))
            .or_else(|| match items.as_slice() {
                [only] => Some(only),
                _ => None,
            }),
        Value::Object(_) => Some(detail),
        _ => None,
    }
}

/// Latest classification recorded for a batch
fn latest_weights(mut weights: Vec<WeightClassification>) -> Option<WeightClassification> {
    weights.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at).then(a.id.cmp(&b.id)));
    weights.pop()
}

impl LiquidationService {
    /// Create a new LiquidationService instance
    pub fn new(
        client: SayariqClient,
        advances: AdvanceService,
        kardex: KardexService,
        discounts: DiscountConfig,
    ) -> Self {
        Self {
            client,
            advances,
            kardex,
            discounts,
        }
    }

    /// Gather producer, weights, categories and outstanding advances for a batch
    pub async fn assemble_input(&self, batch_id: i64) -> AppResult<LiquidationInput> {
        let batch: Batch = self.client.get(&format!("/lotes/{}", batch_id)).await?;

        let producer_path = format!("/personas/{}", batch.producer_id);
        let weights_path = format!("/pesos-lote?lote_id={}", batch_id);
        let (producer, weights, categories, outstanding_advances) = tokio::try_join!(
            self.client.get::<Producer>(&producer_path),
            self.client.get::<Option<Vec<WeightClassification>>>(&weights_path),
            self.client.get::<Option<Vec<Category>>>("/categorias"),
            self.advances.outstanding_advances(batch.producer_id),
        )?;

        let weights = weights
            .unwrap_or_default()
            .into_iter()
            .filter(|w| w.batch_id == batch_id)
            .collect();
        let weights = latest_weights(weights).ok_or_else(|| {
            AppError::InsufficientData(format!(
                "No weight classification recorded for batch {}",
                batch_id
            ))
        })?;
        let categories = categories.unwrap_or_default();
        if categories.is_empty() {
            return Err(AppError::InsufficientData(
                "No price categories configured".to_string(),
            ));
        }

        let input = LiquidationInput {
            batch,
            producer,
            weights,
            categories,
            outstanding_advances,
            settlement_date: Utc::now().date_naive(),
        };
        input.validate()?;
        Ok(input)
    }

    fn discount_config(&self, overrides: Option<&DiscountOverrides>) -> DiscountConfig {
        match overrides {
            Some(overrides) => self.discounts.with_overrides(overrides),
            None => self.discounts,
        }
    }

    /// Settlement value advances can be recovered from: gross minus discounts
    fn recoverable_value(input: &LiquidationInput, config: &DiscountConfig) -> AppResult<Decimal> {
        let base = build_liquidation(&input.batch, &input.weights, &input.categories, &[], config)?;
        Ok(base.discounts.net_amount)
    }

    /// Compute a batch's settlement without writing anything upstream
    pub async fn preview(
        &self,
        batch_id: i64,
        overrides: Option<&DiscountOverrides>,
    ) -> AppResult<LiquidationPreview> {
        let input = self.assemble_input(batch_id).await?;
        let config = self.discount_config(overrides);

        let available = Self::recoverable_value(&input, &config)?;
        let deductions = plan_deductions(&input.outstanding_advances, available)?;
        let liquidation = build_liquidation(
            &input.batch,
            &input.weights,
            &input.categories,
            &deductions.amounts(),
            &config,
        )?;

        Ok(LiquidationPreview {
            liquidation,
            deductions,
            producer: input.producer,
        })
    }

    /// Settle a weighed batch
    ///
    /// The liquidation is stored before any advance balance changes. Then
    /// come the deductions, the fruit intake rows and the batch status. A
    /// failure after the liquidation is stored undoes the earlier writes.
    pub async fn create(
        &self,
        batch_id: i64,
        overrides: Option<&DiscountOverrides>,
    ) -> AppResult<Liquidation> {
        let input = self.assemble_input(batch_id).await?;
        if !input.batch.status.can_transition_to(BatchStatus::Liquidado) {
            return Err(AppError::InvalidStateTransition(format!(
                "batch {} is {} and cannot be settled",
                batch_id, input.batch.status
            )));
        }

        let existing: Option<Vec<Value>> = self
            .client
            .get(&format!("/liquidaciones?lote_id={}", batch_id))
            .await?;
        let already_settled = existing
            .unwrap_or_default()
            .iter()
            .any(|l| l.get("lote_id").and_then(Value::as_i64) == Some(batch_id));
        if already_settled {
            return Err(AppError::Validation {
                field: "lote_id".to_string(),
                message: format!("Batch {} already has a liquidation", batch_id),
            });
        }

        let config = self.discount_config(overrides);
        let available = Self::recoverable_value(&input, &config)?;

        // Advances are re-read and planned under the producer lock; nothing
        // touches them until the liquidation is stored
        let producer_id = input.producer.id;
        let _guard = self.advances.lock_producer(producer_id).await;
        let outstanding = self.advances.outstanding_advances(producer_id).await?;
        let deductions = plan_deductions(&outstanding, available)?;

        let mut liquidation = build_liquidation(
            &input.batch,
            &input.weights,
            &input.categories,
            &deductions.amounts(),
            &config,
        )?;
        if liquidation.is_overdrawn() {
            tracing::warn!(
                batch_id,
                net_payable = %liquidation.net_payable,
                "Liquidation net payable is negative"
            );
        }

        let created: CreatedLiquidation = self.client.post("/liquidaciones", &liquidation).await?;
        liquidation.id = Some(created.id);

        let committed = match self.advances.commit_deductions(batch_id, deductions).await {
            Ok(committed) => committed,
            Err(e) => {
                self.discard_liquidation(created.id).await;
                return Err(e);
            }
        };

        let mut intake = Vec::new();
        if let Err(e) = self
            .record_intake_and_settle(created.id, &liquidation, &mut intake)
            .await
        {
            self.kardex.reverse_movements(&intake).await;
            self.advances.revert_deductions(&committed).await;
            self.discard_liquidation(created.id).await;
            return Err(e);
        }

        tracing::info!(
            liquidation_id = created.id,
            batch_id,
            gross = %liquidation.gross_fruit_value,
            deducted = %liquidation.total_advances_deducted,
            net_payable = %liquidation.net_payable,
            "Liquidation created"
        );
        Ok(liquidation)
    }

    /// Record the fruit intake per category, then mark the batch settled
    async fn record_intake_and_settle(
        &self,
        liquidation_id: i64,
        liquidation: &Liquidation,
        recorded: &mut Vec<KardexMovement>,
    ) -> AppResult<()> {
        for item in &liquidation.line_items {
            let movement = self
                .kardex
                .record_movement(MovementRequest {
                    source: SourceDocument {
                        kind: SourceDocumentKind::Liquidacion,
                        id: Some(liquidation_id),
                    },
                    entry: MovementEntry::Fisico {
                        lote_id: liquidation.batch_id,
                        categoria: item.category,
                        delta_kg: item.weight_kg,
                    },
                    concept: Some(format!("Ingreso {} por liquidación", item.category)),
                })
                .await?;
            recorded.push(movement);
        }

        let _: Value = self
            .client
            .put(
                &format!("/lotes/{}", liquidation.batch_id),
                &serde_json::json!({ "estado": BatchStatus::Liquidado.as_str() }),
            )
            .await?;
        Ok(())
    }

    async fn discard_liquidation(&self, liquidation_id: i64) {
        if let Err(e) = self
            .client
            .delete(&format!("/liquidaciones/{}", liquidation_id))
            .await
        {
            tracing::error!(
                liquidation_id,
                error = %e,
                "Failed to discard liquidation of a failed settlement"
            );
        }
    }

    /// Liquidation detail with `estado_pago` defaulted
    pub async fn get_detail(&self, liquidation_id: i64) -> AppResult<Value> {
        let payload = self
            .client
            .get_value(&format!("/liquidaciones/{}", liquidation_id))
            .await?;
        if payload.is_null() {
            return Err(AppError::NotFound(format!("Liquidation {}", liquidation_id)));
        }
        normalize_liquidation_detail(payload)
    }

    /// Move a liquidation's payment status forward; paying records the cash out
    pub async fn update_status(
        &self,
        liquidation_id: i64,
        next: PaymentStatus,
    ) -> AppResult<Value> {
        let detail = self.get_detail(liquidation_id).await?;
        let record = payment_record(&detail, liquidation_id).ok_or_else(|| AppError::Upstream {
            status: 200,
            message: format!("Liquidation {} missing from detail payload", liquidation_id),
        })?;
        let current: PaymentStatus = record
            .get("estado_pago")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .ok_or_else(|| AppError::Upstream {
                status: 200,
                message: "Liquidation detail has no readable estado_pago".to_string(),
            })?;

        if !current.can_transition_to(next) {
            return Err(AppError::InvalidStateTransition(format!(
                "liquidation {} cannot go from {} to {}",
                liquidation_id, current, next
            )));
        }

        let updated: Value = self
            .client
            .put(
                &format!("/liquidaciones/{}", liquidation_id),
                &serde_json::json!({ "estado_pago": next }),
            )
            .await?;

        if next == PaymentStatus::Pagado {
            let net_payable = record
                .get("net_payable")
                .cloned()
                .and_then(|v| serde_json::from_value::<Decimal>(v).ok());
            match net_payable {
                Some(amount) if amount > Decimal::ZERO => {
                    self.kardex
                        .record_movement(MovementRequest {
                            source: SourceDocument {
                                kind: SourceDocumentKind::Liquidacion,
                                id: Some(liquidation_id),
                            },
                            entry: MovementEntry::Financiero {
                                cuenta: shared::AccountType::Caja,
                                delta_monto: -amount,
                            },
                            concept: Some(format!("Pago de liquidación {}", liquidation_id)),
                        })
                        .await?;
                }
                Some(_) => {}
                None => tracing::warn!(
                    liquidation_id,
                    "Paid liquidation has no net_payable; cash movement not recorded"
                ),
            }
        }

        tracing::info!(liquidation_id, from = %current, to = %next, "Payment status updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_items_get_default_status() {
        let payload = json!([
            { "id": 1, "net_payable": "10", "estado_pago": "PAGADO" },
            { "id": 2, "net_payable": "20" }
        ]);
        let shaped = normalize_liquidation_detail(payload).unwrap();

        assert_eq!(shaped[0]["estado_pago"], "PAGADO");
        assert_eq!(shaped[1]["estado_pago"], "PENDIENTE");
        assert_eq!(shaped[1]["net_payable"], "20");
        assert_eq!(shaped[1]["id"], 2);
    }

    #[test]
    fn test_single_object_gets_default_status() {
        let shaped = normalize_liquidation_detail(json!({ "id": 5 })).unwrap();
        assert_eq!(shaped, json!({ "id": 5, "estado_pago": "PENDIENTE" }));
    }

    #[test]
    fn test_payment_record_in_array_detail() {
        let detail = json!([
            { "id": 4, "estado_pago": "PAGADO" },
            { "id": 5, "estado_pago": "PENDIENTE", "net_payable": "300" }
        ]);
        let record = payment_record(&detail, 5).unwrap();
        assert_eq!(record["net_payable"], "300");
        assert!(payment_record(&detail, 6).is_none());

        let single = json!([{ "estado_pago": "PENDIENTE" }]);
        assert_eq!(payment_record(&single, 9).unwrap()["estado_pago"], "PENDIENTE");

        let object = json!({ "id": 5 });
        assert_eq!(payment_record(&object, 5), Some(&object));
        assert!(payment_record(&json!("x"), 5).is_none());
    }

    #[test]
    fn test_other_shapes_are_rejected() {
        assert!(normalize_liquidation_detail(json!("oops")).is_err());
        assert!(normalize_liquidation_detail(json!(42)).is_err());
        assert!(normalize_liquidation_detail(json!([1, 2])).is_err());
    }
}
