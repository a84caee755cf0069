//! Dashboard loading: independent upstream reads issued concurrently, each
//! section carrying its own error so one failure never blanks the view

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use shared::{profitability, Batch, DateRange, FixedCost, ProfitabilityReport};

use crate::error::{AppError, AppResult};
use crate::external::SayariqClient;

/// Data of one dashboard section plus the last fetch error
#[derive(Debug, Clone, Serialize)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
        }
    }
}

impl<T> FetchState<T> {
    pub fn from_result(result: AppResult<T>) -> Self {
        Self::default().refresh(result)
    }

    /// Apply a new fetch result; on failure the last known data is kept
    pub fn refresh(self, result: AppResult<T>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Dashboard section failed to load");
                Self {
                    data: self.data,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Dashboard summary sections
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub lotes: FetchState<Vec<Batch>>,
    pub personas: FetchState<Vec<Value>>,
    pub adelantos: FetchState<Vec<Value>>,
    pub liquidaciones: FetchState<Vec<Value>>,
}

/// Dashboard service
#[derive(Clone)]
pub struct DashboardService {
    client: SayariqClient,
}

/// Sale totals as exposed by the upstream
#[derive(Debug, serde::Deserialize)]
struct SaleTotal {
    total: Decimal,
}

/// Liquidation gross value as stored upstream
#[derive(Debug, serde::Deserialize)]
struct LiquidationTotal {
    gross_fruit_value: Decimal,
}

impl DashboardService {
    pub fn new(client: SayariqClient) -> Self {
        Self { client }
    }

    async fn list<T: serde::de::DeserializeOwned>(&self, path: &str) -> AppResult<Vec<T>> {
        let items: Option<Vec<T>> = self.client.get(path).await?;
        Ok(items.unwrap_or_default())
    }

    /// Load every section concurrently
    pub async fn summary(&self) -> DashboardSummary {
        let (lotes, personas, adelantos, liquidaciones) = tokio::join!(
            self.list::<Batch>("/lotes"),
            self.list::<Value>("/personas"),
            self.list::<Value>("/adelantos"),
            self.list::<Value>("/liquidaciones"),
        );

        let liquidaciones = liquidaciones.and_then(|items| {
            match crate::services::liquidation::normalize_liquidation_detail(Value::Array(items))? {
                Value::Array(items) => Ok(items),
                _ => Err(AppError::Internal("liquidation list reshaped".to_string())),
            }
        });

        DashboardSummary {
            lotes: FetchState::from_result(lotes),
            personas: FetchState::from_result(personas),
            adelantos: FetchState::from_result(adelantos),
            liquidaciones: FetchState::from_result(liquidaciones),
        }
    }

    /// Profitability over sales, settled gross values and fixed costs
    pub async fn profitability(&self, period: Option<DateRange>) -> AppResult<ProfitabilityReport> {
        let query = period
            .as_ref()
            .map(|p| format!("?desde={}&hasta={}", p.start, p.end))
            .unwrap_or_default();
        let sales_path = format!("/ventas{}", query);
        let liquidations_path = format!("/liquidaciones{}", query);

        let (sales, liquidations, fixed_costs) = tokio::try_join!(
            self.list::<SaleTotal>(&sales_path),
            self.list::<LiquidationTotal>(&liquidations_path),
            self.list::<FixedCost>("/costos-fijos"),
        )?;

        let sales: Vec<Decimal> = sales.into_iter().map(|s| s.total).collect();
        let settlements: Vec<Decimal> =
            liquidations.into_iter().map(|l| l.gross_fruit_value).collect();

        Ok(profitability(period, &sales, &settlements, &fixed_costs)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_refresh_keeps_last_data() {
        let state = FetchState::from_result(Ok(vec![1, 2, 3]));
        let state = state.refresh(Err(AppError::Network("timed out".to_string())));

        assert_eq!(state.data, Some(vec![1, 2, 3]));
        assert!(state.error.unwrap().contains("timed out"));
    }

    #[test]
    fn test_successful_refresh_clears_error() {
        let state: FetchState<Vec<i32>> =
            FetchState::from_result(Err(AppError::Network("down".to_string())));
        assert!(state.data.is_none());

        let state = state.refresh(Ok(vec![4]));
        assert_eq!(state.data, Some(vec![4]));
        assert!(state.error.is_none());
    }
}
