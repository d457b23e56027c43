use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::PurchasePattern;
use crate::providers::PatternStore;

/// Persisted purchase patterns, the one table this engine owns.
///
/// The upsert targets the `(item_id, branch_id)` natural key (declared
/// `NULLS NOT DISTINCT` so the network-wide row with a NULL branch also
/// upserts instead of duplicating). Last write wins; no optimistic locking.
pub struct PatternRepo {
    pool: PgPool,
}

impl PatternRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row shape with the seasonality map as JSONB; the typed month-to-average
/// map exists only on the domain side.
#[derive(FromRow)]
struct PatternRow {
    id: Uuid,
    item_id: Uuid,
    branch_id: Option<Uuid>,
    avg_order_cycle_days: f64,
    avg_order_quantity: f64,
    avg_order_amount: f64,
    std_dev_quantity: f64,
    std_dev_amount: f64,
    is_increasing: bool,
    is_decreasing: bool,
    is_seasonal: bool,
    seasonality: Option<serde_json::Value>,
    last_order_date: Option<NaiveDate>,
    next_predicted_order: Option<NaiveDate>,
    confidence_score: f64,
    based_on_invoices: i64,
    analysis_start: NaiveDate,
    analysis_end: NaiveDate,
    computed_at: DateTime<Utc>,
}

impl PatternRow {
    fn into_pattern(self) -> Result<PurchasePattern, EngineError> {
        let seasonality: Option<BTreeMap<u32, f64>> = match self.seasonality {
            Some(value) => Some(
                serde_json::from_value(value)
                    .map_err(|e| EngineError::serialization("patterns.find", e))?,
            ),
            None => None,
        };
        Ok(PurchasePattern {
            id: self.id,
            item_id: self.item_id,
            branch_id: self.branch_id,
            avg_order_cycle_days: self.avg_order_cycle_days,
            avg_order_quantity: self.avg_order_quantity,
            avg_order_amount: self.avg_order_amount,
            std_dev_quantity: self.std_dev_quantity,
            std_dev_amount: self.std_dev_amount,
            is_increasing: self.is_increasing,
            is_decreasing: self.is_decreasing,
            is_seasonal: self.is_seasonal,
            seasonality,
            last_order_date: self.last_order_date,
            next_predicted_order: self.next_predicted_order,
            confidence_score: self.confidence_score,
            based_on_invoices: self.based_on_invoices,
            analysis_start: self.analysis_start,
            analysis_end: self.analysis_end,
            computed_at: self.computed_at,
        })
    }
}

#[async_trait]
impl PatternStore for PatternRepo {
    async fn find(
        &self,
        item_id: Uuid,
        branch_id: Option<Uuid>,
    ) -> Result<Option<PurchasePattern>, EngineError> {
        let row: Option<PatternRow> = sqlx::query_as(
            r#"SELECT * FROM purchase_patterns
               WHERE item_id = $1 AND branch_id IS NOT DISTINCT FROM $2"#,
        )
        .bind(item_id)
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| EngineError::storage("patterns.find", e))?;

        row.map(PatternRow::into_pattern).transpose()
    }

    async fn upsert(&self, pattern: &PurchasePattern) -> Result<(), EngineError> {
        let seasonality = pattern
            .seasonality
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| EngineError::serialization("patterns.upsert", e))?;

        sqlx::query(
            r#"INSERT INTO purchase_patterns (
                   id, item_id, branch_id, avg_order_cycle_days, avg_order_quantity,
                   avg_order_amount, std_dev_quantity, std_dev_amount, is_increasing,
                   is_decreasing, is_seasonal, seasonality, last_order_date,
                   next_predicted_order, confidence_score, based_on_invoices,
                   analysis_start, analysis_end, computed_at
               )
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
               ON CONFLICT (item_id, branch_id)
               DO UPDATE SET
                   avg_order_cycle_days = EXCLUDED.avg_order_cycle_days,
                   avg_order_quantity = EXCLUDED.avg_order_quantity,
                   avg_order_amount = EXCLUDED.avg_order_amount,
                   std_dev_quantity = EXCLUDED.std_dev_quantity,
                   std_dev_amount = EXCLUDED.std_dev_amount,
                   is_increasing = EXCLUDED.is_increasing,
                   is_decreasing = EXCLUDED.is_decreasing,
                   is_seasonal = EXCLUDED.is_seasonal,
                   seasonality = EXCLUDED.seasonality,
                   last_order_date = EXCLUDED.last_order_date,
                   next_predicted_order = EXCLUDED.next_predicted_order,
                   confidence_score = EXCLUDED.confidence_score,
                   based_on_invoices = EXCLUDED.based_on_invoices,
                   analysis_start = EXCLUDED.analysis_start,
                   analysis_end = EXCLUDED.analysis_end,
                   computed_at = EXCLUDED.computed_at"#,
        )
        .bind(pattern.id)
        .bind(pattern.item_id)
        .bind(pattern.branch_id)
        .bind(pattern.avg_order_cycle_days)
        .bind(pattern.avg_order_quantity)
        .bind(pattern.avg_order_amount)
        .bind(pattern.std_dev_quantity)
        .bind(pattern.std_dev_amount)
        .bind(pattern.is_increasing)
        .bind(pattern.is_decreasing)
        .bind(pattern.is_seasonal)
        .bind(seasonality)
        .bind(pattern.last_order_date)
        .bind(pattern.next_predicted_order)
        .bind(pattern.confidence_score)
        .bind(pattern.based_on_invoices)
        .bind(pattern.analysis_start)
        .bind(pattern.analysis_end)
        .bind(pattern.computed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::storage("patterns.upsert", e))?;

        Ok(())
    }
}
