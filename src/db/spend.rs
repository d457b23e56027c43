use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::SpendAggregate;
use crate::providers::SpendAggregates;

/// Read-side consumer of the `spend_aggregates` rollup table. The rollup is
/// maintained by a separate aggregation job; this engine only reads it.
pub struct SpendAggregateRepo {
    pool: PgPool,
}

impl SpendAggregateRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SpendAggregates for SpendAggregateRepo {
    async fn in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        item_id: Option<Uuid>,
    ) -> Result<Vec<SpendAggregate>, EngineError> {
        let rows: Vec<(NaiveDate, Uuid, String, Uuid, String, Uuid, String, f64, i64)> =
            sqlx::query_as(
                r#"SELECT s.date, s.item_id, it.name, s.vendor_id, v.name, s.branch_id, b.name,
                          s.total_amount::float8, s.invoice_count
                   FROM spend_aggregates s
                   INNER JOIN items it ON it.id = s.item_id
                   INNER JOIN vendors v ON v.id = s.vendor_id
                   INNER JOIN branches b ON b.id = s.branch_id
                   WHERE s.date >= $1 AND s.date <= $2
                     AND ($3::uuid IS NULL OR s.item_id = $3)
                   ORDER BY s.date"#,
            )
            .bind(start)
            .bind(end)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| EngineError::storage("spend.in_range", e))?;

        Ok(rows
            .into_iter()
            .map(
                |(
                    date,
                    item_id,
                    item_name,
                    vendor_id,
                    vendor_name,
                    branch_id,
                    branch_name,
                    total_amount,
                    invoice_count,
                )| SpendAggregate {
                    date,
                    item_id,
                    item_name,
                    vendor_id,
                    vendor_name,
                    branch_id,
                    branch_name,
                    total_amount,
                    invoice_count,
                },
            )
            .collect())
    }
}
