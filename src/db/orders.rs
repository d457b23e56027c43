use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::OrderObservation;
use crate::providers::OrderHistory;

/// Order history read from the invoicing tables. Only approved,
/// non-soft-deleted invoices count as finalized; the engine never touches
/// these tables with writes.
pub struct OrderHistoryRepo {
    pool: PgPool,
}

impl OrderHistoryRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderHistory for OrderHistoryRepo {
    async fn finalized_orders(
        &self,
        item_id: Uuid,
        branch_id: Option<Uuid>,
    ) -> Result<Vec<OrderObservation>, EngineError> {
        let rows: Vec<(Uuid, NaiveDate, f64, f64)> = sqlx::query_as(
            r#"SELECT i.id, i.invoice_date, l.quantity::float8, l.unit_price::float8
               FROM invoice_lines l
               INNER JOIN invoices i ON i.id = l.invoice_id
               WHERE l.item_id = $1
                 AND i.status = 'approved'
                 AND i.deleted_at IS NULL
                 AND ($2::uuid IS NULL OR i.branch_id = $2)
               ORDER BY i.invoice_date"#,
        )
        .bind(item_id)
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::storage("orders.finalized_orders", e))?;

        Ok(rows
            .into_iter()
            .map(|(invoice_id, date, quantity, price)| {
                OrderObservation::new(invoice_id, date, quantity, price)
            })
            .collect())
    }

    async fn active_pattern_keys(
        &self,
        window_days: i64,
    ) -> Result<Vec<(Uuid, Option<Uuid>)>, EngineError> {
        let since = Utc::now().date_naive() - Duration::days(window_days);
        sqlx::query_as(
            r#"SELECT DISTINCT l.item_id, i.branch_id
               FROM invoice_lines l
               INNER JOIN invoices i ON i.id = l.invoice_id
               WHERE i.status = 'approved'
                 AND i.deleted_at IS NULL
                 AND i.invoice_date >= $1"#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::storage("orders.active_pattern_keys", e))
    }
}
