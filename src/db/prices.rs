use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::PriceSnapshot;
use crate::providers::PriceSource;

type SnapshotRow = (Uuid, String, Uuid, String, f64, NaiveDate);

/// Two-tier price source: the `price_snapshots` table first, approved
/// invoice line items as the fallback.
pub struct PriceSnapshotRepo {
    pool: PgPool,
}

impl PriceSnapshotRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_snapshots(rows: Vec<SnapshotRow>) -> Vec<PriceSnapshot> {
    rows.into_iter()
        .map(|(branch_id, branch_name, vendor_id, vendor_name, price, date)| PriceSnapshot {
            branch_id,
            branch_name,
            vendor_id,
            vendor_name,
            price,
            date,
        })
        .collect()
}

#[async_trait]
impl PriceSource for PriceSnapshotRepo {
    async fn recent_snapshots(
        &self,
        item_id: Uuid,
        vendor_id: Option<Uuid>,
        window_days: i64,
    ) -> Result<Vec<PriceSnapshot>, EngineError> {
        let since = Utc::now().date_naive() - Duration::days(window_days);
        let rows: Vec<SnapshotRow> = sqlx::query_as(
            r#"SELECT p.branch_id, b.name, p.vendor_id, v.name, p.price::float8, p.recorded_on
               FROM price_snapshots p
               INNER JOIN branches b ON b.id = p.branch_id
               INNER JOIN vendors v ON v.id = p.vendor_id
               WHERE p.item_id = $1
                 AND p.recorded_on >= $2
                 AND ($3::uuid IS NULL OR p.vendor_id = $3)
               ORDER BY p.recorded_on"#,
        )
        .bind(item_id)
        .bind(since)
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::storage("prices.recent_snapshots", e))?;

        Ok(to_snapshots(rows))
    }

    async fn invoice_prices(
        &self,
        item_id: Uuid,
        vendor_id: Option<Uuid>,
        window_days: i64,
    ) -> Result<Vec<PriceSnapshot>, EngineError> {
        let since = Utc::now().date_naive() - Duration::days(window_days);
        let rows: Vec<SnapshotRow> = sqlx::query_as(
            r#"SELECT i.branch_id, b.name, i.vendor_id, v.name, l.unit_price::float8, i.invoice_date
               FROM invoice_lines l
               INNER JOIN invoices i ON i.id = l.invoice_id
               INNER JOIN branches b ON b.id = i.branch_id
               INNER JOIN vendors v ON v.id = i.vendor_id
               WHERE l.item_id = $1
                 AND i.status = 'approved'
                 AND i.deleted_at IS NULL
                 AND i.invoice_date >= $2
                 AND ($3::uuid IS NULL OR i.vendor_id = $3)
               ORDER BY i.invoice_date"#,
        )
        .bind(item_id)
        .bind(since)
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| EngineError::storage("prices.invoice_prices", e))?;

        Ok(to_snapshots(rows))
    }
}
