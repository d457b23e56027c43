use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::{OrderObservation, PriceSnapshot, PurchasePattern, SpendAggregate};

/// Read-only access to finalized transaction history. Implementations must
/// restrict results to approved, non-soft-deleted invoices.
#[async_trait]
pub trait OrderHistory: Send + Sync {
    async fn finalized_orders(
        &self,
        item_id: Uuid,
        branch_id: Option<Uuid>,
    ) -> Result<Vec<OrderObservation>, EngineError>;

    /// Distinct `(item_id, branch_id)` pairs with order activity inside the
    /// trailing window; feeds the background pattern-refresh job.
    async fn active_pattern_keys(
        &self,
        window_days: i64,
    ) -> Result<Vec<(Uuid, Option<Uuid>)>, EngineError>;
}

/// Two-tier price source: recorded price snapshots first, invoice-derived
/// prices as the fallback when no snapshot exists in the window.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn recent_snapshots(
        &self,
        item_id: Uuid,
        vendor_id: Option<Uuid>,
        window_days: i64,
    ) -> Result<Vec<PriceSnapshot>, EngineError>;

    async fn invoice_prices(
        &self,
        item_id: Uuid,
        vendor_id: Option<Uuid>,
        window_days: i64,
    ) -> Result<Vec<PriceSnapshot>, EngineError>;
}

/// Precomputed per-dimension spend rollups, produced by an aggregation job
/// outside this engine.
#[async_trait]
pub trait SpendAggregates: Send + Sync {
    async fn in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        item_id: Option<Uuid>,
    ) -> Result<Vec<SpendAggregate>, EngineError>;
}

/// Persisted pattern store. Upsert is keyed by `(item_id, branch_id)` and is
/// last-write-wins; this engine never deletes patterns.
#[async_trait]
pub trait PatternStore: Send + Sync {
    async fn find(
        &self,
        item_id: Uuid,
        branch_id: Option<Uuid>,
    ) -> Result<Option<PurchasePattern>, EngineError>;

    async fn upsert(&self, pattern: &PurchasePattern) -> Result<(), EngineError>;
}
