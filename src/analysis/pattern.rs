use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::{confidence, cycle, seasonality, trend};
use crate::cache::{self, keys, Cache};
use crate::config::{AnalysisConfig, CacheTtlConfig};
use crate::errors::EngineError;
use crate::events::{EngineEvent, EventChannel};
use crate::models::order::sorted_by_date;
use crate::models::{AnomalyKind, OrderAnomaly, PatternOutcome, PurchasePattern};
use crate::providers::{OrderHistory, PatternStore};
use crate::stats;

/// Orchestrates the statistical detectors to produce and maintain one
/// purchase pattern per `(item, branch)` pair, and to flag anomalous orders
/// against a pattern.
///
/// Concurrent recomputation of the same key is possible; the upsert is
/// last-write-wins, which is acceptable because a pattern is derived,
/// recomputable state rather than an authoritative record.
pub struct PatternEngine {
    orders: Arc<dyn OrderHistory>,
    patterns: Arc<dyn PatternStore>,
    cache: Arc<dyn Cache>,
    events: Arc<dyn EventChannel>,
    analysis: AnalysisConfig,
    ttl: CacheTtlConfig,
}

impl PatternEngine {
    pub fn new(
        orders: Arc<dyn OrderHistory>,
        patterns: Arc<dyn PatternStore>,
        cache: Arc<dyn Cache>,
        events: Arc<dyn EventChannel>,
        analysis: AnalysisConfig,
        ttl: CacheTtlConfig,
    ) -> Self {
        Self {
            orders,
            patterns,
            cache,
            events,
            analysis,
            ttl,
        }
    }

    /// Recomputes the purchase pattern for `(item_id, branch_id)` from
    /// finalized order history.
    ///
    /// Histories shorter than `min_invoices_for_pattern` yield
    /// `InsufficientData`, never an error. Otherwise the pattern is upserted
    /// by its natural key (idempotent, repeated calls overwrite), the cache
    /// entry is refreshed and a `PATTERN_DETECTED` event is published.
    pub async fn analyze_purchase_pattern(
        &self,
        item_id: Uuid,
        branch_id: Option<Uuid>,
    ) -> Result<PatternOutcome, EngineError> {
        let orders = self.orders.finalized_orders(item_id, branch_id).await?;
        if orders.is_empty() || (orders.len() as u32) < self.analysis.min_invoices_for_pattern {
            info!(
                %item_id,
                ?branch_id,
                orders = orders.len(),
                min_required = self.analysis.min_invoices_for_pattern,
                "Insufficient history for pattern analysis"
            );
            return Ok(PatternOutcome::InsufficientData);
        }

        let sorted = sorted_by_date(&orders);
        let quantities: Vec<f64> = sorted.iter().map(|o| o.quantity).collect();
        let amounts: Vec<f64> = sorted.iter().map(|o| o.amount).collect();

        let avg_cycle_days = cycle::average_cycle_days(&sorted);
        let detected_trend = trend::detect_trend(&sorted, self.analysis.trend_band_pct);
        let seasonality_map =
            seasonality::detect_seasonality(&sorted, self.analysis.seasonality_cv_threshold);

        let analysis_start = sorted[0].date;
        let analysis_end = sorted[sorted.len() - 1].date;
        let last_order_date = Some(analysis_end);
        let next_predicted_order = if avg_cycle_days > 0.0 {
            Some(analysis_end + Duration::days(avg_cycle_days.round() as i64))
        } else {
            None
        };

        let confidence_score = confidence::score(
            &sorted,
            self.analysis.min_invoices_for_pattern,
            avg_cycle_days,
            self.analysis.recency_horizon_days,
            Utc::now().date_naive(),
        );

        let existing = self.patterns.find(item_id, branch_id).await?;
        let is_new_pattern = existing.is_none();

        let pattern = PurchasePattern {
            id: existing.map(|p| p.id).unwrap_or_else(Uuid::new_v4),
            item_id,
            branch_id,
            avg_order_cycle_days: avg_cycle_days,
            avg_order_quantity: stats::mean(&quantities),
            avg_order_amount: stats::mean(&amounts),
            std_dev_quantity: stats::std_dev(&quantities),
            std_dev_amount: stats::std_dev(&amounts),
            is_increasing: detected_trend.is_increasing,
            is_decreasing: detected_trend.is_decreasing,
            is_seasonal: seasonality_map.is_some(),
            seasonality: seasonality_map,
            last_order_date,
            next_predicted_order,
            confidence_score,
            based_on_invoices: sorted.len() as i64,
            analysis_start,
            analysis_end,
            computed_at: Utc::now(),
        };

        self.patterns.upsert(&pattern).await?;
        cache::put_json(
            self.cache.as_ref(),
            &keys::pattern(item_id, branch_id),
            &pattern,
            self.ttl.pattern_secs,
        )
        .await?;
        // The pattern changed, so any cached anomaly list is stale.
        self.cache.del(&keys::anomalies(item_id, branch_id)).await?;

        info!(
            %item_id,
            ?branch_id,
            confidence = pattern.confidence_score,
            invoices = pattern.based_on_invoices,
            is_new_pattern,
            "Purchase pattern computed"
        );
        self.events
            .publish(EngineEvent::PatternDetected {
                item_id,
                branch_id,
                confidence_score: pattern.confidence_score,
                is_new_pattern,
            })
            .await;

        Ok(PatternOutcome::Found(pattern))
    }

    /// The pattern's predicted next order date, computing the pattern
    /// lazily when none has been persisted yet.
    pub async fn predict_next_order(
        &self,
        item_id: Uuid,
        branch_id: Option<Uuid>,
    ) -> Result<Option<NaiveDate>, EngineError> {
        if let Some(pattern) = self.current_pattern(item_id, branch_id).await? {
            return Ok(pattern.next_predicted_order);
        }
        match self.analyze_purchase_pattern(item_id, branch_id).await? {
            PatternOutcome::Found(pattern) => Ok(pattern.next_predicted_order),
            PatternOutcome::InsufficientData => Ok(None),
        }
    }

    /// Flags historical orders whose quantity or amount deviates from the
    /// pattern by more than the configured number of standard deviations.
    ///
    /// Returns an empty list when no pattern can be computed. One
    /// `ANOMALY_DETECTED` event is published per flagged order; the list is
    /// cached with the anomaly TTL.
    pub async fn detect_anomalies(
        &self,
        item_id: Uuid,
        branch_id: Option<Uuid>,
    ) -> Result<Vec<OrderAnomaly>, EngineError> {
        let cache_key = keys::anomalies(item_id, branch_id);
        if let Some(cached) =
            cache::get_json::<Vec<OrderAnomaly>>(self.cache.as_ref(), &cache_key).await?
        {
            return Ok(cached);
        }

        let pattern = match self.current_pattern(item_id, branch_id).await? {
            Some(pattern) => pattern,
            None => match self.analyze_purchase_pattern(item_id, branch_id).await? {
                PatternOutcome::Found(pattern) => pattern,
                PatternOutcome::InsufficientData => return Ok(Vec::new()),
            },
        };

        let orders = self.orders.finalized_orders(item_id, branch_id).await?;
        let threshold = self.analysis.anomaly_std_dev_threshold;
        let mut anomalies = Vec::new();

        for order in &orders {
            let quantity_deviation = stats::safe_div(
                (order.quantity - pattern.avg_order_quantity).abs(),
                pattern.std_dev_quantity,
            );
            let amount_deviation = stats::safe_div(
                (order.amount - pattern.avg_order_amount).abs(),
                pattern.std_dev_amount,
            );

            let quantity_exceeds = quantity_deviation > threshold;
            let amount_exceeds = amount_deviation > threshold;
            if !quantity_exceeds && !amount_exceeds {
                continue;
            }

            let kind = if quantity_exceeds && amount_exceeds {
                AnomalyKind::Both
            } else if quantity_exceeds {
                AnomalyKind::Quantity
            } else {
                AnomalyKind::Amount
            };

            anomalies.push(OrderAnomaly {
                invoice_id: order.invoice_id,
                invoice_date: order.date,
                quantity: order.quantity,
                amount: order.amount,
                expected_quantity: pattern.avg_order_quantity,
                expected_amount: pattern.avg_order_amount,
                quantity_deviation,
                amount_deviation,
                kind,
            });
        }

        if !anomalies.is_empty() {
            warn!(
                %item_id,
                ?branch_id,
                count = anomalies.len(),
                "Anomalous orders detected"
            );
        }
        for anomaly in &anomalies {
            self.events
                .publish(EngineEvent::AnomalyDetected {
                    item_id,
                    branch_id,
                    invoice_id: anomaly.invoice_id,
                    invoice_date: anomaly.invoice_date,
                    deviation: anomaly.max_deviation(),
                    kind: anomaly.kind,
                })
                .await;
        }

        cache::put_json(self.cache.as_ref(), &cache_key, &anomalies, self.ttl.anomaly_secs)
            .await?;
        Ok(anomalies)
    }

    /// Drops the cached pattern, anomaly, price-variance and benchmark
    /// results for an item, across all branches. For callers reacting to
    /// source-data changes.
    ///
    /// Branch-spending entries are keyed by date range first, so the ones
    /// filtered to this item are not reachable by prefix; they age out on
    /// their (short) spend TTL instead.
    pub async fn invalidate_item(&self, item_id: Uuid) -> Result<u64, EngineError> {
        let mut removed = 0;
        for prefix in keys::item_prefixes(item_id) {
            removed += self.cache.invalidate_prefix(&prefix).await?;
        }
        Ok(removed)
    }

    /// Cached pattern if fresh, else the persisted one; `None` when the
    /// pattern has not been computed yet.
    async fn current_pattern(
        &self,
        item_id: Uuid,
        branch_id: Option<Uuid>,
    ) -> Result<Option<PurchasePattern>, EngineError> {
        let cache_key = keys::pattern(item_id, branch_id);
        if let Some(pattern) =
            cache::get_json::<PurchasePattern>(self.cache.as_ref(), &cache_key).await?
        {
            return Ok(Some(pattern));
        }
        let persisted = self.patterns.find(item_id, branch_id).await?;
        if let Some(pattern) = &persisted {
            cache::put_json(self.cache.as_ref(), &cache_key, pattern, self.ttl.pattern_secs)
                .await?;
        }
        Ok(persisted)
    }
}
