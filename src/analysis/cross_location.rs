use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::cache::{self, keys, Cache};
use crate::config::{AnalysisConfig, CacheTtlConfig};
use crate::errors::EngineError;
use crate::models::{
    BenchmarkStats, BranchPrice, BranchSpending, ConsolidationBranch, ConsolidationOpportunity,
    PriceSnapshot, PriceVarianceReport,
};
use crate::providers::{PriceSource, SpendAggregates};
use crate::stats;

/// Price-variance, benchmark, spending-comparison and consolidation
/// analytics across branches and vendors. Every operation is cache-aside:
/// deterministic key, check cache, compute on miss, populate with a
/// data-category TTL.
pub struct CrossLocationService {
    prices: Arc<dyn PriceSource>,
    spend: Arc<dyn SpendAggregates>,
    cache: Arc<dyn Cache>,
    analysis: AnalysisConfig,
    ttl: CacheTtlConfig,
}

impl CrossLocationService {
    pub fn new(
        prices: Arc<dyn PriceSource>,
        spend: Arc<dyn SpendAggregates>,
        cache: Arc<dyn Cache>,
        analysis: AnalysisConfig,
        ttl: CacheTtlConfig,
    ) -> Self {
        Self {
            prices,
            spend,
            cache,
            analysis,
            ttl,
        }
    }

    /// Cross-branch price comparison, grouped by vendor.
    ///
    /// One price per branch (most recent wins); per-branch deviation is
    /// measured against the vendor's network average; `max_variance_pct` is
    /// the maximum absolute deviation. An empty result means no price data
    /// in the window, which is a valid outcome.
    pub async fn price_variance(
        &self,
        item_id: Uuid,
        vendor_id: Option<Uuid>,
    ) -> Result<Vec<PriceVarianceReport>, EngineError> {
        let cache_key = keys::price_variance(item_id, vendor_id);
        if let Some(cached) =
            cache::get_json::<Vec<PriceVarianceReport>>(self.cache.as_ref(), &cache_key).await?
        {
            return Ok(cached);
        }

        let snapshots = self.sourced_prices(item_id, vendor_id).await?;

        let mut by_vendor: HashMap<Uuid, Vec<PriceSnapshot>> = HashMap::new();
        for snapshot in snapshots {
            by_vendor.entry(snapshot.vendor_id).or_default().push(snapshot);
        }

        let mut reports: Vec<PriceVarianceReport> = Vec::with_capacity(by_vendor.len());
        for (vendor, snapshots) in by_vendor {
            let vendor_name = snapshots[0].vendor_name.clone();
            let latest = latest_per_branch(snapshots);

            let prices: Vec<f64> = latest.iter().map(|s| s.price).collect();
            let avg = stats::mean(&prices);
            let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
            let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            let mut branches: Vec<BranchPrice> = latest
                .into_iter()
                .map(|s| BranchPrice {
                    branch_id: s.branch_id,
                    branch_name: s.branch_name,
                    deviation_from_average_pct: stats::safe_div(s.price - avg, avg) * 100.0,
                    price: s.price,
                })
                .collect();
            branches.sort_by(|a, b| a.branch_name.cmp(&b.branch_name));

            let max_variance_pct = branches
                .iter()
                .map(|b| b.deviation_from_average_pct.abs())
                .fold(0.0, f64::max);

            reports.push(PriceVarianceReport {
                item_id,
                vendor_id: vendor,
                vendor_name,
                branches,
                network_avg_price: avg,
                network_min_price: min,
                network_max_price: max,
                max_variance_pct,
            });
        }
        reports.sort_by(|a, b| {
            b.max_variance_pct
                .partial_cmp(&a.max_variance_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        cache::put_json(self.cache.as_ref(), &cache_key, &reports, self.ttl.price_secs).await?;
        Ok(reports)
    }

    /// Network-wide price statistics for an item, vendor-agnostic.
    /// `None` when no branch has any price in the window.
    pub async fn benchmark_stats(
        &self,
        item_id: Uuid,
    ) -> Result<Option<BenchmarkStats>, EngineError> {
        let cache_key = keys::benchmark(item_id);
        if let Some(cached) =
            cache::get_json::<Option<BenchmarkStats>>(self.cache.as_ref(), &cache_key).await?
        {
            return Ok(cached);
        }

        let snapshots = self.sourced_prices(item_id, None).await?;
        let latest = latest_per_branch(snapshots);

        let result = if latest.is_empty() {
            None
        } else {
            let prices: Vec<f64> = latest.iter().map(|s| s.price).collect();
            let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
            let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            Some(BenchmarkStats {
                item_id,
                avg_price: stats::mean(&prices),
                min_price: min,
                max_price: max,
                price_range: max - min,
                branch_count: latest.len(),
            })
        };

        cache::put_json(self.cache.as_ref(), &cache_key, &result, self.ttl.price_secs).await?;
        Ok(result)
    }

    /// Per-branch total spend over a date range, from precomputed rollups,
    /// sorted descending by total amount.
    pub async fn spending_by_branch(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        item_id: Option<Uuid>,
    ) -> Result<Vec<BranchSpending>, EngineError> {
        let cache_key = keys::branch_spending(start, end, item_id);
        if let Some(cached) =
            cache::get_json::<Vec<BranchSpending>>(self.cache.as_ref(), &cache_key).await?
        {
            return Ok(cached);
        }

        let rows = self.spend.in_range(start, end, item_id).await?;
        let mut by_branch: HashMap<Uuid, BranchSpending> = HashMap::new();
        for row in rows {
            let entry = by_branch.entry(row.branch_id).or_insert_with(|| BranchSpending {
                branch_id: row.branch_id,
                branch_name: row.branch_name.clone(),
                total_amount: 0.0,
                invoice_count: 0,
            });
            entry.total_amount += row.total_amount;
            entry.invoice_count += row.invoice_count;
        }

        let mut spending: Vec<BranchSpending> = by_branch.into_values().collect();
        spending.sort_by(|a, b| {
            b.total_amount
                .partial_cmp(&a.total_amount)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        cache::put_json(self.cache.as_ref(), &cache_key, &spending, self.ttl.spend_secs).await?;
        Ok(spending)
    }

    /// Items bought from ≥2 vendors or at ≥2 branches over the trailing
    /// consolidation window, sorted descending by total spending.
    ///
    /// A branch's vendor is recorded only when that branch used exactly one
    /// vendor in the window; `None` signals ambiguity.
    pub async fn consolidation_opportunities(
        &self,
    ) -> Result<Vec<ConsolidationOpportunity>, EngineError> {
        let cache_key = keys::consolidation();
        if let Some(cached) =
            cache::get_json::<Vec<ConsolidationOpportunity>>(self.cache.as_ref(), &cache_key)
                .await?
        {
            return Ok(cached);
        }

        let end = Utc::now().date_naive();
        let start = end - Duration::days(self.analysis.consolidation_window_days);
        let rows = self.spend.in_range(start, end, None).await?;

        struct BranchAcc {
            name: String,
            amount: f64,
            vendors: HashMap<Uuid, String>,
        }
        struct ItemAcc {
            name: String,
            branches: HashMap<Uuid, BranchAcc>,
            vendors: HashMap<Uuid, String>,
            total: f64,
        }

        let mut by_item: HashMap<Uuid, ItemAcc> = HashMap::new();
        for row in rows {
            let item = by_item.entry(row.item_id).or_insert_with(|| ItemAcc {
                name: row.item_name.clone(),
                branches: HashMap::new(),
                vendors: HashMap::new(),
                total: 0.0,
            });
            item.total += row.total_amount;
            item.vendors.insert(row.vendor_id, row.vendor_name.clone());
            let branch = item.branches.entry(row.branch_id).or_insert_with(|| BranchAcc {
                name: row.branch_name.clone(),
                amount: 0.0,
                vendors: HashMap::new(),
            });
            branch.amount += row.total_amount;
            branch.vendors.insert(row.vendor_id, row.vendor_name);
        }

        let mut opportunities: Vec<ConsolidationOpportunity> = by_item
            .into_iter()
            .filter(|(_, acc)| acc.vendors.len() >= 2 || acc.branches.len() >= 2)
            .map(|(item_id, acc)| {
                let mut branches: Vec<ConsolidationBranch> = acc
                    .branches
                    .into_iter()
                    .map(|(branch_id, branch)| {
                        let sole_vendor = if branch.vendors.len() == 1 {
                            branch.vendors.into_iter().next()
                        } else {
                            None
                        };
                        ConsolidationBranch {
                            branch_id,
                            branch_name: branch.name,
                            amount: branch.amount,
                            vendor_id: sole_vendor.as_ref().map(|(id, _)| *id),
                            vendor_name: sole_vendor.map(|(_, name)| name),
                        }
                    })
                    .collect();
                branches.sort_by(|a, b| a.branch_name.cmp(&b.branch_name));

                ConsolidationOpportunity {
                    item_id,
                    item_name: acc.name,
                    branch_count: branches.len(),
                    vendor_count: acc.vendors.len(),
                    total_spending: acc.total,
                    branches,
                }
            })
            .collect();
        opportunities.sort_by(|a, b| {
            b.total_spending
                .partial_cmp(&a.total_spending)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        info!(count = opportunities.len(), "Consolidation opportunities computed");
        cache::put_json(
            self.cache.as_ref(),
            &cache_key,
            &opportunities,
            self.ttl.consolidation_secs,
        )
        .await?;
        Ok(opportunities)
    }

    /// Two-tier price sourcing: recent snapshots first, invoice-derived
    /// prices when the window has no snapshots. An empty preferred source
    /// is degraded through, never an error.
    async fn sourced_prices(
        &self,
        item_id: Uuid,
        vendor_id: Option<Uuid>,
    ) -> Result<Vec<PriceSnapshot>, EngineError> {
        let window = self.analysis.price_window_days;
        let snapshots = self.prices.recent_snapshots(item_id, vendor_id, window).await?;
        if !snapshots.is_empty() {
            return Ok(snapshots);
        }
        info!(%item_id, ?vendor_id, "No price snapshots in window, deriving from invoices");
        self.prices.invoice_prices(item_id, vendor_id, window).await
    }
}

/// Deduplicates snapshots to one per branch, most recent date wins.
fn latest_per_branch(snapshots: Vec<PriceSnapshot>) -> Vec<PriceSnapshot> {
    let mut latest: HashMap<Uuid, PriceSnapshot> = HashMap::new();
    for snapshot in snapshots {
        match latest.get(&snapshot.branch_id) {
            Some(existing) if existing.date >= snapshot.date => {}
            _ => {
                latest.insert(snapshot.branch_id, snapshot);
            }
        }
    }
    latest.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(branch: Uuid, date: &str, price: f64) -> PriceSnapshot {
        PriceSnapshot {
            branch_id: branch,
            branch_name: "branch".into(),
            vendor_id: Uuid::new_v4(),
            vendor_name: "vendor".into(),
            price,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        }
    }

    #[test]
    fn test_latest_per_branch_keeps_most_recent() {
        let branch = Uuid::new_v4();
        let other = Uuid::new_v4();
        let snapshots = vec![
            snapshot(branch, "2025-01-01", 10.0),
            snapshot(branch, "2025-02-01", 12.0),
            snapshot(other, "2025-01-15", 9.0),
        ];
        let latest = latest_per_branch(snapshots);
        assert_eq!(latest.len(), 2);
        let kept = latest.iter().find(|s| s.branch_id == branch).unwrap();
        assert_eq!(kept.price, 12.0);
    }
}
