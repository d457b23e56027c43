use std::sync::Arc;

use tokio::time::{interval, Duration};
use tracing::{error, info};

use crate::analysis::{CrossLocationService, PatternEngine};
use crate::config::JobsConfig;
use crate::providers::OrderHistory;

/// Spawns the periodic refresh sweeps.
///
/// The pattern sweep keeps persisted patterns warm without caller traffic:
/// every tick, every `(item, branch)` pair with recent order activity gets
/// its pattern recomputed. The consolidation sweep pre-populates the
/// consolidation-opportunity cache. Failures on one key are logged and the
/// sweep continues.
pub fn spawn_background_jobs(
    engine: Arc<PatternEngine>,
    cross_location: Arc<CrossLocationService>,
    orders: Arc<dyn OrderHistory>,
    config: JobsConfig,
    active_window_days: i64,
) {
    let pattern_interval = config.pattern_refresh_interval_secs;
    let consolidation_interval = config.consolidation_refresh_interval_secs;

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(pattern_interval));
        loop {
            ticker.tick().await;
            info!("Running pattern refresh job");
            if let Err(e) = refresh_patterns(&engine, orders.as_ref(), active_window_days).await {
                error!("Pattern refresh job failed: {e}");
            }
        }
    });

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(consolidation_interval));
        loop {
            ticker.tick().await;
            info!("Running consolidation refresh job");
            match cross_location.consolidation_opportunities().await {
                Ok(opportunities) => {
                    info!(count = opportunities.len(), "Consolidation cache refreshed");
                }
                Err(e) => error!("Consolidation refresh job failed: {e}"),
            }
        }
    });

    info!("Background jobs started");
}

async fn refresh_patterns(
    engine: &PatternEngine,
    orders: &dyn OrderHistory,
    active_window_days: i64,
) -> anyhow::Result<()> {
    let keys = orders.active_pattern_keys(active_window_days).await?;
    let total = keys.len();
    let mut refreshed = 0usize;

    for (item_id, branch_id) in keys {
        match engine.analyze_purchase_pattern(item_id, branch_id).await {
            Ok(_) => refreshed += 1,
            Err(e) => {
                error!(%item_id, ?branch_id, "Pattern refresh failed for key: {e}");
            }
        }
    }

    info!(total, refreshed, "Pattern refresh sweep finished");
    Ok(())
}
