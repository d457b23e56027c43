#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use procsight::cache::Cache;
use procsight::errors::EngineError;
use procsight::events::{EngineEvent, EventChannel};
use procsight::models::{OrderObservation, PriceSnapshot, PurchasePattern, SpendAggregate};
use procsight::providers::{OrderHistory, PatternStore, PriceSource, SpendAggregates};

/// Vec-backed order history; returns the same observations for every key.
#[derive(Default)]
pub struct FakeOrders {
    pub orders: Vec<OrderObservation>,
    pub keys: Vec<(Uuid, Option<Uuid>)>,
    pub calls: AtomicUsize,
}

impl FakeOrders {
    pub fn with_orders(orders: Vec<OrderObservation>) -> Self {
        Self {
            orders,
            ..Default::default()
        }
    }
}

#[async_trait]
impl OrderHistory for FakeOrders {
    async fn finalized_orders(
        &self,
        _item_id: Uuid,
        _branch_id: Option<Uuid>,
    ) -> Result<Vec<OrderObservation>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.orders.clone())
    }

    async fn active_pattern_keys(
        &self,
        _window_days: i64,
    ) -> Result<Vec<(Uuid, Option<Uuid>)>, EngineError> {
        Ok(self.keys.clone())
    }
}

#[derive(Default)]
pub struct FakePrices {
    pub snapshots: Vec<PriceSnapshot>,
    pub invoice_derived: Vec<PriceSnapshot>,
    pub snapshot_calls: AtomicUsize,
    pub fallback_calls: AtomicUsize,
}

fn filter_vendor(rows: &[PriceSnapshot], vendor_id: Option<Uuid>) -> Vec<PriceSnapshot> {
    rows.iter()
        .filter(|s| vendor_id.is_none() || vendor_id == Some(s.vendor_id))
        .cloned()
        .collect()
}

#[async_trait]
impl PriceSource for FakePrices {
    async fn recent_snapshots(
        &self,
        _item_id: Uuid,
        vendor_id: Option<Uuid>,
        _window_days: i64,
    ) -> Result<Vec<PriceSnapshot>, EngineError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        Ok(filter_vendor(&self.snapshots, vendor_id))
    }

    async fn invoice_prices(
        &self,
        _item_id: Uuid,
        vendor_id: Option<Uuid>,
        _window_days: i64,
    ) -> Result<Vec<PriceSnapshot>, EngineError> {
        self.fallback_calls.fetch_add(1, Ordering::SeqCst);
        Ok(filter_vendor(&self.invoice_derived, vendor_id))
    }
}

#[derive(Default)]
pub struct FakeSpend {
    pub rows: Vec<SpendAggregate>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl SpendAggregates for FakeSpend {
    async fn in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        item_id: Option<Uuid>,
    ) -> Result<Vec<SpendAggregate>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .filter(|r| item_id.is_none() || item_id == Some(r.item_id))
            .cloned()
            .collect())
    }
}

/// Map-backed pattern store keyed by the natural key, mirroring the
/// last-write-wins upsert of the Postgres implementation.
#[derive(Default)]
pub struct MemoryPatternStore {
    patterns: Mutex<HashMap<(Uuid, Option<Uuid>), PurchasePattern>>,
    pub upserts: AtomicUsize,
}

impl MemoryPatternStore {
    pub fn len(&self) -> usize {
        self.patterns.lock().unwrap().len()
    }

    pub fn seed(&self, pattern: PurchasePattern) {
        self.patterns
            .lock()
            .unwrap()
            .insert((pattern.item_id, pattern.branch_id), pattern);
    }
}

#[async_trait]
impl PatternStore for MemoryPatternStore {
    async fn find(
        &self,
        item_id: Uuid,
        branch_id: Option<Uuid>,
    ) -> Result<Option<PurchasePattern>, EngineError> {
        Ok(self.patterns.lock().unwrap().get(&(item_id, branch_id)).cloned())
    }

    async fn upsert(&self, pattern: &PurchasePattern) -> Result<(), EngineError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.patterns
            .lock()
            .unwrap()
            .insert((pattern.item_id, pattern.branch_id), pattern.clone());
        Ok(())
    }
}

/// Cache backend whose every operation fails, for fault-propagation tests.
#[derive(Default)]
pub struct FailingCache;

fn cache_down(operation: &'static str) -> EngineError {
    EngineError::infrastructure(
        operation,
        "cache unreachable",
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
    )
}

#[async_trait]
impl Cache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, EngineError> {
        Err(cache_down("cache.get"))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<(), EngineError> {
        Err(cache_down("cache.set"))
    }

    async fn del(&self, _key: &str) -> Result<(), EngineError> {
        Err(cache_down("cache.del"))
    }

    async fn invalidate_prefix(&self, _prefix: &str) -> Result<u64, EngineError> {
        Err(cache_down("cache.invalidate_prefix"))
    }

    async fn ping(&self) -> bool {
        false
    }
}

/// Records every published event for later assertions.
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingEvents {
    pub fn all(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_named(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }
}

#[async_trait]
impl EventChannel for RecordingEvents {
    async fn publish(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
