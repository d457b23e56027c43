mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use common::{FailingCache, FakeOrders, MemoryPatternStore, RecordingEvents};
use procsight::analysis::PatternEngine;
use procsight::cache::{keys, Cache, MemoryCache};
use procsight::config::{AnalysisConfig, CacheTtlConfig};
use procsight::events::EngineEvent;
use procsight::models::{AnomalyKind, OrderObservation, PatternOutcome, PurchasePattern};

struct Harness {
    engine: PatternEngine,
    orders: Arc<FakeOrders>,
    store: Arc<MemoryPatternStore>,
    cache: Arc<MemoryCache>,
    events: Arc<RecordingEvents>,
}

fn harness(orders: Vec<OrderObservation>) -> Harness {
    let orders = Arc::new(FakeOrders::with_orders(orders));
    let store = Arc::new(MemoryPatternStore::default());
    let cache = Arc::new(MemoryCache::new());
    let events = Arc::new(RecordingEvents::default());
    let engine = PatternEngine::new(
        orders.clone(),
        store.clone(),
        cache.clone(),
        events.clone(),
        AnalysisConfig::default(),
        CacheTtlConfig::default(),
    );
    Harness {
        engine,
        orders,
        store,
        cache,
        events,
    }
}

fn regular_orders(count: usize, interval_days: i64, quantity: f64, price: f64) -> Vec<OrderObservation> {
    let last = Utc::now().date_naive();
    (0..count)
        .map(|i| {
            let date = last - Duration::days(interval_days * (count - 1 - i) as i64);
            OrderObservation::new(Uuid::new_v4(), date, quantity, price)
        })
        .collect()
}

fn seeded_pattern(item_id: Uuid, avg_quantity: f64, std_dev_quantity: f64) -> PurchasePattern {
    let today = Utc::now().date_naive();
    PurchasePattern {
        id: Uuid::new_v4(),
        item_id,
        branch_id: None,
        avg_order_cycle_days: 30.0,
        avg_order_quantity: avg_quantity,
        avg_order_amount: 500.0,
        std_dev_quantity,
        std_dev_amount: 0.0,
        is_increasing: false,
        is_decreasing: false,
        is_seasonal: false,
        seasonality: None,
        last_order_date: Some(today),
        next_predicted_order: Some(today + Duration::days(30)),
        confidence_score: 0.9,
        based_on_invoices: 15,
        analysis_start: today - Duration::days(450),
        analysis_end: today,
        computed_at: Utc::now(),
    }
}

#[tokio::test]
async fn short_history_yields_insufficient_data_not_an_error() {
    let h = harness(regular_orders(3, 30, 100.0, 5.0));
    let outcome = h.engine.analyze_purchase_pattern(Uuid::new_v4(), None).await.unwrap();
    assert!(matches!(outcome, PatternOutcome::InsufficientData));
    assert_eq!(h.store.len(), 0);
    assert!(h.events.all().is_empty());
}

#[tokio::test]
async fn reanalysis_upserts_a_single_record() {
    let h = harness(regular_orders(10, 30, 100.0, 5.0));
    let item = Uuid::new_v4();

    let first = h.engine.analyze_purchase_pattern(item, None).await.unwrap();
    let second = h.engine.analyze_purchase_pattern(item, None).await.unwrap();

    assert_eq!(h.store.len(), 1);
    assert_eq!(h.store.upserts.load(Ordering::SeqCst), 2);

    // The record keeps its identity across recomputations.
    let first_id = first.into_pattern().unwrap().id;
    let second_id = second.into_pattern().unwrap().id;
    assert_eq!(first_id, second_id);

    let events = h.events.all();
    assert_eq!(events.len(), 2);
    match (&events[0], &events[1]) {
        (
            EngineEvent::PatternDetected { is_new_pattern: first_new, .. },
            EngineEvent::PatternDetected { is_new_pattern: second_new, .. },
        ) => {
            assert!(*first_new);
            assert!(!*second_new);
        }
        _ => panic!("expected two PATTERN_DETECTED events"),
    }
}

#[tokio::test]
async fn regular_monthly_history_produces_a_confident_pattern() {
    // 15 orders at fixed 30-day intervals, constant quantity 100.
    let h = harness(regular_orders(15, 30, 100.0, 5.0));
    let item = Uuid::new_v4();

    let pattern = h
        .engine
        .analyze_purchase_pattern(item, None)
        .await
        .unwrap()
        .into_pattern()
        .expect("expected a pattern");

    assert!((pattern.avg_order_cycle_days - 30.0).abs() < 1e-9);
    assert_eq!(pattern.std_dev_quantity, 0.0);
    assert_eq!(pattern.avg_order_quantity, 100.0);
    assert!(pattern.confidence_score > 0.8);
    assert!(!pattern.is_seasonal);
    assert!(!pattern.is_increasing);
    assert!(!pattern.is_decreasing);
    assert_eq!(pattern.based_on_invoices, 15);

    let last = pattern.last_order_date.unwrap();
    assert_eq!(pattern.next_predicted_order, Some(last + Duration::days(30)));
}

#[tokio::test]
async fn order_beyond_threshold_is_flagged_as_quantity_anomaly() {
    let item = Uuid::new_v4();
    let today = Utc::now().date_naive();
    let mut orders = regular_orders(5, 30, 100.0, 5.0);
    orders.push(OrderObservation {
        invoice_id: Uuid::new_v4(),
        date: today,
        quantity: 125.0,
        price: 4.0,
        amount: 500.0,
    });
    let h = harness(orders);
    // avg 100, stddev 10, threshold 2: quantity 125 deviates by 2.5 sigma.
    h.store.seed(seeded_pattern(item, 100.0, 10.0));

    let anomalies = h.engine.detect_anomalies(item, None).await.unwrap();
    assert_eq!(anomalies.len(), 1);
    let anomaly = &anomalies[0];
    assert_eq!(anomaly.kind, AnomalyKind::Quantity);
    assert!((anomaly.quantity_deviation - 2.5).abs() < 1e-9);
    // amount stddev is zero, so the amount deviation degrades to zero
    assert_eq!(anomaly.amount_deviation, 0.0);

    assert_eq!(h.events.count_named("ANOMALY_DETECTED"), 1);
    match &h.events.all()[0] {
        EngineEvent::AnomalyDetected { deviation, .. } => {
            assert!((deviation - 2.5).abs() < 1e-9);
        }
        other => panic!("expected ANOMALY_DETECTED, got {other:?}"),
    }
}

#[tokio::test]
async fn anomaly_list_is_served_from_cache_on_repeat() {
    let item = Uuid::new_v4();
    let h = harness(regular_orders(10, 30, 100.0, 5.0));
    h.store.seed(seeded_pattern(item, 100.0, 10.0));

    h.engine.detect_anomalies(item, None).await.unwrap();
    let calls_after_first = h.orders.calls.load(Ordering::SeqCst);
    h.engine.detect_anomalies(item, None).await.unwrap();
    assert_eq!(h.orders.calls.load(Ordering::SeqCst), calls_after_first);
}

#[tokio::test]
async fn detect_anomalies_without_enough_history_is_empty() {
    let h = harness(regular_orders(2, 30, 100.0, 5.0));
    let anomalies = h.engine.detect_anomalies(Uuid::new_v4(), None).await.unwrap();
    assert!(anomalies.is_empty());
    assert_eq!(h.events.count_named("ANOMALY_DETECTED"), 0);
}

#[tokio::test]
async fn predict_next_order_computes_the_pattern_lazily() {
    let h = harness(regular_orders(10, 30, 100.0, 5.0));
    let item = Uuid::new_v4();

    let predicted = h.engine.predict_next_order(item, None).await.unwrap();
    let expected = Utc::now().date_naive() + Duration::days(30);
    assert_eq!(predicted, Some(expected));
    // The lazy analysis persisted a pattern.
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn predict_next_order_is_absent_on_short_history() {
    let h = harness(regular_orders(3, 30, 100.0, 5.0));
    let predicted = h.engine.predict_next_order(Uuid::new_v4(), None).await.unwrap();
    assert_eq!(predicted, None);
    assert_eq!(h.store.len(), 0);
}

#[tokio::test]
async fn invalidate_item_drops_cached_results() {
    let h = harness(regular_orders(10, 30, 100.0, 5.0));
    let item = Uuid::new_v4();

    h.engine.analyze_purchase_pattern(item, None).await.unwrap();
    let key = keys::pattern(item, None);
    assert!(h.cache.get(&key).await.unwrap().is_some());

    let removed = h.engine.invalidate_item(item).await.unwrap();
    assert!(removed >= 1);
    assert!(h.cache.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn cache_faults_propagate_as_infrastructure_errors() {
    let orders = Arc::new(FakeOrders::with_orders(regular_orders(10, 30, 100.0, 5.0)));
    let store = Arc::new(MemoryPatternStore::default());
    let events = Arc::new(RecordingEvents::default());
    let engine = PatternEngine::new(
        orders,
        store,
        Arc::new(FailingCache),
        events.clone(),
        AnalysisConfig::default(),
        CacheTtlConfig::default(),
    );

    let err = engine.detect_anomalies(Uuid::new_v4(), None).await.unwrap_err();
    assert_eq!(err.operation(), "cache.get");
    // The fault surfaced before any analysis, so nothing was published.
    assert!(events.all().is_empty());
}

#[tokio::test]
async fn confidence_stays_in_unit_interval_for_extreme_histories() {
    for count in [5usize, 200] {
        let h = harness(regular_orders(count, 1, 1_000_000.0, 0.01));
        let outcome = h.engine.analyze_purchase_pattern(Uuid::new_v4(), None).await.unwrap();
        let pattern = outcome.into_pattern().expect("expected a pattern");
        assert!((0.0..=1.0).contains(&pattern.confidence_score));
    }
}

#[tokio::test]
async fn erratic_dates_still_yield_a_bounded_confidence() {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let gaps = [0i64, 1, 90, 91, 92, 300, 301];
    let orders: Vec<OrderObservation> = gaps
        .iter()
        .map(|g| OrderObservation::new(Uuid::new_v4(), base + Duration::days(*g), 10.0, 2.0))
        .collect();
    let h = harness(orders);
    let pattern = h
        .engine
        .analyze_purchase_pattern(Uuid::new_v4(), None)
        .await
        .unwrap()
        .into_pattern()
        .expect("expected a pattern");
    assert!((0.0..=1.0).contains(&pattern.confidence_score));
}
