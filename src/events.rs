use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::AnomalyKind;

/// Notification published by the engine for downstream consumers
/// (recommendation generation, alerting). Consumers are out of scope here.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum EngineEvent {
    #[serde(rename = "PATTERN_DETECTED")]
    PatternDetected {
        item_id: Uuid,
        branch_id: Option<Uuid>,
        confidence_score: f64,
        is_new_pattern: bool,
    },
    #[serde(rename = "ANOMALY_DETECTED")]
    AnomalyDetected {
        item_id: Uuid,
        branch_id: Option<Uuid>,
        invoice_id: Uuid,
        invoice_date: NaiveDate,
        /// The larger of the quantity and amount deviations, in standard
        /// deviations.
        deviation: f64,
        kind: AnomalyKind,
    },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PatternDetected { .. } => "PATTERN_DETECTED",
            Self::AnomalyDetected { .. } => "ANOMALY_DETECTED",
        }
    }
}

/// Injected event-channel abstraction; passed to service constructors so
/// tests can substitute a recording double. Publishing is fire-and-forget.
#[async_trait]
pub trait EventChannel: Send + Sync {
    async fn publish(&self, event: EngineEvent);
}

/// Broadcast hub for fanning engine events out to in-process subscribers.
#[derive(Clone)]
pub struct BroadcastHub {
    tx: broadcast::Sender<String>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventChannel for BroadcastHub {
    async fn publish(&self, event: EngineEvent) {
        if let Ok(json) = serde_json::to_string(&event) {
            // No receivers is fine; drop the send error.
            let _ = self.tx.send(json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let hub = BroadcastHub::new();
        let mut rx = hub.subscribe();
        hub.publish(EngineEvent::PatternDetected {
            item_id: Uuid::new_v4(),
            branch_id: None,
            confidence_score: 0.9,
            is_new_pattern: true,
        })
        .await;

        let raw = rx.recv().await.unwrap();
        assert!(raw.contains("PATTERN_DETECTED"));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_does_not_panic() {
        let hub = BroadcastHub::new();
        hub.publish(EngineEvent::AnomalyDetected {
            item_id: Uuid::new_v4(),
            branch_id: None,
            invoice_id: Uuid::new_v4(),
            invoice_date: chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            deviation: 2.5,
            kind: AnomalyKind::Quantity,
        })
        .await;
    }
}
