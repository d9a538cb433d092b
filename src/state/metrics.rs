use crate::notify::DetectionMethod;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Lifetime activity counters for the session
#[derive(Debug, Default)]
pub struct ActivityMetrics {
    position_updates: AtomicU64,
    detections: AtomicU64,
    broadcasts: AtomicU64,
    delivery_failures: AtomicU64,
    /// Alerts raised, indexed by `method_slot`
    alerts: [AtomicU64; 3],
    /// Unix millis of the latest alert; 0 until the first one
    last_alert_millis: AtomicI64,
}

fn method_slot(method: DetectionMethod) -> usize {
    match method {
        DetectionMethod::Thermal => 0,
        DetectionMethod::Audio => 1,
        DetectionMethod::Visual => 2,
    }
}

impl ActivityMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_position_update(&self) {
        self.position_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detections(&self, count: usize) {
        self.detections.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_broadcast(&self, failures: usize) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
        self.delivery_failures
            .fetch_add(failures as u64, Ordering::Relaxed);
    }

    pub fn record_alert(&self, method: DetectionMethod, at: DateTime<Utc>) {
        self.alerts[method_slot(method)].fetch_add(1, Ordering::Relaxed);
        self.last_alert_millis
            .fetch_max(at.timestamp_millis(), Ordering::Relaxed);
    }

    pub fn position_updates(&self) -> u64 {
        self.position_updates.load(Ordering::Relaxed)
    }

    pub fn detections(&self) -> u64 {
        self.detections.load(Ordering::Relaxed)
    }

    pub fn broadcasts(&self) -> u64 {
        self.broadcasts.load(Ordering::Relaxed)
    }

    pub fn delivery_failures(&self) -> u64 {
        self.delivery_failures.load(Ordering::Relaxed)
    }

    pub fn alerts(&self) -> AlertCounts {
        let count = |method| self.alerts[method_slot(method)].load(Ordering::Relaxed);
        AlertCounts {
            thermal: count(DetectionMethod::Thermal),
            audio: count(DetectionMethod::Audio),
            visual: count(DetectionMethod::Visual),
        }
    }

    pub fn last_alert_at(&self) -> Option<DateTime<Utc>> {
        match self.last_alert_millis.load(Ordering::Relaxed) {
            0 => None,
            millis => DateTime::from_timestamp_millis(millis),
        }
    }
}

/// Alerts raised per sensor modality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertCounts {
    pub thermal: u64,
    pub audio: u64,
    pub visual: u64,
}

impl AlertCounts {
    pub fn total(&self) -> u64 {
        self.thermal + self.audio + self.visual
    }
}

/// Point-in-time activity report served by `GET /api/stats`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats {
    pub agents: usize,
    pub observers: usize,
    pub targets_found: usize,
    pub position_updates: u64,
    pub detections: u64,
    pub broadcasts: u64,
    pub delivery_failures: u64,
    pub alerts: AlertCounts,
    pub last_alert_at: Option<DateTime<Utc>>,
}
