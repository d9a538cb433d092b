//! Seams to the classification pipeline and the alerting system.
//!
//! The server does not run models or send alerts itself. For every newly
//! found target it asks a [`Classifier`] for a label and confidence, and
//! when the result is a confident positive it hands a [`DetectionEvent`]
//! to a [`Notifier`], which owns delivery.

use crate::session::AgentId;
use crate::world::{Position, Target};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Label the pipeline reports for a positive detection
pub const POSITIVE_LABEL: &str = "Human Detected";

/// Sensor modality that produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    Thermal,
    Audio,
    Visual,
}

impl DetectionMethod {
    pub const ALL: [DetectionMethod; 3] = [
        DetectionMethod::Thermal,
        DetectionMethod::Audio,
        DetectionMethod::Visual,
    ];
}

/// Opaque classifier output
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f64,
    pub method: DetectionMethod,
}

impl Classification {
    pub fn is_positive(&self) -> bool {
        self.label == POSITIVE_LABEL
    }
}

/// Classification collaborator
pub trait Classifier: Send + Sync {
    fn classify(&self, agent_id: &AgentId, target: &Target) -> Classification;
}

/// Stand-in for the ML pipeline: every in-range target is a confident
/// positive, reported through a randomly chosen sensor.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedClassifier;

impl Classifier for SimulatedClassifier {
    fn classify(&self, _agent_id: &AgentId, _target: &Target) -> Classification {
        let method = DetectionMethod::ALL
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(DetectionMethod::Visual);
        Classification {
            label: POSITIVE_LABEL.to_string(),
            confidence: 1.0,
            method,
        }
    }
}

/// Structured event handed to the alerting system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionEvent {
    pub method: DetectionMethod,
    pub position: Position,
    pub agent_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Notification collaborator
pub trait Notifier: Send + Sync {
    fn notify(&self, event: DetectionEvent);
}

/// Notifier that forwards events over an in-process channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<DetectionEvent>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DetectionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: DetectionEvent) {
        if self.tx.send(event).is_err() {
            warn!("Detection alert channel closed, event dropped");
        }
    }
}

/// Drain detection events and log each one.
///
/// Runs until every sender is dropped.
pub async fn run_detection_alerts(mut rx: mpsc::UnboundedReceiver<DetectionEvent>) {
    while let Some(event) = rx.recv().await {
        info!(
            agent_id = %event.agent_id,
            method = ?event.method,
            position = ?event.position.0,
            timestamp = %event.timestamp,
            "Detection alert raised"
        );
    }
    info!("Detection alert channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Target {
        Target {
            id: "D1_1".to_string(),
            name: "Target_1".to_string(),
            position: Position::new(-200.0, 0.0, -200.0),
            region: "D1".to_string(),
            found: true,
        }
    }

    #[test]
    fn test_simulated_classifier_is_confident_positive() {
        let classifier = SimulatedClassifier;
        for _ in 0..20 {
            let result = classifier.classify(&AgentId::from("D1"), &target());
            assert!(result.is_positive());
            assert_eq!(result.confidence, 1.0);
            assert!(DetectionMethod::ALL.contains(&result.method));
        }
    }

    #[test]
    fn test_event_wire_format() {
        let event = DetectionEvent {
            method: DetectionMethod::Thermal,
            position: Position::new(1.0, 0.0, 2.0),
            agent_id: "D1".to_string(),
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["method"], "thermal");
        assert_eq!(value["agentId"], "D1");
        assert_eq!(value["position"], serde_json::json!([1.0, 0.0, 2.0]));
    }

    #[tokio::test]
    async fn test_channel_notifier_forwards_events() {
        let (notifier, mut rx) = ChannelNotifier::new();
        let event = DetectionEvent {
            method: DetectionMethod::Audio,
            position: Position::new(0.0, 0.0, 0.0),
            agent_id: "D2".to_string(),
            timestamp: Utc::now(),
        };

        notifier.notify(event.clone());
        assert_eq!(rx.recv().await, Some(event));
    }

    #[tokio::test]
    async fn test_alert_drain_stops_when_senders_drop() {
        let (notifier, rx) = ChannelNotifier::new();
        let handle = tokio::spawn(run_detection_alerts(rx));

        notifier.notify(DetectionEvent {
            method: DetectionMethod::Visual,
            position: Position::new(0.0, 0.0, 0.0),
            agent_id: "D3".to_string(),
            timestamp: Utc::now(),
        });
        drop(notifier);

        handle.await.unwrap();
    }
}
