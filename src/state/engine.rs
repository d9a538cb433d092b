use crate::config::SearchGridConfig;
use crate::detection::{DetectionEngine, DEFAULT_FOV_RADIUS};
use crate::error::SessionError;
use crate::notify::{Classifier, DetectionEvent, Notifier, SimulatedClassifier};
use crate::protocol::{Role, ServerMessage, WorldState};
use crate::session::{AgentId, AgentSession, Outbox, Session, SessionRegistry};
use crate::state::metrics::{ActivityMetrics, ActivityStats};
use crate::world::{Position, Target, WorldModel};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Tunables for the swarm state, usually taken from config
#[derive(Debug, Clone, Copy)]
pub struct SwarmSettings {
    pub fov_radius: f64,
    pub min_confidence: f64,
    /// Altitude agents start at when they register
    pub default_altitude: f64,
}

impl SwarmSettings {
    pub fn from_config(config: &SearchGridConfig) -> Self {
        Self {
            fov_radius: config.detection.fov_radius,
            min_confidence: config.detection.min_confidence,
            default_altitude: config.world.default_altitude,
        }
    }
}

impl Default for SwarmSettings {
    fn default() -> Self {
        Self {
            fov_radius: DEFAULT_FOV_RADIUS,
            min_confidence: 0.5,
            default_altitude: 40.0,
        }
    }
}

/// Outcome of a successful handshake
#[derive(Debug)]
pub struct Registration {
    pub session: Session,
    /// Init payload for agents, world snapshot for observers
    pub reply: ServerMessage,
}

/// Shared session state: world, connected clients, detection.
///
/// All mutation goes through these methods; the registry and target
/// flags are never handed out.
pub struct SwarmState {
    world: WorldModel,
    registry: SessionRegistry,
    detection: DetectionEngine,
    classifier: Arc<dyn Classifier>,
    notifier: Arc<dyn Notifier>,
    min_confidence: f64,
    default_altitude: f64,
    pub metrics: ActivityMetrics,
}

impl SwarmState {
    pub fn new(world: WorldModel, settings: SwarmSettings, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            world,
            registry: SessionRegistry::new(),
            detection: DetectionEngine::new(settings.fov_radius),
            classifier: Arc::new(SimulatedClassifier),
            notifier,
            min_confidence: settings.min_confidence,
            default_altitude: settings.default_altitude,
            metrics: ActivityMetrics::new(),
        }
    }

    /// Replace the simulated classifier
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn world(&self) -> &WorldModel {
        &self.world
    }

    /// Handshake a connection.
    ///
    /// Observers always succeed and get a snapshot. Agents claim their
    /// identifier, start at their region's centre, and get the init payload.
    pub fn register(
        &self,
        role: Role,
        declared_id: Option<String>,
        outbox: Outbox,
    ) -> Result<Registration, SessionError> {
        match role {
            Role::Observer => {
                let session = self.registry.register_observer(outbox);
                info!(connection = %session.connection, "Observer connected");
                Ok(Registration {
                    session: Session::Observer(session),
                    reply: ServerMessage::WorldState(self.snapshot()),
                })
            }
            Role::Agent => {
                let agent_id = declared_id
                    .filter(|id| !id.trim().is_empty())
                    .map(AgentId::from)
                    .ok_or_else(|| {
                        SessionError::MalformedMessage(
                            "agent handshake requires an agentId".to_string(),
                        )
                    })?;

                let region = self.world.region(agent_id.as_str());
                let start = match region {
                    Some(region) => region.center(self.default_altitude),
                    None => Position::new(0.0, self.default_altitude, 0.0),
                };

                let session = self.registry.register_agent(
                    agent_id.clone(),
                    region.map(|r| r.id.clone()),
                    start,
                    outbox,
                )?;

                let targets = self.world.region_targets(agent_id.as_str());
                info!(
                    agent_id = %agent_id,
                    connection = %session.connection,
                    region = region.is_some(),
                    targets = targets.len(),
                    "Agent connected"
                );

                Ok(Registration {
                    session: Session::Agent(session),
                    reply: ServerMessage::Init {
                        agent_id: agent_id.to_string(),
                        region: region.cloned(),
                        targets,
                        world_size: self.world.world_size(),
                    },
                })
            }
        }
    }

    /// Store a new position for the agent and run a detection pass.
    ///
    /// Returns the targets found by this update (possibly empty).
    pub fn update_position(
        &self,
        session: &AgentSession,
        position: Position,
    ) -> Result<Vec<Target>, SessionError> {
        if !position.is_finite() {
            return Err(SessionError::MalformedMessage(
                "position must contain three finite numbers".to_string(),
            ));
        }

        self.registry.set_position(session, position)?;
        self.metrics.record_position_update();

        let found = self.detect(&session.agent_id, &position);
        if !found.is_empty() {
            self.metrics.record_detections(found.len());
            for target in &found {
                info!(
                    agent_id = %session.agent_id,
                    target_id = %target.id,
                    target = %target.name,
                    "Target found"
                );
                self.raise_detection_event(&session.agent_id, target);
            }
        }

        Ok(found)
    }

    /// Apply an update, then fan the new positions out to every connection
    pub fn apply_position_update(
        &self,
        session: &AgentSession,
        position: Position,
    ) -> Result<Vec<Target>, SessionError> {
        let found = self.update_position(session, position)?;
        self.broadcast_positions();
        Ok(found)
    }

    /// Mark and return unfound targets of the agent's own region within view
    pub fn detect(&self, agent_id: &AgentId, position: &Position) -> Vec<Target> {
        match self.registry.region_of(agent_id.as_str()) {
            Some(region) => self.detection.detect(&self.world, &region, position),
            None => Vec::new(),
        }
    }

    /// Queue the current positions on every agent and observer connection.
    ///
    /// Each delivery is independent; a failed one is logged and skipped.
    /// Returns how many connections the frame was queued on.
    pub fn broadcast_positions(&self) -> usize {
        let message = ServerMessage::Positions {
            agents: self.registry.positions(),
            timestamp: Utc::now(),
        };
        let frame = match message.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "Failed to encode positions broadcast");
                return 0;
            }
        };

        let mut delivered = 0;
        let mut failed = 0;
        for outbox in self.registry.outboxes() {
            match outbox.deliver(&frame) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    debug!(
                        connection = %outbox.connection(),
                        error = %e,
                        "Skipped positions delivery"
                    );
                }
            }
        }

        self.metrics.record_broadcast(failed);
        delivered
    }

    /// Full world view: positions, targets with live flags, regions, size
    pub fn snapshot(&self) -> WorldState {
        WorldState {
            agents: self.registry.positions(),
            targets: self.world.targets(),
            regions: self.world.regions().to_vec(),
            world_size: self.world.world_size(),
            timestamp: Utc::now(),
        }
    }

    /// Drop whatever the connection registered. Safe to call repeatedly.
    pub fn disconnect(&self, session: Option<&Session>) {
        let Some(session) = session else {
            debug!("Connection closed before handshake");
            return;
        };

        if self.registry.unregister(session) {
            match session {
                Session::Agent(agent) => {
                    info!(agent_id = %agent.agent_id, "Agent disconnected")
                }
                Session::Observer(observer) => {
                    info!(connection = %observer.connection, "Observer disconnected")
                }
            }
        }
    }

    pub fn position(&self, agent_id: &str) -> Option<Position> {
        self.registry.position(agent_id)
    }

    pub fn stats(&self) -> ActivityStats {
        ActivityStats {
            agents: self.registry.agent_count(),
            observers: self.registry.observer_count(),
            targets_found: self.world.found_count(),
            position_updates: self.metrics.position_updates(),
            detections: self.metrics.detections(),
            broadcasts: self.metrics.broadcasts(),
            delivery_failures: self.metrics.delivery_failures(),
            alerts: self.metrics.alerts(),
            last_alert_at: self.metrics.last_alert_at(),
        }
    }

    fn raise_detection_event(&self, agent_id: &AgentId, target: &Target) {
        let classification = self.classifier.classify(agent_id, target);
        if !classification.is_positive() || classification.confidence < self.min_confidence {
            debug!(
                agent_id = %agent_id,
                target_id = %target.id,
                label = %classification.label,
                confidence = classification.confidence,
                "Classification below alert threshold"
            );
            return;
        }

        let timestamp = Utc::now();
        self.metrics.record_alert(classification.method, timestamp);
        self.notifier.notify(DetectionEvent {
            method: classification.method,
            position: target.position,
            agent_id: agent_id.to_string(),
            timestamp,
        });
    }
}
