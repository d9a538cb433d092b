use super::{AgentId, ConnectionId, Outbox};
use crate::error::SessionError;
use crate::world::Position;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeMap;

/// Handshaked agent connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSession {
    pub agent_id: AgentId,
    pub connection: ConnectionId,
}

/// Handshaked observer connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverSession {
    pub connection: ConnectionId,
}

/// Role of a connection, fixed once the handshake succeeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Agent(AgentSession),
    Observer(ObserverSession),
}

impl Session {
    pub fn connection(&self) -> ConnectionId {
        match self {
            Session::Agent(agent) => agent.connection,
            Session::Observer(observer) => observer.connection,
        }
    }
}

/// Registry entry for an active agent
#[derive(Debug)]
struct AgentEntry {
    connection: ConnectionId,
    region: Option<String>,
    position: Position,
    outbox: Outbox,
}

/// Active agents keyed by identifier, plus the observer set.
///
/// At most one connection owns an agent identifier at any time.
pub struct SessionRegistry {
    agents: DashMap<AgentId, AgentEntry>,
    observers: DashMap<ConnectionId, Outbox>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            agents: DashMap::new(),
            observers: DashMap::new(),
        }
    }

    /// Claim `agent_id` for the outbox's connection.
    ///
    /// Fails with `DuplicateIdentity` if another connection holds the id;
    /// the existing entry is left untouched.
    pub fn register_agent(
        &self,
        agent_id: AgentId,
        region: Option<String>,
        position: Position,
        outbox: Outbox,
    ) -> Result<AgentSession, SessionError> {
        match self.agents.entry(agent_id) {
            Entry::Occupied(entry) => Err(SessionError::DuplicateIdentity(entry.key().clone())),
            Entry::Vacant(entry) => {
                let session = AgentSession {
                    agent_id: entry.key().clone(),
                    connection: outbox.connection(),
                };
                entry.insert(AgentEntry {
                    connection: outbox.connection(),
                    region,
                    position,
                    outbox,
                });
                Ok(session)
            }
        }
    }

    /// Add an observer; observers have no identity constraint
    pub fn register_observer(&self, outbox: Outbox) -> ObserverSession {
        let connection = outbox.connection();
        self.observers.insert(connection, outbox);
        ObserverSession { connection }
    }

    /// Overwrite the stored position (last write wins)
    pub fn set_position(
        &self,
        session: &AgentSession,
        position: Position,
    ) -> Result<(), SessionError> {
        match self.agents.get_mut(&session.agent_id) {
            Some(mut entry) if entry.connection == session.connection => {
                entry.position = position;
                Ok(())
            }
            _ => Err(SessionError::NotRegistered),
        }
    }

    pub fn position(&self, agent_id: &str) -> Option<Position> {
        self.agents.get(agent_id).map(|e| e.position)
    }

    pub fn region_of(&self, agent_id: &str) -> Option<String> {
        self.agents.get(agent_id).and_then(|e| e.region.clone())
    }

    /// Current position of every active agent, keyed by identifier
    pub fn positions(&self) -> BTreeMap<String, Position> {
        self.agents
            .iter()
            .map(|e| (e.key().to_string(), e.position))
            .collect()
    }

    /// Outboxes of every agent and observer connection
    pub fn outboxes(&self) -> Vec<Outbox> {
        let mut outboxes: Vec<Outbox> = self.agents.iter().map(|e| e.outbox.clone()).collect();
        outboxes.extend(self.observers.iter().map(|e| e.value().clone()));
        outboxes
    }

    /// Remove the entry owned by this session. Safe to repeat.
    ///
    /// An agent entry is only removed while it still belongs to the
    /// session's connection. Returns whether anything was removed.
    pub fn unregister(&self, session: &Session) -> bool {
        match session {
            Session::Agent(agent) => self
                .agents
                .remove_if(&agent.agent_id, |_, entry| {
                    entry.connection == agent.connection
                })
                .is_some(),
            Session::Observer(observer) => self.observers.remove(&observer.connection).is_some(),
        }
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
