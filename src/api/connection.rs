use crate::error::SessionError;
use crate::protocol::{ClientMessage, Role, ServerMessage};
use crate::session::{ConnectionId, Frame, Outbox, Session};
use crate::state::SwarmState;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// What the read loop does after handling a message
enum Flow {
    Continue,
    Close,
}

/// Drives a single WebSocket connection from handshake to cleanup
pub struct ConnectionHandler {
    id: ConnectionId,
    swarm: Arc<SwarmState>,
    outbox: Outbox,
    /// Set once the handshake succeeds; fixed afterwards
    session: Option<Session>,
}

impl ConnectionHandler {
    /// Create a handler and the receiving end of its outbound queue
    pub fn new(swarm: Arc<SwarmState>, outbox_capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let id = ConnectionId::new();
        let (outbox, outbound_rx) = Outbox::channel(id, outbox_capacity);
        (
            Self {
                id,
                swarm,
                outbox,
                session: None,
            },
            outbound_rx,
        )
    }

    /// Handle WebSocket connection lifecycle
    pub async fn handle(mut self, mut socket: WebSocket, mut outbound_rx: mpsc::Receiver<Frame>) {
        info!(connection = %self.id, "WebSocket connection established");

        loop {
            tokio::select! {
                // Inbound client messages, strictly in arrival order
                inbound = socket.recv() => {
                    match inbound {
                        Some(Ok(Message::Text(text))) => {
                            match self.handle_text(&mut socket, &text).await {
                                Ok(Flow::Continue) => {}
                                Ok(Flow::Close) => break,
                                Err(SessionError::TransportClosed(reason)) => {
                                    debug!(connection = %self.id, reason = %reason, "Transport closed");
                                    break;
                                }
                                Err(e) => {
                                    debug!(connection = %self.id, error = %e, "Dropped client message");
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!(connection = %self.id, "WebSocket client disconnected");
                            break;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = socket.send(Message::Pong(data)).await {
                                debug!(connection = %self.id, error = %e, "Failed to send pong");
                                break;
                            }
                        }
                        Some(Ok(_)) => {
                            // Ignore binary, pong messages
                        }
                        Some(Err(e)) => {
                            warn!(connection = %self.id, error = %e, "WebSocket error");
                            break;
                        }
                    }
                }

                // Broadcast frames queued by other connections' updates
                Some(frame) = outbound_rx.recv() => {
                    if let Err(e) = socket.send(Message::Text(frame.to_string())).await {
                        debug!(connection = %self.id, error = %e, "Failed to send queued frame");
                        break;
                    }
                }
            }
        }

        self.swarm.disconnect(self.session.as_ref());
        info!(connection = %self.id, "WebSocket connection closed");
    }

    async fn handle_text(
        &mut self,
        socket: &mut WebSocket,
        text: &str,
    ) -> Result<Flow, SessionError> {
        match ClientMessage::parse(text)? {
            ClientMessage::Register { role, agent_id } => {
                self.handle_register(socket, role, agent_id).await
            }
            ClientMessage::Pos { pos } => {
                let Some(Session::Agent(agent)) = &self.session else {
                    return Err(SessionError::NotRegistered);
                };
                let found = self.swarm.apply_position_update(agent, pos)?;
                if !found.is_empty() {
                    send(socket, &ServerMessage::TargetsDetected { targets: found }).await?;
                }
                Ok(Flow::Continue)
            }
            ClientMessage::RequestUpdate => {
                match &self.session {
                    Some(Session::Observer(_)) => {
                        send(socket, &ServerMessage::WorldState(self.swarm.snapshot())).await?;
                    }
                    _ => debug!(connection = %self.id, "Ignoring refresh from non-observer"),
                }
                Ok(Flow::Continue)
            }
            ClientMessage::Unknown => Err(SessionError::UnknownMessageType),
        }
    }

    async fn handle_register(
        &mut self,
        socket: &mut WebSocket,
        role: Role,
        agent_id: Option<String>,
    ) -> Result<Flow, SessionError> {
        if self.session.is_some() {
            debug!(connection = %self.id, "Ignoring repeated handshake");
            return Ok(Flow::Continue);
        }

        match self.swarm.register(role, agent_id, self.outbox.clone()) {
            Ok(registration) => {
                self.session = Some(registration.session);
                send(socket, &registration.reply).await?;
                Ok(Flow::Continue)
            }
            Err(SessionError::DuplicateIdentity(agent_id)) => {
                warn!(
                    connection = %self.id,
                    agent_id = %agent_id,
                    "Rejected duplicate agent registration"
                );
                let reason = SessionError::DuplicateIdentity(agent_id).to_string();
                let close = Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: reason.into(),
                }));
                // The connection is dropped either way
                let _ = socket.send(close).await;
                Ok(Flow::Close)
            }
            Err(e) => Err(e),
        }
    }
}

/// Send one message directly on the socket
async fn send(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), SessionError> {
    let frame = match message.to_frame() {
        Ok(frame) => frame,
        Err(e) => {
            error!(error = %e, "Failed to encode server message");
            return Err(e);
        }
    };
    socket
        .send(Message::Text(frame.to_string()))
        .await
        .map_err(|e| SessionError::TransportClosed(e.to_string()))
}
