use super::ConnectionId;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Serialized server message, shared between every recipient of a broadcast
pub type Frame = Arc<str>;

/// Why a frame could not be queued for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("outbound queue is full")]
    Full,
    #[error("connection is closed")]
    Closed,
}

/// Bounded outbound queue feeding one connection's writer.
///
/// Delivery never waits: a slow or dead connection fails its own
/// delivery and leaves every other queue untouched.
#[derive(Debug, Clone)]
pub struct Outbox {
    connection: ConnectionId,
    tx: mpsc::Sender<Frame>,
}

impl Outbox {
    /// Create an outbox and the receiver its connection task drains
    pub fn channel(connection: ConnectionId, capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { connection, tx }, rx)
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Queue a frame without waiting
    pub fn deliver(&self, frame: &Frame) -> Result<(), DeliveryError> {
        self.tx.try_send(Arc::clone(frame)).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}
