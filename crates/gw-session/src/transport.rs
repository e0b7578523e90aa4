//! The broadcast channel seam and an in-process relay.
//!
//! [`LocalRelay`] fans JSON frames out over a `tokio::sync::broadcast`
//! channel to every connected client, including the sender. The channel
//! gives a single global order, which is stronger than the per-sender
//! order the protocol relies on. Duplicate mode sends every frame twice
//! to exercise idempotent apply.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{trace, warn};

use crate::error::{SessionError, SessionResult};
use crate::protocol::Envelope;

/// Frames buffered per receiver before the slowest one starts lagging.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Something that can put an envelope on the shared channel.
pub trait Broadcast: Send {
    /// Send to every client, the sender included.
    fn send(&self, envelope: &Envelope) -> SessionResult<()>;
}

/// An in-process broadcast hub.
#[derive(Debug, Clone)]
pub struct LocalRelay {
    tx: broadcast::Sender<String>,
    duplicate: bool,
}

impl Default for LocalRelay {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LocalRelay {
    /// A relay buffering `capacity` frames per receiver.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            duplicate: false,
        }
    }

    /// Deliver every frame twice.
    pub fn with_duplicates(mut self) -> Self {
        self.duplicate = true;
        self
    }

    /// Attach a client: a sending half and its own inbox.
    pub fn connect(&self) -> (RelayLink, RelayInbox) {
        let link = RelayLink {
            tx: self.tx.clone(),
            duplicate: self.duplicate,
        };
        let inbox = RelayInbox {
            rx: self.tx.subscribe(),
        };
        (link, inbox)
    }

    /// Clients currently attached.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Sending half handed to a client.
#[derive(Debug, Clone)]
pub struct RelayLink {
    tx: broadcast::Sender<String>,
    duplicate: bool,
}

impl Broadcast for RelayLink {
    fn send(&self, envelope: &Envelope) -> SessionResult<()> {
        let frame = envelope.encode()?;
        trace!(session = %envelope.session_id, kind = envelope.message.kind(), "frame out");
        let copies = if self.duplicate { 2 } else { 1 };
        for _ in 0..copies {
            self.tx
                .send(frame.clone())
                .map_err(|_| SessionError::Transport("no clients connected".to_string()))?;
        }
        Ok(())
    }
}

/// Receiving half handed to a client.
#[derive(Debug)]
pub struct RelayInbox {
    rx: broadcast::Receiver<String>,
}

impl RelayInbox {
    /// Wait for the next frame. `None` once every sender is gone.
    pub async fn next_frame(&mut self) -> Option<String> {
        loop {
            match self.rx.recv().await {
                Ok(frame) => return Some(frame),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "relay inbox lagged, frames dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Drain every frame already buffered without waiting.
    pub fn poll(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(frame) => frames.push(frame),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "relay inbox lagged, frames dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return frames,
            }
        }
    }
}
