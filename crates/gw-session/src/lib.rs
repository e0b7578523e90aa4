//! Replicated group-check sessions for Gruppenwurf.
//!
//! Every connected client holds its own [`SessionReplica`] of the one
//! active session and converges with the others purely by exchanging
//! DISPATCH, TOGGLE, RESULT and END envelopes over a shared broadcast
//! channel. There is no authoritative server: write-once results and an
//! `ended` latch make every apply idempotent, so duplicated or reordered
//! delivery cannot corrupt state.
//!
//! The [`Client`] ties a replica registry, a [`Coordinator`], a dice
//! roller and a [`Presenter`] together and drives the
//! INTRO → ACTIVE → ENDING → CLOSED lifecycle.

pub mod client;
pub mod config;
pub mod coordinator;
pub mod entrant;
pub mod error;
pub mod presenter;
pub mod protocol;
pub mod recap;
pub mod registry;
pub mod replica;
pub mod transport;
pub mod view;

pub use client::Client;
pub use config::ClientConfig;
pub use coordinator::Coordinator;
pub use entrant::{EntrantResult, EntrantState};
pub use error::{SessionError, SessionResult};
pub use presenter::{Presenter, SilentPresenter, TimedPresenter};
pub use protocol::{EndPayload, Envelope, Message, ResultPayload, TogglePayload};
pub use recap::{NullSink, RecapEntry, RecapRecord, RecapSink};
pub use registry::{Reaction, SessionRegistry};
pub use replica::{Conclusion, EndOutcome, IgnoreReason, Phase, ResultOutcome, SessionReplica};
pub use transport::{Broadcast, LocalRelay, RelayInbox, RelayLink};
pub use view::{ReplicaView, TileView};
