//! Error types for session replicas and the client runtime.

use thiserror::Error;

use gw_core::{CoreError, EntrantId};
use gw_mechanics::MechError;

use crate::replica::Phase;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors a local action can raise.
///
/// Conditions caused by the network (unknown sessions, stale results,
/// duplicate ends) are never errors; they surface as
/// [`IgnoreReason`](crate::replica::IgnoreReason) instead.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session is live on this client.
    #[error("no active session")]
    NoActiveSession,

    /// The action needs a privileged user.
    #[error("only a privileged user can do that")]
    NotPrivileged,

    /// The local user does not control this entrant.
    #[error("not allowed to roll for {0}")]
    NotAuthorized(EntrantId),

    /// The entrant is not part of the active session.
    #[error("{0} is not part of this session")]
    UnknownEntrant(EntrantId),

    /// The entrant already has a result.
    #[error("{0} has already rolled")]
    AlreadyRolled(EntrantId),

    /// A roll for the entrant is already in flight.
    #[error("a roll for {0} is already in progress")]
    RollPending(EntrantId),

    /// The action is not available in the current phase.
    #[error("cannot {action} during {phase}")]
    WrongPhase {
        /// What was attempted.
        action: &'static str,
        /// The phase the replica was in.
        phase: Phase,
    },

    /// The broadcast channel rejected or lost a message.
    #[error("transport error: {0}")]
    Transport(String),

    /// A frame could not be encoded or decoded.
    #[error("malformed frame: {0}")]
    Codec(#[from] serde_json::Error),

    /// Descriptor or roster error.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// Dice error.
    #[error("{0}")]
    Mech(#[from] MechError),
}
