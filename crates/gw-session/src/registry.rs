//! Routes incoming envelopes to the one live replica on a client.
//!
//! The registry owns at most one replica at a time. A DISPATCH for a new
//! session replaces whatever is live, regardless of phase; every other
//! message is matched against the live replica's session ID and silently
//! dropped on mismatch. Session IDs that have already been live here are
//! remembered so a late duplicate DISPATCH cannot resurrect a finished
//! session.

use std::collections::HashSet;

use tracing::{debug, info};

use gw_core::{EntrantDirectory, EntrantId, SessionId};

use crate::protocol::{Envelope, Message};
use crate::replica::{Conclusion, EndOutcome, IgnoreReason, ResultOutcome, SessionReplica};

/// What routing an envelope did to local state.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// A new replica was created in INTRO.
    Started {
        /// The new session.
        session_id: SessionId,
        /// The session it replaced, if one was live.
        preempted: Option<SessionId>,
    },
    /// A tile's advisory rolling flag changed.
    Toggled {
        /// The entrant.
        entrant: EntrantId,
        /// New flag value.
        rolling: bool,
    },
    /// A result was recorded.
    ResultApplied {
        /// The entrant.
        entrant: EntrantId,
        /// This result completed the roster.
        completed: bool,
    },
    /// The live replica ended.
    Ended {
        /// The session that ended.
        session_id: SessionId,
        /// How it ended.
        conclusion: Conclusion,
    },
    /// Nothing changed.
    Ignored(IgnoreReason),
}

/// The client-wide holder of the active session.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    active: Option<SessionReplica>,
    retired: HashSet<SessionId>,
}

impl SessionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The live replica, if any.
    pub fn active(&self) -> Option<&SessionReplica> {
        self.active.as_ref()
    }

    /// The live replica if it belongs to `session_id`.
    pub fn get(&self, session_id: SessionId) -> Option<&SessionReplica> {
        self.active
            .as_ref()
            .filter(|r| r.session_id() == session_id)
    }

    /// Mutable access to the live replica if it belongs to `session_id`.
    pub fn get_mut(&mut self, session_id: SessionId) -> Option<&mut SessionReplica> {
        self.active
            .as_mut()
            .filter(|r| r.session_id() == session_id)
    }

    /// Whether `session_id` was live here at some point.
    pub fn has_seen(&self, session_id: SessionId) -> bool {
        self.retired.contains(&session_id)
            || self.active.as_ref().is_some_and(|r| r.session_id() == session_id)
    }

    /// Apply one envelope.
    pub fn receive(&mut self, envelope: Envelope, directory: &dyn EntrantDirectory) -> Reaction {
        let session_id = envelope.session_id;
        let kind = envelope.message.kind();
        let reaction = match envelope.message {
            Message::Dispatch(descriptor) => {
                if descriptor.session_id != session_id || descriptor.validate().is_err() {
                    Reaction::Ignored(IgnoreReason::InvalidDispatch)
                } else if self.has_seen(session_id) {
                    Reaction::Ignored(IgnoreReason::DuplicateDispatch)
                } else {
                    let preempted = self.discard();
                    if let Some(old) = preempted {
                        info!(session = %session_id, preempted = %old, "session preempted");
                    }
                    self.active = Some(SessionReplica::new(descriptor, directory));
                    info!(session = %session_id, "session started");
                    Reaction::Started {
                        session_id,
                        preempted,
                    }
                }
            }
            Message::Toggle(toggle) => match self.get_mut(session_id) {
                None => Reaction::Ignored(IgnoreReason::UnknownSession),
                Some(replica) => match replica.apply_toggle(&toggle) {
                    Ok(()) => Reaction::Toggled {
                        entrant: toggle.entrant_id,
                        rolling: toggle.rolling,
                    },
                    Err(reason) => Reaction::Ignored(reason),
                },
            },
            Message::Result(result) => match self.get_mut(session_id) {
                None => Reaction::Ignored(IgnoreReason::UnknownSession),
                Some(replica) => match replica.apply_result(&result) {
                    ResultOutcome::Applied { completed } => {
                        debug!(
                            session = %session_id,
                            entrant = %result.entrant_id,
                            total = result.total,
                            completed,
                            "result applied"
                        );
                        Reaction::ResultApplied {
                            entrant: result.entrant_id,
                            completed,
                        }
                    }
                    ResultOutcome::Ignored(reason) => Reaction::Ignored(reason),
                },
            },
            Message::End(end) => match self.get_mut(session_id) {
                None => Reaction::Ignored(IgnoreReason::UnknownSession),
                Some(replica) => match replica.apply_end(end) {
                    EndOutcome::Concluded(conclusion) => {
                        info!(
                            session = %session_id,
                            abort = end.abort,
                            button = end.button,
                            "session ending"
                        );
                        Reaction::Ended {
                            session_id,
                            conclusion,
                        }
                    }
                    EndOutcome::Ignored(reason) => Reaction::Ignored(reason),
                },
            },
        };

        if let Reaction::Ignored(reason) = &reaction {
            debug!(session = %session_id, kind, %reason, "message ignored");
        }
        reaction
    }

    /// INTRO → ACTIVE for `session_id`, if it is still live.
    pub fn activate(&mut self, session_id: SessionId) -> bool {
        self.get_mut(session_id)
            .is_some_and(SessionReplica::begin_active)
    }

    /// Finish the outro for `session_id` and drop the replica.
    ///
    /// Returns the closed replica, or `None` if the session is no longer live.
    pub fn close(&mut self, session_id: SessionId) -> Option<SessionReplica> {
        self.get(session_id)?;
        let mut replica = self.active.take()?;
        replica.close();
        self.retired.insert(session_id);
        debug!(session = %session_id, "session closed");
        Some(replica)
    }

    /// Drop the live replica whatever its phase. Returns its session ID.
    pub fn discard(&mut self) -> Option<SessionId> {
        let replica = self.active.take()?;
        let session_id = replica.session_id();
        self.retired.insert(session_id);
        Some(session_id)
    }
}
