//! The per-client session replica and its state machine.
//!
//! ```text
//!   DISPATCH ──► INTRO ──intro done──► ACTIVE
//!                  │                     │
//!                  └──────── END ────────┴──► ENDING ──outro done──► CLOSED
//! ```
//!
//! Phases only move forward. RESULT is accepted in INTRO and ACTIVE and
//! dropped once the replica has ended. END is accepted once; the `ended`
//! latch turns every later END into a no-op.

use std::collections::HashMap;
use std::fmt;

use gw_core::{
    EntrantDirectory, EntrantId, SessionDescriptor, SessionId, compute_modifier,
    display_or_placeholder,
};
use gw_mechanics::{Verdict, compute_verdict};

use crate::entrant::{EntrantResult, EntrantState};
use crate::error::{SessionError, SessionResult};
use crate::protocol::{EndPayload, ResultPayload, TogglePayload};
use crate::view::{ReplicaView, TileView};

/// Lifecycle phase of a replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Intro sequence playing; no roll controls yet.
    Intro,
    /// Roll controls visible.
    Active,
    /// Concluded; outro or fade-out playing.
    Ending,
    /// Finished and ready to discard.
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intro => write!(f, "intro"),
            Self::Active => write!(f, "active"),
            Self::Ending => write!(f, "ending"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Why an incoming message had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgnoreReason {
    /// No live replica for the message's session.
    UnknownSession,
    /// DISPATCH for a session this client already has or had.
    DuplicateDispatch,
    /// DISPATCH whose descriptor fails validation or disagrees with the envelope.
    InvalidDispatch,
    /// RESULT or TOGGLE naming an entrant outside the roster.
    UnknownEntrant,
    /// RESULT for an entrant that already has one.
    StaleResult,
    /// RESULT arriving after the session ended.
    AfterEnd,
    /// END arriving after the session ended.
    DuplicateEnd,
    /// TOGGLE that changed nothing.
    RedundantToggle,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::UnknownSession => "unknown session",
            Self::DuplicateDispatch => "duplicate dispatch",
            Self::InvalidDispatch => "invalid dispatch",
            Self::UnknownEntrant => "unknown entrant",
            Self::StaleResult => "stale result",
            Self::AfterEnd => "result after end",
            Self::DuplicateEnd => "duplicate end",
            Self::RedundantToggle => "redundant toggle",
        };
        write!(f, "{text}")
    }
}

/// What applying a RESULT did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultOutcome {
    /// The result was recorded. `completed` is true exactly once per
    /// replica: on the result that filled the last empty tile.
    Applied {
        /// Every entrant now has a result.
        completed: bool,
    },
    /// The message was dropped.
    Ignored(IgnoreReason),
}

/// How a session concluded.
#[derive(Debug, Clone, PartialEq)]
pub enum Conclusion {
    /// Canceled; no verdict, fade-out only.
    Aborted,
    /// Judged.
    Resolved {
        /// The verdict over the collected results.
        verdict: Verdict,
        /// Ended by "force complete" rather than the last result.
        forced: bool,
    },
}

/// What applying an END did.
#[derive(Debug, Clone, PartialEq)]
pub enum EndOutcome {
    /// The replica ended now.
    Concluded(Conclusion),
    /// The replica had already ended.
    Ignored(IgnoreReason),
}

/// One client's copy of a session.
#[derive(Debug, Clone)]
pub struct SessionReplica {
    descriptor: SessionDescriptor,
    phase: Phase,
    entrants: Vec<EntrantState>,
    ended: bool,
    completion_signaled: bool,
    conclusion: Option<Conclusion>,
}

impl SessionReplica {
    /// Build a fresh replica in INTRO with every tile empty.
    ///
    /// Entrants the directory cannot resolve get placeholder display data
    /// and a zero modifier.
    pub fn new(descriptor: SessionDescriptor, directory: &dyn EntrantDirectory) -> Self {
        let entrants = descriptor
            .entrants()
            .map(|(id, role)| {
                EntrantState::new(
                    id.clone(),
                    role,
                    display_or_placeholder(directory, id),
                    compute_modifier(directory, id, descriptor.ability_key),
                )
            })
            .collect();
        Self {
            descriptor,
            phase: Phase::Intro,
            entrants,
            ended: false,
            completion_signaled: false,
            conclusion: None,
        }
    }

    /// The session this replica belongs to.
    pub fn session_id(&self) -> SessionId {
        self.descriptor.session_id
    }

    /// The descriptor it was built from.
    pub fn descriptor(&self) -> &SessionDescriptor {
        &self.descriptor
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether END has been applied.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// How the session concluded, once it has.
    pub fn conclusion(&self) -> Option<&Conclusion> {
        self.conclusion.as_ref()
    }

    /// Tiles in display order, actors first.
    pub fn entrants(&self) -> &[EntrantState] {
        &self.entrants
    }

    /// Look up a tile.
    pub fn entrant(&self, id: &EntrantId) -> Option<&EntrantState> {
        self.entrants.iter().find(|e| &e.id == id)
    }

    fn entrant_mut(&mut self, id: &EntrantId) -> Option<&mut EntrantState> {
        self.entrants.iter_mut().find(|e| &e.id == id)
    }

    /// Whether every tile has a result.
    pub fn is_complete(&self) -> bool {
        self.entrants.iter().all(EntrantState::has_result)
    }

    /// Totals of every tile with a result.
    pub fn results(&self) -> HashMap<EntrantId, i32> {
        self.entrants
            .iter()
            .filter_map(|e| e.result().map(|r| (e.id.clone(), r.total)))
            .collect()
    }

    /// Judge the results collected so far.
    pub fn verdict(&self) -> Verdict {
        compute_verdict(&self.descriptor, &self.results())
    }

    fn advance(&mut self, to: Phase) {
        if to > self.phase {
            self.phase = to;
        }
    }

    /// INTRO → ACTIVE. Returns false in any other phase.
    pub fn begin_active(&mut self) -> bool {
        if self.phase != Phase::Intro {
            return false;
        }
        self.advance(Phase::Active);
        true
    }

    /// Merge a RESULT.
    ///
    /// Duplicates, stale echoes and stragglers after END are dropped
    /// without touching state.
    pub fn apply_result(&mut self, payload: &ResultPayload) -> ResultOutcome {
        if self.ended {
            return ResultOutcome::Ignored(IgnoreReason::AfterEnd);
        }
        let Some(entrant) = self.entrant_mut(&payload.entrant_id) else {
            return ResultOutcome::Ignored(IgnoreReason::UnknownEntrant);
        };
        if !entrant.record(EntrantResult::from(payload)) {
            return ResultOutcome::Ignored(IgnoreReason::StaleResult);
        }

        let completed = !self.completion_signaled && self.is_complete();
        if completed {
            self.completion_signaled = true;
        }
        ResultOutcome::Applied { completed }
    }

    /// Merge an advisory TOGGLE.
    pub fn apply_toggle(&mut self, payload: &TogglePayload) -> Result<(), IgnoreReason> {
        if self.ended {
            return Err(IgnoreReason::AfterEnd);
        }
        let entrant = self
            .entrant_mut(&payload.entrant_id)
            .ok_or(IgnoreReason::UnknownEntrant)?;
        if entrant.set_rolling(payload.rolling) {
            Ok(())
        } else {
            Err(IgnoreReason::RedundantToggle)
        }
    }

    /// Apply END once; later ENDs are ignored.
    pub fn apply_end(&mut self, end: EndPayload) -> EndOutcome {
        if self.ended {
            return EndOutcome::Ignored(IgnoreReason::DuplicateEnd);
        }
        self.ended = true;
        self.advance(Phase::Ending);

        let conclusion = if end.abort {
            Conclusion::Aborted
        } else {
            Conclusion::Resolved {
                verdict: self.verdict(),
                forced: end.button,
            }
        };
        self.conclusion = Some(conclusion.clone());
        EndOutcome::Concluded(conclusion)
    }

    /// ENDING → CLOSED, after the outro or fade.
    pub fn close(&mut self) {
        if self.phase == Phase::Ending {
            self.advance(Phase::Closed);
        }
    }

    /// The END a privileged "force complete" emits. Only valid while ACTIVE.
    pub fn force_complete(&self) -> SessionResult<EndPayload> {
        if self.ended || self.phase != Phase::Active {
            return Err(SessionError::WrongPhase {
                action: "force complete",
                phase: self.phase,
            });
        }
        Ok(EndPayload::forced())
    }

    /// The END a privileged abort emits. Valid in INTRO and ACTIVE.
    pub fn abort(&self) -> SessionResult<EndPayload> {
        if self.ended || self.phase > Phase::Active {
            return Err(SessionError::WrongPhase {
                action: "abort",
                phase: self.phase,
            });
        }
        Ok(EndPayload::aborted())
    }

    /// Check that a local roll for `id` may start.
    pub fn check_rollable(&self, id: &EntrantId) -> SessionResult<()> {
        if self.ended || self.phase != Phase::Active {
            return Err(SessionError::WrongPhase {
                action: "roll",
                phase: self.phase,
            });
        }
        let entrant = self
            .entrant(id)
            .ok_or_else(|| SessionError::UnknownEntrant(id.clone()))?;
        if entrant.has_result() {
            return Err(SessionError::AlreadyRolled(id.clone()));
        }
        if entrant.is_pending() {
            return Err(SessionError::RollPending(id.clone()));
        }
        Ok(())
    }

    /// Mark or clear a local in-flight roll.
    pub fn set_pending(&mut self, id: &EntrantId, pending: bool) {
        if let Some(entrant) = self.entrant_mut(id) {
            entrant.set_pending(pending);
        }
    }

    /// A render snapshot for a viewer.
    pub fn view(&self, privileged: bool) -> ReplicaView {
        ReplicaView {
            session_id: self.session_id(),
            title: self.descriptor.title(),
            phase: self.phase,
            dc: self.descriptor.displayed_dc(privileged),
            tiles: self.entrants.iter().map(TileView::from).collect(),
        }
    }
}
