//! The dispatching side of a session.
//!
//! A coordinator stamps a fresh session ID on a descriptor, produces the
//! one DISPATCH frame for it, and is the only party that publishes a
//! recap when that session resolves. Ownership is dropped as soon as the
//! session concludes or another DISPATCH takes over, so a recap is
//! emitted at most once per session. A foreign DISPATCH that arrives
//! before our own echo does not cost ownership; only an actual
//! preemption of the owned replica does.

use tracing::info;

use gw_core::{SessionDescriptor, SessionId};

use crate::error::SessionResult;
use crate::protocol::Envelope;
use crate::recap::{NullSink, RecapRecord, RecapSink};
use crate::replica::{Conclusion, SessionReplica};

/// Recap ownership for sessions dispatched from this client.
pub struct Coordinator {
    owned: Option<SessionId>,
    sink: Box<dyn RecapSink>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(NullSink)
    }
}

impl Coordinator {
    /// A coordinator publishing to `sink`.
    pub fn new(sink: impl RecapSink + 'static) -> Self {
        Self {
            owned: None,
            sink: Box::new(sink),
        }
    }

    /// Replace the recap sink.
    pub fn set_sink(&mut self, sink: impl RecapSink + 'static) {
        self.sink = Box::new(sink);
    }

    /// The session this coordinator currently owns.
    pub fn owned(&self) -> Option<SessionId> {
        self.owned
    }

    /// Whether this coordinator owns `session_id`.
    pub fn owns(&self, session_id: SessionId) -> bool {
        self.owned == Some(session_id)
    }

    /// Validate a descriptor, give it a fresh session ID and build its DISPATCH.
    ///
    /// Nothing is owned until [`Coordinator::claim`] is called once the
    /// frame is actually on the channel.
    pub fn prepare(&self, mut descriptor: SessionDescriptor) -> SessionResult<Envelope> {
        descriptor.validate()?;
        descriptor.session_id = SessionId::new();
        info!(
            session = %descriptor.session_id,
            actors = descriptor.actor_refs.len(),
            contestants = descriptor.contestant_refs.len(),
            "dispatching session"
        );
        Ok(Envelope::dispatch(descriptor))
    }

    /// Take recap ownership of a session whose DISPATCH was sent.
    pub fn claim(&mut self, session_id: SessionId) -> SessionId {
        if let Some(previous) = self.owned.replace(session_id) {
            info!(session = %session_id, %previous, "dispatch replaces owned session");
        }
        session_id
    }

    /// Another DISPATCH displaced `session_id` on this client.
    pub fn preempted(&mut self, session_id: SessionId) {
        if self.owns(session_id) {
            info!(session = %session_id, "recap ownership relinquished");
            self.owned = None;
        }
    }

    /// Publish the recap for a concluded replica if this coordinator owns it.
    ///
    /// Ownership ends here whatever the conclusion; aborted sessions
    /// produce no recap.
    pub fn conclude(
        &mut self,
        replica: &SessionReplica,
        conclusion: &Conclusion,
    ) -> Option<RecapRecord> {
        let session_id = replica.session_id();
        if !self.owns(session_id) {
            return None;
        }
        self.owned = None;
        let Conclusion::Resolved { verdict, forced } = conclusion else {
            return None;
        };
        let record = RecapRecord::from_replica(replica, verdict, *forced);
        info!(session = %session_id, outcome = record.outcome(), "recap published");
        self.sink.publish(record.clone());
        Some(record)
    }

    /// Drop any reference to `session_id`.
    pub fn close(&mut self, session_id: SessionId) {
        if self.owns(session_id) {
            self.owned = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_core::{CoreError, EntrantId, Roster};
    use gw_mechanics::RollMode;
    use tokio::sync::mpsc;

    use crate::error::SessionError;
    use crate::protocol::{EndPayload, Message, ResultPayload};
    use crate::replica::EndOutcome;

    fn descriptor() -> SessionDescriptor {
        SessionDescriptor::new([EntrantId::from("a")]).with_dc(10)
    }

    fn dispatch(coord: &mut Coordinator, descriptor: SessionDescriptor) -> Envelope {
        let env = coord.prepare(descriptor).unwrap();
        coord.claim(env.session_id);
        env
    }

    fn concluded(envelope: &Envelope, end: EndPayload) -> (SessionReplica, Conclusion) {
        let Message::Dispatch(d) = &envelope.message else {
            panic!("expected DISPATCH");
        };
        let mut replica = SessionReplica::new(d.clone(), &Roster::new());
        replica.begin_active();
        replica.apply_result(&ResultPayload {
            entrant_id: EntrantId::from("a"),
            total: 12,
            modifier: 0,
            is_crit: false,
            is_fumble: false,
            roll_mode: RollMode::Normal,
            dice_faces: vec![12],
        });
        let EndOutcome::Concluded(conclusion) = replica.apply_end(end) else {
            panic!("expected conclusion");
        };
        (replica, conclusion)
    }

    #[test]
    fn dispatch_assigns_fresh_ids() {
        let mut coord = Coordinator::default();
        let d = descriptor();
        let original = d.session_id;
        let first = dispatch(&mut coord, d.clone());
        let second = dispatch(&mut coord, d);
        assert_ne!(first.session_id, original);
        assert_ne!(first.session_id, second.session_id);
        assert!(coord.owns(second.session_id));
        assert!(!coord.owns(first.session_id));
    }

    #[test]
    fn prepared_session_is_owned_only_once_claimed() {
        let mut coord = Coordinator::default();
        let env = coord.prepare(descriptor()).unwrap();
        assert_eq!(coord.owned(), None);
        assert_eq!(coord.claim(env.session_id), env.session_id);
        assert!(coord.owns(env.session_id));
    }

    #[test]
    fn invalid_descriptor_is_rejected() {
        let coord = Coordinator::default();
        let err = coord
            .prepare(SessionDescriptor::new(Vec::<EntrantId>::new()))
            .unwrap_err();
        assert!(matches!(err, SessionError::Core(CoreError::NoActors)));
        assert_eq!(coord.owned(), None);
    }

    #[test]
    fn recap_is_published_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut coord = Coordinator::new(tx);
        let env = dispatch(&mut coord, descriptor());
        let (replica, conclusion) = concluded(&env, EndPayload::completed());

        let record = coord.conclude(&replica, &conclusion).unwrap();
        assert_eq!(record.success, Some(true));
        assert!(coord.conclude(&replica, &conclusion).is_none());
        assert_eq!(rx.try_recv().unwrap(), record);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn abort_publishes_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut coord = Coordinator::new(tx);
        let env = dispatch(&mut coord, descriptor());
        let (replica, conclusion) = concluded(&env, EndPayload::aborted());
        assert!(coord.conclude(&replica, &conclusion).is_none());
        assert!(rx.try_recv().is_err());
        assert_eq!(coord.owned(), None);
    }

    #[test]
    fn preemption_relinquishes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut coord = Coordinator::new(tx);
        let env = dispatch(&mut coord, descriptor());
        coord.preempted(SessionId::new());
        assert!(coord.owns(env.session_id));

        coord.preempted(env.session_id);
        assert_eq!(coord.owned(), None);
        let (replica, conclusion) = concluded(&env, EndPayload::forced());
        assert!(coord.conclude(&replica, &conclusion).is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn non_owner_never_publishes() {
        let mut owner = Coordinator::default();
        let env = dispatch(&mut owner, descriptor());
        let (replica, conclusion) = concluded(&env, EndPayload::completed());
        let mut bystander = Coordinator::default();
        assert!(bystander.conclude(&replica, &conclusion).is_none());
    }
}
