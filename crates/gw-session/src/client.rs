//! One connected client: its registry, coordinator, roller and presenter.
//!
//! Message handling runs to completion; the only awaits are the
//! presenter's intro/outro/fade and the dice roller. A result that fills
//! the last tile makes this client end its own replica with a local
//! `END(abort=false)`; that END is never broadcast. Local RESULTs, force
//! complete and abort are broadcast first and then applied locally, so
//! the sender's echo lands on write-once results or the `ended` latch.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, warn};

use gw_core::{EntrantDirectory, EntrantId, SessionDescriptor, SessionId};
use gw_mechanics::{DiceRoller, RollMode, SeededRoller, build_roll_formula};

use crate::config::ClientConfig;
use crate::coordinator::Coordinator;
use crate::error::{SessionError, SessionResult};
use crate::presenter::{Presenter, TimedPresenter};
use crate::protocol::{EndPayload, Envelope, Message, ResultPayload, TogglePayload};
use crate::recap::RecapSink;
use crate::registry::{Reaction, SessionRegistry};
use crate::replica::{Conclusion, Phase, SessionReplica};
use crate::transport::{Broadcast, RelayInbox};
use crate::view::ReplicaView;

/// A participant in the shared broadcast.
pub struct Client {
    config: ClientConfig,
    registry: SessionRegistry,
    coordinator: Coordinator,
    link: Box<dyn Broadcast>,
    roller: Box<dyn DiceRoller>,
    presenter: Box<dyn Presenter>,
    directory: Arc<dyn EntrantDirectory>,
}

impl Client {
    /// A client with a seeded roller and timed presenter taken from `config`.
    pub fn new(
        config: ClientConfig,
        link: impl Broadcast + 'static,
        directory: Arc<dyn EntrantDirectory>,
    ) -> Self {
        Self {
            roller: Box::new(SeededRoller::new(config.seed)),
            presenter: Box::new(TimedPresenter::from_config(&config)),
            config,
            registry: SessionRegistry::new(),
            coordinator: Coordinator::default(),
            link: Box::new(link),
            directory,
        }
    }

    /// Use a different dice roller.
    pub fn with_roller(mut self, roller: impl DiceRoller + 'static) -> Self {
        self.roller = Box::new(roller);
        self
    }

    /// Use a different presenter.
    pub fn with_presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Box::new(presenter);
        self
    }

    /// Publish recaps of sessions this client dispatches to `sink`.
    pub fn with_recap_sink(mut self, sink: impl RecapSink + 'static) -> Self {
        self.coordinator.set_sink(sink);
        self
    }

    /// This client's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The live replica, if any.
    pub fn active(&self) -> Option<&SessionReplica> {
        self.registry.active()
    }

    /// A render snapshot of the live replica for the local user.
    pub fn view(&self) -> Option<ReplicaView> {
        self.registry
            .active()
            .map(|r| r.view(self.config.privileged))
    }

    /// Whether this client will publish the recap for `session_id`.
    pub fn owns(&self, session_id: SessionId) -> bool {
        self.coordinator.owns(session_id)
    }

    /// Whether the local user may roll for `id`.
    pub fn may_roll(&self, id: &EntrantId) -> bool {
        self.config.may_roll(id)
    }

    /// Entrants the local user could roll for right now.
    pub fn rollable_entrants(&self) -> Vec<EntrantId> {
        let Some(replica) = self.registry.active() else {
            return Vec::new();
        };
        replica
            .entrants()
            .iter()
            .filter(|e| self.may_roll(&e.id) && replica.check_rollable(&e.id).is_ok())
            .map(|e| e.id.clone())
            .collect()
    }

    fn require_privileged(&self) -> SessionResult<()> {
        if self.config.privileged {
            Ok(())
        } else {
            Err(SessionError::NotPrivileged)
        }
    }

    fn active_replica(&self) -> SessionResult<&SessionReplica> {
        self.registry.active().ok_or(SessionError::NoActiveSession)
    }

    /// Start a session for everyone. The local replica is built when the
    /// DISPATCH echo comes back, like on every other client.
    pub fn dispatch(&mut self, descriptor: SessionDescriptor) -> SessionResult<SessionId> {
        self.require_privileged()?;
        let envelope = self.coordinator.prepare(descriptor)?;
        self.link.send(&envelope)?;
        Ok(self.coordinator.claim(envelope.session_id))
    }

    /// Roll for one entrant of the live session and share the result.
    ///
    /// Returns the payload if this client's roll was the one recorded,
    /// `None` if the session ended or moved on while the dice were out.
    pub async fn roll(
        &mut self,
        id: &EntrantId,
        mode: RollMode,
    ) -> SessionResult<Option<ResultPayload>> {
        if !self.may_roll(id) {
            return Err(SessionError::NotAuthorized(id.clone()));
        }
        let replica = self.active_replica()?;
        replica.check_rollable(id)?;
        let session_id = replica.session_id();
        let modifier = replica.entrant(id).map_or(0, |e| e.modifier);
        let formula = build_roll_formula(
            mode,
            replica
                .descriptor()
                .ability_key
                .has_modifier()
                .then_some(modifier),
        );

        self.send_toggle(session_id, id, true)?;
        self.set_pending(session_id, id, true);

        let roll = match self.roller.roll(&formula).await {
            Ok(roll) => roll,
            Err(err) => {
                warn!(session = %session_id, entrant = %id, %err, "roll failed");
                self.set_pending(session_id, id, false);
                if let Err(toggle_err) = self.send_toggle(session_id, id, false) {
                    warn!(session = %session_id, %toggle_err, "could not clear rolling flag");
                }
                return Err(err.into());
            }
        };
        debug!(session = %session_id, entrant = %id, %roll, "rolled");

        let open = self
            .registry
            .get(session_id)
            .is_some_and(|r| !r.is_ended() && r.entrant(id).is_some_and(|e| !e.has_result()));
        if !open {
            self.set_pending(session_id, id, false);
            debug!(session = %session_id, entrant = %id, "roll discarded");
            return Ok(None);
        }

        let payload = ResultPayload::from_roll(id.clone(), &roll);
        let envelope = Envelope::new(session_id, Message::Result(payload.clone()));
        if let Err(err) = self.link.send(&envelope) {
            warn!(session = %session_id, entrant = %id, %err, "result not sent");
            self.set_pending(session_id, id, false);
            if let Err(toggle_err) = self.send_toggle(session_id, id, false) {
                warn!(session = %session_id, %toggle_err, "could not clear rolling flag");
            }
            return Err(err);
        }
        self.handle(envelope).await;
        Ok(Some(payload))
    }

    /// End the live session now and judge whatever results are in.
    pub async fn force_complete(&mut self) -> SessionResult<()> {
        self.require_privileged()?;
        let replica = self.active_replica()?;
        let end = replica.force_complete()?;
        let session_id = replica.session_id();
        self.broadcast_end(session_id, end).await
    }

    /// Cancel the live session without a verdict.
    pub async fn abort(&mut self) -> SessionResult<()> {
        self.require_privileged()?;
        let replica = self.active_replica()?;
        let end = replica.abort()?;
        let session_id = replica.session_id();
        self.broadcast_end(session_id, end).await
    }

    async fn broadcast_end(&mut self, session_id: SessionId, end: EndPayload) -> SessionResult<()> {
        let envelope = Envelope::new(session_id, Message::End(end));
        self.link.send(&envelope)?;
        self.handle(envelope).await;
        Ok(())
    }

    fn send_toggle(&self, session_id: SessionId, id: &EntrantId, rolling: bool) -> SessionResult<()> {
        let toggle = TogglePayload {
            entrant_id: id.clone(),
            rolling,
        };
        self.link
            .send(&Envelope::new(session_id, Message::Toggle(toggle)))
    }

    fn set_pending(&mut self, session_id: SessionId, id: &EntrantId, pending: bool) {
        if let Some(replica) = self.registry.get_mut(session_id) {
            replica.set_pending(id, pending);
        }
    }

    /// Decode and handle one frame from the channel.
    pub async fn handle_frame(&mut self, frame: &str) -> SessionResult<Vec<Reaction>> {
        let envelope = Envelope::decode(frame)?;
        Ok(self.handle(envelope).await)
    }

    /// Handle one envelope and everything it sets off locally.
    pub async fn handle(&mut self, envelope: Envelope) -> Vec<Reaction> {
        let reaction = self.receive(envelope);
        self.settle(reaction).await
    }

    /// Process frames until the relay shuts down.
    pub async fn run(&mut self, inbox: &mut RelayInbox) {
        while let Some(frame) = inbox.next_frame().await {
            if let Err(err) = self.handle_frame(&frame).await {
                warn!(client = %self.config.name, %err, "dropping frame");
            }
        }
        debug!(client = %self.config.name, "relay closed");
    }

    fn receive(&mut self, envelope: Envelope) -> Reaction {
        self.registry.receive(envelope, self.directory.as_ref())
    }

    /// Run the local effects of a reaction, and of any local END it triggers.
    async fn settle(&mut self, reaction: Reaction) -> Vec<Reaction> {
        let mut queue = VecDeque::from([reaction]);
        let mut seen = Vec::new();
        while let Some(reaction) = queue.pop_front() {
            if let Some(follow_up) = self.react(&reaction).await {
                queue.push_back(self.receive(follow_up));
            }
            seen.push(reaction);
        }
        seen
    }

    async fn react(&mut self, reaction: &Reaction) -> Option<Envelope> {
        match reaction {
            Reaction::Started {
                session_id,
                preempted,
            } => {
                if let Some(old) = preempted {
                    self.coordinator.preempted(*old);
                }
                self.play_intro(*session_id).await;
                None
            }
            Reaction::ResultApplied { completed, .. } => {
                self.refresh();
                let replica = self.registry.active()?;
                completed.then(|| {
                    debug!(session = %replica.session_id(), "all results in");
                    Envelope::new(replica.session_id(), Message::End(EndPayload::completed()))
                })
            }
            Reaction::Toggled { .. } => {
                self.refresh();
                None
            }
            Reaction::Ended {
                session_id,
                conclusion,
            } => {
                self.finish(*session_id, conclusion).await;
                None
            }
            Reaction::Ignored(_) => None,
        }
    }

    fn refresh(&mut self) {
        if let Some(view) = self.view() {
            self.presenter.refresh(&view);
        }
    }

    async fn play_intro(&mut self, session_id: SessionId) {
        let Some(view) = self.registry.get(session_id).map(|r| r.view(self.config.privileged))
        else {
            return;
        };
        self.presenter.intro(&view).await;
        if self.registry.activate(session_id) {
            debug!(client = %self.config.name, session = %session_id, "roll controls revealed");
            self.refresh();
        }
    }

    async fn finish(&mut self, session_id: SessionId, conclusion: &Conclusion) {
        let Some(replica) = self.registry.get(session_id) else {
            return;
        };
        self.coordinator.conclude(replica, conclusion);
        let view = replica.view(self.config.privileged);
        match conclusion {
            Conclusion::Resolved { verdict, .. } => {
                info!(client = %self.config.name, session = %session_id, %verdict, "session resolved");
                self.presenter.outro(&view, verdict).await;
            }
            Conclusion::Aborted => {
                info!(client = %self.config.name, session = %session_id, "session aborted");
                self.presenter.fade_out(session_id).await;
            }
        }
        if let Some(closed) = self.registry.close(session_id) {
            debug_assert_eq!(closed.phase(), Phase::Closed);
        }
        self.coordinator.close(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use gw_core::{Ability, AbilityKey, AbilityScores, EntrantSheet, Roster};
    use gw_mechanics::{ScriptedRoller, Verdict};
    use tokio::sync::mpsc;

    use crate::presenter::SilentPresenter;
    use crate::recap::RecapRecord;
    use crate::replica::IgnoreReason;

    /// Records every frame instead of delivering it.
    #[derive(Clone, Default)]
    struct Outbox(Arc<Mutex<Vec<Envelope>>>);

    impl Outbox {
        fn sent(&self) -> Vec<Envelope> {
            self.0.lock().unwrap().clone()
        }

        fn kinds(&self) -> Vec<&'static str> {
            self.sent().iter().map(|e| e.message.kind()).collect()
        }
    }

    impl Broadcast for Outbox {
        fn send(&self, envelope: &Envelope) -> SessionResult<()> {
            self.0.lock().unwrap().push(envelope.clone());
            Ok(())
        }
    }

    /// Records frames like [`Outbox`] but refuses one message kind.
    struct Refusing {
        outbox: Outbox,
        kind: &'static str,
    }

    impl Broadcast for Refusing {
        fn send(&self, envelope: &Envelope) -> SessionResult<()> {
            if envelope.message.kind() == self.kind {
                return Err(SessionError::Transport("down".to_string()));
            }
            self.outbox.send(envelope)
        }
    }

    #[derive(Clone, Default)]
    struct Stage(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl Presenter for Stage {
        async fn intro(&mut self, view: &ReplicaView) {
            self.0.lock().unwrap().push(format!("intro {}", view.tiles.len()));
        }

        async fn outro(&mut self, _view: &ReplicaView, verdict: &Verdict) {
            self.0.lock().unwrap().push(format!("outro {verdict}"));
        }

        async fn fade_out(&mut self, _session_id: SessionId) {
            self.0.lock().unwrap().push("fade".to_string());
        }
    }

    fn roster() -> Arc<dyn EntrantDirectory> {
        let strong = AbilityScores {
            str: 16,
            ..AbilityScores::default()
        };
        Arc::new(
            Roster::new()
                .with(EntrantSheet::new("a", "Aldric").with_abilities(strong))
                .with(EntrantSheet::new("b", "Brenna")),
        )
    }

    fn gm(outbox: &Outbox) -> Client {
        Client::new(
            ClientConfig::default().with_name("gm").privileged().instant(),
            outbox.clone(),
            roster(),
        )
        .with_presenter(SilentPresenter)
    }

    fn ids(refs: &[&str]) -> Vec<EntrantId> {
        refs.iter().map(|r| EntrantId::from(*r)).collect()
    }

    /// Dispatch and feed the echo back, leaving the session ACTIVE.
    async fn started(client: &mut Client, outbox: &Outbox, descriptor: SessionDescriptor) -> SessionId {
        let id = client.dispatch(descriptor).unwrap();
        let echo = outbox.sent().last().cloned().unwrap();
        client.handle(echo).await;
        id
    }

    #[tokio::test]
    async fn dispatch_builds_replica_on_echo() {
        let outbox = Outbox::default();
        let mut client = gm(&outbox);
        let id = client
            .dispatch(SessionDescriptor::new(ids(&["a", "b"])).with_dc(12))
            .unwrap();
        assert!(client.active().is_none());
        assert_eq!(outbox.kinds(), vec!["DISPATCH"]);

        let reactions = client.handle(outbox.sent()[0].clone()).await;
        assert!(matches!(reactions[0], Reaction::Started { preempted: None, .. }));
        let replica = client.active().unwrap();
        assert_eq!(replica.session_id(), id);
        assert_eq!(replica.phase(), Phase::Active);
        assert!(client.owns(id));
    }

    #[tokio::test]
    async fn players_cannot_dispatch_or_end() {
        let outbox = Outbox::default();
        let mut player = Client::new(ClientConfig::default().instant(), outbox.clone(), roster());
        assert!(matches!(
            player.dispatch(SessionDescriptor::new(ids(&["a"])).with_dc(10)),
            Err(SessionError::NotPrivileged)
        ));
        assert!(matches!(player.abort().await, Err(SessionError::NotPrivileged)));
        assert!(outbox.sent().is_empty());
    }

    #[tokio::test]
    async fn roll_sends_toggle_then_result_with_modifier() {
        let outbox = Outbox::default();
        let mut client = gm(&outbox).with_roller(ScriptedRoller::new([vec![11]]));
        let descriptor = SessionDescriptor::new(ids(&["a", "b"]))
            .with_dc(12)
            .with_ability(AbilityKey::Ability(Ability::Str));
        started(&mut client, &outbox, descriptor).await;

        let payload = client
            .roll(&EntrantId::from("a"), RollMode::Normal)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload.total, 14);
        assert_eq!(payload.modifier, 3);
        assert_eq!(outbox.kinds(), vec!["DISPATCH", "TOGGLE", "RESULT"]);

        let tile = client.active().unwrap().entrant(&EntrantId::from("a")).unwrap();
        assert_eq!(tile.result().map(|r| r.total), Some(14));
        assert!(!tile.is_pending());
    }

    #[tokio::test]
    async fn flat_rolls_carry_no_modifier() {
        let outbox = Outbox::default();
        let mut client = gm(&outbox).with_roller(ScriptedRoller::new([vec![9]]));
        started(&mut client, &outbox, SessionDescriptor::new(ids(&["a", "b"])).with_dc(12)).await;
        let payload = client
            .roll(&EntrantId::from("a"), RollMode::Normal)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload.total, 9);
        assert_eq!(payload.modifier, 0);
    }

    #[tokio::test]
    async fn unauthorized_roll_is_rejected() {
        let outbox = Outbox::default();
        let mut gm = gm(&outbox);
        let id = started(&mut gm, &outbox, SessionDescriptor::new(ids(&["a", "b"])).with_dc(12)).await;

        let mut player = Client::new(
            ClientConfig::default()
                .with_controls(ids(&["b"]))
                .instant(),
            outbox.clone(),
            roster(),
        )
        .with_presenter(SilentPresenter);
        let dispatch = outbox
            .sent()
            .into_iter()
            .find(|e| e.session_id == id)
            .unwrap();
        player.handle(dispatch).await;

        assert_eq!(player.rollable_entrants(), ids(&["b"]));
        assert!(matches!(
            player.roll(&EntrantId::from("a"), RollMode::Normal).await,
            Err(SessionError::NotAuthorized(_))
        ));
    }

    #[tokio::test]
    async fn second_roll_for_same_entrant_fails() {
        let outbox = Outbox::default();
        let mut client = gm(&outbox).with_roller(ScriptedRoller::new([vec![5], vec![6]]));
        started(&mut client, &outbox, SessionDescriptor::new(ids(&["a", "b"])).with_dc(12)).await;
        let a = EntrantId::from("a");
        client.roll(&a, RollMode::Normal).await.unwrap();
        assert!(matches!(
            client.roll(&a, RollMode::Normal).await,
            Err(SessionError::AlreadyRolled(_))
        ));
    }

    #[tokio::test]
    async fn failed_roll_clears_pending() {
        let outbox = Outbox::default();
        let mut client = gm(&outbox).with_roller(ScriptedRoller::new(Vec::<Vec<u32>>::new()));
        started(&mut client, &outbox, SessionDescriptor::new(ids(&["a"])).with_dc(12)).await;
        let a = EntrantId::from("a");
        assert!(matches!(
            client.roll(&a, RollMode::Normal).await,
            Err(SessionError::Mech(_))
        ));
        assert!(!client.active().unwrap().entrant(&a).unwrap().is_pending());
        assert_eq!(outbox.kinds(), vec!["DISPATCH", "TOGGLE", "TOGGLE"]);
    }

    #[tokio::test]
    async fn unsent_result_is_not_kept_locally() {
        let outbox = Outbox::default();
        let link = Refusing {
            outbox: outbox.clone(),
            kind: "RESULT",
        };
        let mut client = Client::new(
            ClientConfig::default().with_name("gm").privileged().instant(),
            link,
            roster(),
        )
        .with_presenter(SilentPresenter)
        .with_roller(ScriptedRoller::new([vec![15]]));
        let id = started(&mut client, &outbox, SessionDescriptor::new(ids(&["a"])).with_dc(12)).await;
        let a = EntrantId::from("a");

        assert!(matches!(
            client.roll(&a, RollMode::Normal).await,
            Err(SessionError::Transport(_))
        ));
        let replica = client.active().unwrap();
        assert_eq!(replica.phase(), Phase::Active);
        assert!(!replica.is_complete());
        assert!(replica.check_rollable(&a).is_ok());

        let remote = ResultPayload {
            entrant_id: a.clone(),
            total: 15,
            modifier: 0,
            is_crit: false,
            is_fumble: false,
            roll_mode: RollMode::Normal,
            dice_faces: vec![15],
        };
        client
            .handle(Envelope::new(id, Message::Result(remote)))
            .await;
        assert!(client.active().is_none());
    }

    #[tokio::test]
    async fn unsent_dispatch_is_not_owned() {
        let outbox = Outbox::default();
        let link = Refusing {
            outbox: outbox.clone(),
            kind: "DISPATCH",
        };
        let mut client = Client::new(
            ClientConfig::default().with_name("gm").privileged().instant(),
            link,
            roster(),
        );
        assert!(matches!(
            client.dispatch(SessionDescriptor::new(ids(&["a"])).with_dc(12)),
            Err(SessionError::Transport(_))
        ));
        assert_eq!(client.coordinator.owned(), None);
        assert!(outbox.sent().is_empty());
    }

    #[tokio::test]
    async fn last_result_ends_locally_exactly_once() {
        let outbox = Outbox::default();
        let stage = Stage::default();
        let (tx, mut rx) = mpsc::unbounded_channel::<RecapRecord>();
        let mut client = gm(&outbox)
            .with_presenter(stage.clone())
            .with_roller(ScriptedRoller::new([vec![15], vec![8]]))
            .with_recap_sink(tx);
        let id = started(&mut client, &outbox, SessionDescriptor::new(ids(&["a", "b"])).with_dc(12)).await;

        client.roll(&EntrantId::from("a"), RollMode::Normal).await.unwrap();
        client.roll(&EntrantId::from("b"), RollMode::Normal).await.unwrap();

        assert!(client.active().is_none());
        assert!(!outbox.kinds().contains(&"END"));
        assert_eq!(
            stage.0.lock().unwrap().clone(),
            vec!["intro 2".to_string(), "outro Success".to_string()]
        );
        let record = rx.try_recv().unwrap();
        assert_eq!(record.session_id, id);
        assert!(!record.forced);
        assert!(rx.try_recv().is_err());

        // Echoes of our own results and a stray END change nothing.
        for env in outbox.sent() {
            client.handle(env).await;
        }
        let reactions = client
            .handle(Envelope::new(id, Message::End(EndPayload::completed())))
            .await;
        assert_eq!(reactions, vec![Reaction::Ignored(IgnoreReason::UnknownSession)]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn remote_results_complete_the_session() {
        let outbox = Outbox::default();
        let stage = Stage::default();
        let mut client = gm(&outbox).with_presenter(stage.clone());
        let id = started(&mut client, &outbox, SessionDescriptor::new(ids(&["a"])).with_dc(12)).await;

        let result = Envelope::new(
            id,
            Message::Result(ResultPayload {
                entrant_id: EntrantId::from("a"),
                total: 4,
                modifier: 0,
                is_crit: false,
                is_fumble: false,
                roll_mode: RollMode::Normal,
                dice_faces: vec![4],
            }),
        );
        let reactions = client.handle(result).await;
        assert!(matches!(reactions[0], Reaction::ResultApplied { completed: true, .. }));
        assert!(matches!(
            &reactions[1],
            Reaction::Ended { conclusion: Conclusion::Resolved { forced: false, .. }, .. }
        ));
        assert_eq!(stage.0.lock().unwrap().last().cloned(), Some("outro Failure".to_string()));
    }

    #[tokio::test]
    async fn force_complete_broadcasts_and_applies() {
        let outbox = Outbox::default();
        let (tx, mut rx) = mpsc::unbounded_channel::<RecapRecord>();
        let mut client = gm(&outbox)
            .with_roller(ScriptedRoller::new([vec![13]]))
            .with_recap_sink(tx);
        started(&mut client, &outbox, SessionDescriptor::new(ids(&["a", "b"])).with_dc(12)).await;
        client.roll(&EntrantId::from("a"), RollMode::Normal).await.unwrap();

        client.force_complete().await.unwrap();
        assert_eq!(outbox.kinds().last(), Some(&"END"));
        assert!(client.active().is_none());
        let record = rx.try_recv().unwrap();
        assert!(record.forced);
        assert_eq!(record.success, Some(true));
    }

    #[tokio::test]
    async fn abort_from_intro_skips_recap_and_outro() {
        let outbox = Outbox::default();
        let stage = Stage::default();
        let (tx, mut rx) = mpsc::unbounded_channel::<RecapRecord>();
        let mut client = gm(&outbox)
            .with_presenter(stage.clone())
            .with_recap_sink(tx);
        let id = client
            .dispatch(SessionDescriptor::new(ids(&["a"])).with_dc(12))
            .unwrap();

        // Build the replica without running the intro.
        client.receive(outbox.sent()[0].clone());
        assert_eq!(client.active().unwrap().phase(), Phase::Intro);
        assert!(matches!(
            client.force_complete().await,
            Err(SessionError::WrongPhase { phase: Phase::Intro, .. })
        ));

        client.abort().await.unwrap();
        assert!(client.active().is_none());
        assert_eq!(stage.0.lock().unwrap().clone(), vec!["fade".to_string()]);
        assert!(rx.try_recv().is_err());
        assert!(!client.owns(id));
    }

    #[tokio::test]
    async fn preemption_drops_recap_ownership() {
        let outbox = Outbox::default();
        let mut client = gm(&outbox);
        let first = started(&mut client, &outbox, SessionDescriptor::new(ids(&["a"])).with_dc(12)).await;

        let foreign = SessionDescriptor::new(ids(&["b"])).with_dc(8);
        let foreign_id = foreign.session_id;
        let reactions = client.handle(Envelope::dispatch(foreign)).await;
        assert_eq!(
            reactions[0],
            Reaction::Started {
                session_id: foreign_id,
                preempted: Some(first)
            }
        );
        assert!(!client.owns(first));
        assert_eq!(client.active().unwrap().session_id(), foreign_id);
    }

    #[tokio::test]
    async fn no_session_errors() {
        let outbox = Outbox::default();
        let mut client = gm(&outbox);
        assert!(matches!(
            client.force_complete().await,
            Err(SessionError::NoActiveSession)
        ));
        assert!(matches!(
            client.roll(&EntrantId::from("a"), RollMode::Normal).await,
            Err(SessionError::NoActiveSession)
        ));
        assert!(client.rollable_entrants().is_empty());
    }

    #[tokio::test]
    async fn malformed_frames_are_errors() {
        let outbox = Outbox::default();
        let mut client = gm(&outbox);
        assert!(matches!(
            client.handle_frame("{").await,
            Err(SessionError::Codec(_))
        ));
    }
}
