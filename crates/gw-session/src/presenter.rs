//! Presentation hooks: the suspension points around a session.
//!
//! The client awaits [`Presenter::intro`] before revealing roll controls
//! and [`Presenter::outro`] or [`Presenter::fade_out`] before closing the
//! replica. Anything that draws the overlay implements this trait; the
//! timed presenter below only waits.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use gw_core::SessionId;
use gw_mechanics::Verdict;

use crate::config::ClientConfig;
use crate::view::ReplicaView;

/// Renders a session's intro, tiles, and outro.
#[async_trait]
pub trait Presenter: Send {
    /// Play the intro. Roll controls appear once this returns.
    async fn intro(&mut self, view: &ReplicaView);

    /// Dismiss tiles, reveal the verdict, then fade.
    async fn outro(&mut self, view: &ReplicaView, verdict: &Verdict);

    /// Fade out without a verdict, for aborted sessions.
    async fn fade_out(&mut self, session_id: SessionId);

    /// Tile state changed.
    fn refresh(&mut self, _view: &ReplicaView) {}
}

/// Waits for the configured durations and draws nothing.
#[derive(Debug, Clone, Copy)]
pub struct TimedPresenter {
    intro: Duration,
    outro: Duration,
    fade: Duration,
}

impl TimedPresenter {
    /// Pace presentation after a client's configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            intro: config.intro,
            outro: config.outro,
            fade: config.fade,
        }
    }
}

#[async_trait]
impl Presenter for TimedPresenter {
    async fn intro(&mut self, _view: &ReplicaView) {
        sleep(self.intro).await;
    }

    async fn outro(&mut self, _view: &ReplicaView, _verdict: &Verdict) {
        sleep(self.outro + self.fade).await;
    }

    async fn fade_out(&mut self, _session_id: SessionId) {
        sleep(self.fade).await;
    }
}

/// Returns immediately from every hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPresenter;

#[async_trait]
impl Presenter for SilentPresenter {
    async fn intro(&mut self, _view: &ReplicaView) {}

    async fn outro(&mut self, _view: &ReplicaView, _verdict: &Verdict) {}

    async fn fade_out(&mut self, _session_id: SessionId) {}
}
