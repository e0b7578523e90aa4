//! Configuration for one connected client.

use std::time::Duration;

use gw_core::EntrantId;

/// Who this client is and how it paces its presentation.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Display name of the local user.
    pub name: String,
    /// Privileged users may dispatch, force-complete, abort, and roll for anyone.
    pub privileged: bool,
    /// Entrants the local user may roll for.
    pub controls: Vec<EntrantId>,
    /// RNG seed for the default roller.
    pub seed: u64,
    /// How long the intro sequence runs before roll controls appear.
    pub intro: Duration,
    /// How long the outro (tile dismissal and verdict reveal) runs.
    pub outro: Duration,
    /// How long the final fade-out runs.
    pub fade: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: "player".to_string(),
            privileged: false,
            controls: Vec::new(),
            seed: 42,
            intro: Duration::from_millis(1500),
            outro: Duration::from_millis(2500),
            fade: Duration::from_millis(500),
        }
    }
}

impl ClientConfig {
    /// Set the user name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Mark the local user as privileged.
    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    /// Set the entrants the local user controls.
    pub fn with_controls(mut self, controls: impl IntoIterator<Item = EntrantId>) -> Self {
        self.controls = controls.into_iter().collect();
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set intro, outro and fade durations.
    pub fn with_timings(mut self, intro: Duration, outro: Duration, fade: Duration) -> Self {
        self.intro = intro;
        self.outro = outro;
        self.fade = fade;
        self
    }

    /// Skip all presentation delays.
    pub fn instant(self) -> Self {
        self.with_timings(Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }

    /// Whether the local user may roll for `id`.
    pub fn may_roll(&self, id: &EntrantId) -> bool {
        self.privileged || self.controls.contains(id)
    }
}
