//! Session descriptors: the immutable roster and rules of one group check.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ability::AbilityKey;
use crate::error::{CoreError, CoreResult};
use crate::id::{EntrantId, SessionId};

/// Which side of the check an entrant rolls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Rolls to meet the threshold.
    Actor,
    /// Rolls to set the threshold.
    Contestant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actor => write!(f, "actor"),
            Self::Contestant => write!(f, "contestant"),
        }
    }
}

/// Flags controlling what viewers see and how success is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visibility {
    /// Show the DC to non-privileged viewers.
    pub show_dc: bool,
    /// Replace entrant names with a placeholder in the recap.
    pub hide_names: bool,
    /// Judge by average-vs-threshold instead of majority pass.
    pub use_average: bool,
}

/// Everything every replica needs to build its copy of a session.
///
/// Created once by the coordinator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
    /// Generated at dispatch time.
    pub session_id: SessionId,
    /// Actors in display order.
    pub actor_refs: Vec<EntrantId>,
    /// Contestants in display order; when non-empty their average replaces the DC.
    #[serde(default)]
    pub contestant_refs: Vec<EntrantId>,
    /// Modifier selection for every roll.
    #[serde(default)]
    pub ability_key: AbilityKey,
    /// Fixed threshold, ignored when contestants are present.
    #[serde(default)]
    pub dc: Option<i32>,
    /// Visibility and judging flags.
    #[serde(default)]
    pub visibility: Visibility,
    /// Display override for the overlay title.
    #[serde(default)]
    pub label: Option<String>,
}

impl SessionDescriptor {
    /// Start a descriptor for the given actors with a fresh session ID.
    pub fn new(actor_refs: impl IntoIterator<Item = EntrantId>) -> Self {
        Self {
            session_id: SessionId::new(),
            actor_refs: actor_refs.into_iter().collect(),
            contestant_refs: Vec::new(),
            ability_key: AbilityKey::Flat,
            dc: None,
            visibility: Visibility::default(),
            label: None,
        }
    }

    /// Set the contestants whose average becomes the threshold.
    pub fn with_contestants(mut self, refs: impl IntoIterator<Item = EntrantId>) -> Self {
        self.contestant_refs = refs.into_iter().collect();
        self
    }

    /// Set the ability key.
    pub fn with_ability(mut self, key: AbilityKey) -> Self {
        self.ability_key = key;
        self
    }

    /// Set a fixed DC.
    pub fn with_dc(mut self, dc: i32) -> Self {
        self.dc = Some(dc);
        self
    }

    /// Set the visibility flags.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whether the threshold comes from contestants rather than the DC.
    pub fn is_contested(&self) -> bool {
        !self.contestant_refs.is_empty()
    }

    /// Iterate all entrants, actors first, each tagged with its role.
    pub fn entrants(&self) -> impl Iterator<Item = (&EntrantId, Role)> {
        self.actor_refs
            .iter()
            .map(|id| (id, Role::Actor))
            .chain(self.contestant_refs.iter().map(|id| (id, Role::Contestant)))
    }

    /// Total number of entrants.
    pub fn entrant_count(&self) -> usize {
        self.actor_refs.len() + self.contestant_refs.len()
    }

    /// The role of an entrant, or `None` if it is not part of this session.
    pub fn role_of(&self, id: &EntrantId) -> Option<Role> {
        self.entrants().find(|(e, _)| *e == id).map(|(_, role)| role)
    }

    /// The title shown on the overlay.
    pub fn title(&self) -> String {
        match &self.label {
            Some(label) if !label.trim().is_empty() => label.clone(),
            _ => self.ability_key.to_string(),
        }
    }

    /// The DC as a given viewer should see it.
    ///
    /// Privileged viewers always see a fixed DC; everyone else only when
    /// `show_dc` is set. Contested checks have no fixed DC to show.
    pub fn displayed_dc(&self, privileged: bool) -> Option<i32> {
        if self.is_contested() {
            return None;
        }
        if privileged || self.visibility.show_dc {
            self.dc
        } else {
            None
        }
    }

    /// Check the roster and threshold before dispatch.
    pub fn validate(&self) -> CoreResult<()> {
        if self.actor_refs.is_empty() {
            return Err(CoreError::NoActors);
        }
        let mut seen = HashSet::new();
        for (id, _) in self.entrants() {
            if !seen.insert(id) {
                return Err(CoreError::DuplicateEntrant(id.clone()));
            }
        }
        if !self.is_contested()
            && let Some(dc) = self.dc
            && dc <= 0
        {
            return Err(CoreError::InvalidDc(dc));
        }
        Ok(())
    }
}
