//! Render snapshots handed to the presentation layer.

use gw_core::{EntrantId, Role, SessionId};

use crate::entrant::EntrantState;
use crate::replica::Phase;

/// What one tile shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileView {
    /// Entrant reference.
    pub id: EntrantId,
    /// Display name.
    pub name: String,
    /// Portrait.
    pub image: Option<String>,
    /// Actor or contestant.
    pub role: Role,
    /// Modifier shown next to the roll button.
    pub modifier: i32,
    /// Result total once rolled.
    pub total: Option<i32>,
    /// Critical success.
    pub crit: bool,
    /// Fumble.
    pub fumble: bool,
    /// A local roll is in flight.
    pub pending: bool,
    /// Some client announced it is rolling.
    pub rolling: bool,
}

impl From<&EntrantState> for TileView {
    fn from(e: &EntrantState) -> Self {
        let result = e.result();
        Self {
            id: e.id.clone(),
            name: e.display.name.clone(),
            image: e.display.image.clone(),
            role: e.role,
            modifier: e.modifier,
            total: result.map(|r| r.total),
            crit: result.is_some_and(|r| r.crit),
            fumble: result.is_some_and(|r| r.fumble),
            pending: e.is_pending(),
            rolling: e.is_rolling(),
        }
    }
}

/// What the overlay shows as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaView {
    /// Session being shown.
    pub session_id: SessionId,
    /// Overlay title.
    pub title: String,
    /// Current phase.
    pub phase: Phase,
    /// DC, if this viewer may see it.
    pub dc: Option<i32>,
    /// Tiles in display order.
    pub tiles: Vec<TileView>,
}

impl ReplicaView {
    /// Tiles for one side of the check.
    pub fn tiles_for(&self, role: Role) -> impl Iterator<Item = &TileView> {
        self.tiles.iter().filter(move |t| t.role == role)
    }

    /// Number of tiles still waiting for a result.
    pub fn outstanding(&self) -> usize {
        self.tiles.iter().filter(|t| t.total.is_none()).count()
    }
}
