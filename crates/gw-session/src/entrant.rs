//! Per-entrant tile state inside a replica.

use gw_core::{DisplayInfo, EntrantId, Role};
use gw_mechanics::RollMode;

use crate::protocol::ResultPayload;

/// A finished roll as recorded on a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrantResult {
    /// Kept faces plus modifier.
    pub total: i32,
    /// The modifier included in `total`.
    pub modifier: i32,
    /// Critical success on the kept face.
    pub crit: bool,
    /// Fumble on the kept face.
    pub fumble: bool,
    /// How the roll was made.
    pub mode: RollMode,
    /// All faces rolled.
    pub faces: Vec<u32>,
}

impl From<&ResultPayload> for EntrantResult {
    fn from(p: &ResultPayload) -> Self {
        Self {
            total: p.total,
            modifier: p.modifier,
            crit: p.is_crit,
            fumble: p.is_fumble,
            mode: p.roll_mode,
            faces: p.dice_faces.clone(),
        }
    }
}

/// One actor's or contestant's tile.
///
/// `result` is write-once: the first applied result sticks for the life of
/// the session. `pending` is local only and never broadcast; `rolling`
/// mirrors the advisory TOGGLE messages.
#[derive(Debug, Clone)]
pub struct EntrantState {
    /// The entrant reference.
    pub id: EntrantId,
    /// Actor or contestant.
    pub role: Role,
    /// Name and portrait, or a placeholder.
    pub display: DisplayInfo,
    /// Modifier this client computed for the session's ability key.
    pub modifier: i32,
    /// Mode the local user picked for the next roll.
    pub roll_mode: RollMode,
    result: Option<EntrantResult>,
    pending: bool,
    rolling: bool,
}

impl EntrantState {
    /// A tile with no result yet.
    pub fn new(id: EntrantId, role: Role, display: DisplayInfo, modifier: i32) -> Self {
        Self {
            id,
            role,
            display,
            modifier,
            roll_mode: RollMode::Normal,
            result: None,
            pending: false,
            rolling: false,
        }
    }

    /// The recorded result, if any.
    pub fn result(&self) -> Option<&EntrantResult> {
        self.result.as_ref()
    }

    /// Whether a result has been recorded.
    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// Whether a local roll is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Whether some client announced it is rolling.
    pub fn is_rolling(&self) -> bool {
        self.rolling
    }

    /// Record a result unless one is already present. Returns whether it stuck.
    pub(crate) fn record(&mut self, result: EntrantResult) -> bool {
        if self.result.is_some() {
            return false;
        }
        self.result = Some(result);
        self.pending = false;
        self.rolling = false;
        true
    }

    pub(crate) fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }

    /// Resolved entrants ignore toggles so a late TOGGLE cannot re-enable a spinner.
    pub(crate) fn set_rolling(&mut self, rolling: bool) -> bool {
        if self.result.is_some() || self.rolling == rolling {
            return false;
        }
        self.rolling = rolling;
        true
    }
}
