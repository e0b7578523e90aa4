//! Roll results, kept faces, and critical/fumble detection.

use serde::{Deserialize, Serialize};

use super::Die;
use super::formula::{Keep, RollFormula, RollMode};

/// The face that counts for critical/fumble detection.
///
/// Normal rolls use the single die; advantage keeps the highest face and
/// disadvantage the lowest. Returns `None` when no dice were rolled.
pub fn determine_kept_face(faces: &[u32], mode: RollMode) -> Option<u32> {
    match mode {
        RollMode::Normal => faces.first().copied(),
        RollMode::Advantage => faces.iter().copied().max(),
        RollMode::Disadvantage => faces.iter().copied().min(),
    }
}

/// Critical and fumble markers for a kept face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FaceFlags {
    /// The kept face is the die's maximum.
    pub crit: bool,
    /// The kept face is a 1.
    pub fumble: bool,
}

impl FaceFlags {
    /// Classify a kept face rolled on `die`.
    pub fn classify(kept: u32, die: Die) -> Self {
        Self {
            crit: kept == die.sides(),
            fumble: kept == 1,
        }
    }
}

/// The outcome of evaluating one formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRoll {
    /// The formula that was rolled.
    pub formula: RollFormula,
    /// Every face rolled, in roll order, including dropped dice.
    pub faces: Vec<u32>,
    /// Kept faces plus the modifier.
    pub total: i32,
}

impl RawRoll {
    /// Evaluate a formula against already-rolled faces.
    pub fn from_faces(formula: RollFormula, faces: Vec<u32>) -> Self {
        let kept_sum: u64 = match formula.keep {
            Keep::All => faces.iter().copied().map(u64::from).sum(),
            Keep::Highest => faces.iter().copied().max().map_or(0, u64::from),
            Keep::Lowest => faces.iter().copied().min().map_or(0, u64::from),
        };
        let total = i32::try_from(kept_sum)
            .unwrap_or(i32::MAX)
            .saturating_add(formula.modifier);
        Self {
            formula,
            faces,
            total,
        }
    }

    /// The face counting for critical/fumble detection.
    pub fn kept_face(&self) -> Option<u32> {
        determine_kept_face(&self.faces, self.formula.mode())
    }

    /// Critical and fumble flags for this roll.
    pub fn flags(&self) -> FaceFlags {
        self.kept_face()
            .map(|kept| FaceFlags::classify(kept, self.formula.die))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for RawRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values: Vec<String> = self.faces.iter().map(|v| v.to_string()).collect();
        write!(f, "{} [{}] = {}", self.formula, values.join(", "), self.total)
    }
}
