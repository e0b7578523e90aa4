//! Dice types, formulas, and rolling.
//!
//! A group check rolls one d20 per entrant, or two with keep-highest /
//! keep-lowest under advantage and disadvantage. The kept face decides
//! critical and fumble; the total adds the entrant's modifier.

pub mod formula;
pub mod roll;
pub mod roller;

pub use formula::{Keep, RollFormula, RollMode, build_roll_formula};
pub use roll::{FaceFlags, RawRoll, determine_kept_face};
pub use roller::{DiceRoller, ScriptedRoller, SeededRoller};

use serde::{Deserialize, Serialize};

/// A polyhedral die type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Die {
    /// Four-sided die.
    D4,
    /// Six-sided die.
    D6,
    /// Eight-sided die.
    D8,
    /// Ten-sided die.
    D10,
    /// Twelve-sided die.
    D12,
    /// Twenty-sided die.
    D20,
    /// Percentile die (1-100).
    D100,
    /// A die with a custom number of sides.
    Custom(u32),
}

impl Die {
    /// Returns the number of sides on this die.
    pub fn sides(self) -> u32 {
        match self {
            Self::D4 => 4,
            Self::D6 => 6,
            Self::D8 => 8,
            Self::D10 => 10,
            Self::D12 => 12,
            Self::D20 => 20,
            Self::D100 => 100,
            Self::Custom(n) => n,
        }
    }

    /// The die with `sides` faces, or `None` below two.
    pub fn from_sides(sides: u32) -> Option<Self> {
        match sides {
            0 | 1 => None,
            4 => Some(Self::D4),
            6 => Some(Self::D6),
            8 => Some(Self::D8),
            10 => Some(Self::D10),
            12 => Some(Self::D12),
            20 => Some(Self::D20),
            100 => Some(Self::D100),
            n => Some(Self::Custom(n)),
        }
    }
}

impl std::fmt::Display for Die {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "d{}", self.sides())
    }
}
