//! Roll formulas: `NdX`, optionally keep-highest/lowest, plus a flat modifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Die;
use crate::error::{MechError, MechResult};

/// How an entrant's single roll is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollMode {
    /// One die.
    #[default]
    Normal,
    /// Two dice, keep the highest.
    Advantage,
    /// Two dice, keep the lowest.
    Disadvantage,
}

impl RollMode {
    /// Parse "normal", "adv"/"advantage", "dis"/"disadvantage".
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" | "n" => Some(Self::Normal),
            "advantage" | "adv" | "a" => Some(Self::Advantage),
            "disadvantage" | "dis" | "d" => Some(Self::Disadvantage),
            _ => None,
        }
    }

    /// How many dice this mode rolls.
    pub fn dice_count(self) -> u32 {
        match self {
            Self::Normal => 1,
            Self::Advantage | Self::Disadvantage => 2,
        }
    }

    fn keep(self) -> Keep {
        match self {
            Self::Normal => Keep::All,
            Self::Advantage => Keep::Highest,
            Self::Disadvantage => Keep::Lowest,
        }
    }
}

impl fmt::Display for RollMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Advantage => write!(f, "advantage"),
            Self::Disadvantage => write!(f, "disadvantage"),
        }
    }
}

/// Which rolled faces count toward the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keep {
    /// Sum every die.
    All,
    /// Keep only the single highest die.
    Highest,
    /// Keep only the single lowest die.
    Lowest,
}

/// A parsed or constructed roll formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollFormula {
    /// Number of dice rolled.
    pub count: u32,
    /// The die type.
    pub die: Die,
    /// Which faces count.
    pub keep: Keep,
    /// Flat modifier added to the kept faces.
    pub modifier: i32,
}

/// Build the d20 formula for one entrant's roll.
///
/// `modifier` is `None` for flat rolls; `Some(0)` still rolls as a
/// modified check but prints without a trailing `+ 0`.
pub fn build_roll_formula(mode: RollMode, modifier: Option<i32>) -> RollFormula {
    RollFormula {
        count: mode.dice_count(),
        die: Die::D20,
        keep: mode.keep(),
        modifier: modifier.unwrap_or(0),
    }
}

impl RollFormula {
    /// The check mode this formula corresponds to.
    pub fn mode(&self) -> RollMode {
        match self.keep {
            Keep::All => RollMode::Normal,
            Keep::Highest => RollMode::Advantage,
            Keep::Lowest => RollMode::Disadvantage,
        }
    }
}

impl fmt::Display for RollFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.die)?;
        match self.keep {
            Keep::All => {}
            Keep::Highest => write!(f, "kh")?,
            Keep::Lowest => write!(f, "kl")?,
        }
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, " + {m}"),
            m => write!(f, " - {}", m.unsigned_abs()),
        }
    }
}

impl FromStr for RollFormula {
    type Err = MechError;

    fn from_str(s: &str) -> MechResult<Self> {
        let invalid = |reason: &str| MechError::InvalidFormula {
            formula: s.to_string(),
            reason: reason.to_string(),
        };

        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        let (dice_part, modifier) = match compact.find(['+', '-']) {
            Some(idx) => {
                let (dice, modifier) = compact.split_at(idx);
                let value = modifier
                    .parse::<i32>()
                    .map_err(|_| invalid("modifier is not a number"))?;
                (dice, value)
            }
            None => (compact.as_str(), 0),
        };

        let (count_str, rest) = dice_part
            .split_once('d')
            .ok_or_else(|| invalid("missing die, expected e.g. 1d20"))?;
        let count = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse::<u32>()
                .map_err(|_| invalid("dice count is not a number"))?
        };
        if !(1..=100).contains(&count) {
            return Err(invalid("dice count must be between 1 and 100"));
        }

        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (sides_str, keep_str) = rest.split_at(digits_end);
        let die = sides_str
            .parse::<u32>()
            .ok()
            .and_then(Die::from_sides)
            .ok_or_else(|| invalid("die needs at least two sides"))?;

        let keep = match keep_str {
            "" => Keep::All,
            "kh" | "kh1" => Keep::Highest,
            "kl" | "kl1" => Keep::Lowest,
            _ => return Err(invalid("unknown suffix, expected kh or kl")),
        };
        if keep != Keep::All && count < 2 {
            return Err(invalid("keep-highest/lowest needs at least two dice"));
        }

        Ok(Self {
            count,
            die,
            keep,
            modifier,
        })
    }
}
