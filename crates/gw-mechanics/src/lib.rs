//! Dice and verdict mechanics for Gruppenwurf group checks.
//!
//! Provides roll formulas (normal, advantage, disadvantage), the kept-face
//! rules behind critical and fumble detection, a [`DiceRoller`] seam with a
//! seeded implementation, and the pure verdict engine that turns a finished
//! set of results into success or failure.

pub mod dice;
pub mod error;
pub mod resolution;

pub use dice::{
    DiceRoller, Die, FaceFlags, Keep, RawRoll, RollFormula, RollMode, ScriptedRoller,
    SeededRoller, build_roll_formula, determine_kept_face,
};
pub use error::{MechError, MechResult};
pub use resolution::{SuccessRule, Verdict, compute_verdict};
