//! The roll primitive: formula in, faces and total out.

use std::collections::VecDeque;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::formula::RollFormula;
use super::roll::RawRoll;
use crate::error::{MechError, MechResult};

/// Anything that can evaluate a roll formula.
///
/// Rolling is asynchronous so implementations can wait on animated dice
/// or a remote randomness source.
#[async_trait]
pub trait DiceRoller: Send {
    /// Roll every die in `formula` and total the kept faces.
    async fn roll(&mut self, formula: &RollFormula) -> MechResult<RawRoll>;
}

/// A local roller backed by a seeded RNG.
#[derive(Debug, Clone)]
pub struct SeededRoller {
    rng: StdRng,
}

impl SeededRoller {
    /// Create a roller with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Roll synchronously.
    pub fn roll_now(&mut self, formula: &RollFormula) -> RawRoll {
        let sides = formula.die.sides();
        let faces = (0..formula.count)
            .map(|_| self.rng.random_range(1..=sides))
            .collect();
        RawRoll::from_faces(*formula, faces)
    }
}

#[async_trait]
impl DiceRoller for SeededRoller {
    async fn roll(&mut self, formula: &RollFormula) -> MechResult<RawRoll> {
        Ok(self.roll_now(formula))
    }
}

/// A roller that replays prepared faces, one set per roll.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRoller {
    script: VecDeque<Vec<u32>>,
}

impl ScriptedRoller {
    /// Create a roller from face sets consumed in order.
    pub fn new(script: impl IntoIterator<Item = Vec<u32>>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// Queue another face set.
    pub fn push(&mut self, faces: Vec<u32>) {
        self.script.push_back(faces);
    }

    /// How many face sets remain.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

#[async_trait]
impl DiceRoller for ScriptedRoller {
    async fn roll(&mut self, formula: &RollFormula) -> MechResult<RawRoll> {
        let faces = self.script.pop_front().ok_or(MechError::ScriptExhausted)?;
        Ok(RawRoll::from_faces(*formula, faces))
    }
}
