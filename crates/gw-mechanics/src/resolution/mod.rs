//! Verdicts for finished group checks.
//!
//! The threshold is the DC, or the average of the contestants' results
//! when the check is contested. Actors then pass either by majority
//! (at least half, rounded up, meet the threshold) or by average (the
//! actors' mean meets the threshold). Meeting the threshold counts as a
//! pass in both rules.

use std::collections::HashMap;
use std::fmt;

use gw_core::{EntrantId, SessionDescriptor};
use serde::{Deserialize, Serialize};

/// How the actors' results are judged against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessRule {
    /// At least `ceil(actors / 2)` actors meet the threshold.
    Majority,
    /// The actors' average meets the threshold.
    Average,
}

impl fmt::Display for SuccessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Majority => write!(f, "majority"),
            Self::Average => write!(f, "average"),
        }
    }
}

/// The judged outcome of a group check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Which rule was applied.
    pub rule: SuccessRule,
    /// The threshold results were compared against, if one could be set.
    pub threshold: Option<f64>,
    /// Mean of the actors that have results.
    pub actor_average: Option<f64>,
    /// Actors meeting the threshold.
    pub passes: usize,
    /// Passes needed under the majority rule.
    pub required: usize,
    /// `None` when no usable threshold exists.
    pub success: Option<bool>,
}

impl Verdict {
    /// Whether a success/failure badge should be shown at all.
    pub fn is_decided(&self) -> bool {
        self.success.is_some()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.success {
            Some(true) => write!(f, "Success"),
            Some(false) => write!(f, "Failure"),
            None => write!(f, "Undecided"),
        }
    }
}

fn average<'a>(values: impl Iterator<Item = &'a i32>) -> Option<f64> {
    let (sum, count) = values.fold((0i64, 0u32), |(sum, count), v| {
        (sum + i64::from(*v), count + 1)
    });
    (count > 0).then(|| sum as f64 / f64::from(count))
}

/// Judge a group check from whatever results have been collected.
///
/// Missing actor results simply do not count as passes (and are left out
/// of the average). A missing contestant result leaves the threshold, and
/// therefore the verdict, undefined.
pub fn compute_verdict(
    descriptor: &SessionDescriptor,
    results: &HashMap<EntrantId, i32>,
) -> Verdict {
    let rule = if descriptor.visibility.use_average {
        SuccessRule::Average
    } else {
        SuccessRule::Majority
    };

    let raw_threshold = if descriptor.is_contested() {
        let contestant_results: Option<Vec<i32>> = descriptor
            .contestant_refs
            .iter()
            .map(|id| results.get(id).copied())
            .collect();
        contestant_results.and_then(|values| average(values.iter()))
    } else {
        descriptor.dc.map(f64::from)
    };
    let threshold = raw_threshold.filter(|t| *t > 0.0);

    let actor_results: Vec<i32> = descriptor
        .actor_refs
        .iter()
        .filter_map(|id| results.get(id).copied())
        .collect();
    let actor_average = average(actor_results.iter());
    let required = descriptor.actor_refs.len().div_ceil(2);
    let passes = threshold.map_or(0, |t| {
        actor_results.iter().filter(|r| f64::from(**r) >= t).count()
    });

    let success = threshold.and_then(|t| match rule {
        SuccessRule::Average => actor_average.map(|avg| avg >= t),
        SuccessRule::Majority => Some(passes >= required),
    });

    Verdict {
        rule,
        threshold,
        actor_average,
        passes,
        required,
        success,
    }
}
