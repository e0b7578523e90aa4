pub mod roll;
pub mod roster;
pub mod simulate;
pub mod verdict;

use std::fs;
use std::path::Path;

use gw_core::{Ability, AbilityKey, AbilityScores, EntrantSheet, Roster, Skill};
use gw_mechanics::RollMode;

/// Load a roster file, or the demo party when no path is given.
fn load_roster(path: Option<&Path>) -> Result<Roster, String> {
    let Some(path) = path else {
        return Ok(demo_roster());
    };
    let json = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let roster = Roster::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))?;
    if roster.is_empty() {
        return Err(format!("{}: roster has no entrants", path.display()));
    }
    Ok(roster)
}

fn scores(str: i32, dex: i32, con: i32, int: i32, wis: i32, cha: i32) -> AbilityScores {
    AbilityScores {
        str,
        dex,
        con,
        int,
        wis,
        cha,
    }
}

/// Four adventurers and two ogres.
fn demo_roster() -> Roster {
    Roster::new()
        .with(
            EntrantSheet::new("Actor.kael", "Kael Stormborn")
                .with_abilities(scores(16, 12, 14, 10, 11, 13))
                .with_save(Ability::Str)
                .with_save(Ability::Con)
                .with_skill(Skill::Athletics),
        )
        .with(
            EntrantSheet::new("Actor.mira", "Mira Quickfoot")
                .with_abilities(scores(8, 18, 12, 13, 12, 14))
                .with_save(Ability::Dex)
                .with_skill(Skill::Stealth)
                .with_skill(Skill::Acrobatics),
        )
        .with(
            EntrantSheet::new("Actor.thorn", "Brother Thorn")
                .with_abilities(scores(12, 10, 13, 11, 17, 14))
                .with_save(Ability::Wis)
                .with_skill(Skill::Insight),
        )
        .with(
            EntrantSheet::new("Actor.elwen", "Elwen Ashgrove")
                .with_abilities(scores(9, 14, 12, 18, 13, 10))
                .with_save(Ability::Int)
                .with_skill(Skill::Arcana),
        )
        .with(
            EntrantSheet::new("Actor.ogre1", "Grisly Ogre")
                .with_abilities(scores(19, 8, 16, 5, 7, 7)),
        )
        .with(
            EntrantSheet::new("Actor.ogre2", "Sullen Ogre")
                .with_abilities(scores(19, 8, 16, 5, 7, 7)),
        )
}

fn parse_mode(mode: &str) -> Result<RollMode, String> {
    RollMode::parse(mode)
        .ok_or_else(|| format!("unknown roll mode '{mode}' (expected normal, advantage or disadvantage)"))
}

fn parse_ability(key: &str) -> Result<AbilityKey, String> {
    AbilityKey::parse(key).ok_or_else(|| format!("unknown ability key '{key}'"))
}

fn signed(n: i32) -> String {
    if n >= 0 { format!("+{n}") } else { n.to_string() }
}
