use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the six classic ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    /// Strength.
    Str,
    /// Dexterity.
    Dex,
    /// Constitution.
    Con,
    /// Intelligence.
    Int,
    /// Wisdom.
    Wis,
    /// Charisma.
    Cha,
}

impl Ability {
    /// All abilities in sheet order.
    pub const ALL: [Ability; 6] = [
        Self::Str,
        Self::Dex,
        Self::Con,
        Self::Int,
        Self::Wis,
        Self::Cha,
    ];

    /// Parse an ability from its short or long name ("dex", "Dexterity").
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "str" | "strength" => Some(Self::Str),
            "dex" | "dexterity" => Some(Self::Dex),
            "con" | "constitution" => Some(Self::Con),
            "int" | "intelligence" => Some(Self::Int),
            "wis" | "wisdom" => Some(Self::Wis),
            "cha" | "charisma" => Some(Self::Cha),
            _ => None,
        }
    }

    /// Short lowercase key ("str", "dex", ...).
    pub fn key(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Dex => "dex",
            Self::Con => "con",
            Self::Int => "int",
            Self::Wis => "wis",
            Self::Cha => "cha",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Str => "Strength",
            Self::Dex => "Dexterity",
            Self::Con => "Constitution",
            Self::Int => "Intelligence",
            Self::Wis => "Wisdom",
            Self::Cha => "Charisma",
        };
        write!(f, "{name}")
    }
}

/// A skill, each governed by a single ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Skill {
    Acrobatics,
    AnimalHandling,
    Arcana,
    Athletics,
    Deception,
    History,
    Insight,
    Intimidation,
    Investigation,
    Medicine,
    Nature,
    Perception,
    Performance,
    Persuasion,
    Religion,
    SleightOfHand,
    Stealth,
    Survival,
}

impl Skill {
    /// All skills in alphabetical order.
    pub const ALL: [Skill; 18] = [
        Self::Acrobatics,
        Self::AnimalHandling,
        Self::Arcana,
        Self::Athletics,
        Self::Deception,
        Self::History,
        Self::Insight,
        Self::Intimidation,
        Self::Investigation,
        Self::Medicine,
        Self::Nature,
        Self::Perception,
        Self::Performance,
        Self::Persuasion,
        Self::Religion,
        Self::SleightOfHand,
        Self::Stealth,
        Self::Survival,
    ];

    /// The ability this skill draws its modifier from.
    pub fn ability(self) -> Ability {
        match self {
            Self::Athletics => Ability::Str,
            Self::Acrobatics | Self::SleightOfHand | Self::Stealth => Ability::Dex,
            Self::Arcana
            | Self::History
            | Self::Investigation
            | Self::Nature
            | Self::Religion => Ability::Int,
            Self::AnimalHandling
            | Self::Insight
            | Self::Medicine
            | Self::Perception
            | Self::Survival => Ability::Wis,
            Self::Deception | Self::Intimidation | Self::Performance | Self::Persuasion => {
                Ability::Cha
            }
        }
    }

    /// Parse a skill name; spaces, dashes and underscores are interchangeable.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect();
        Self::ALL.into_iter().find(|skill| {
            skill
                .to_string()
                .to_lowercase()
                .chars()
                .filter(|c| *c != ' ')
                .eq(normalized.chars())
        })
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Acrobatics => "Acrobatics",
            Self::AnimalHandling => "Animal Handling",
            Self::Arcana => "Arcana",
            Self::Athletics => "Athletics",
            Self::Deception => "Deception",
            Self::History => "History",
            Self::Insight => "Insight",
            Self::Intimidation => "Intimidation",
            Self::Investigation => "Investigation",
            Self::Medicine => "Medicine",
            Self::Nature => "Nature",
            Self::Perception => "Perception",
            Self::Performance => "Performance",
            Self::Persuasion => "Persuasion",
            Self::Religion => "Religion",
            Self::SleightOfHand => "Sleight of Hand",
            Self::Stealth => "Stealth",
            Self::Survival => "Survival",
        };
        write!(f, "{name}")
    }
}

/// Which modifier a group check applies to every roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum AbilityKey {
    /// A bare die roll with no modifier.
    #[default]
    Flat,
    /// A raw ability check.
    Ability(Ability),
    /// A saving throw.
    Save(Ability),
    /// A skill check.
    Skill(Skill),
}

impl AbilityKey {
    /// Whether rolls under this key carry a modifier at all.
    pub fn has_modifier(self) -> bool {
        !matches!(self, Self::Flat)
    }

    /// Parse "flat", "dex", "save:wis" or a skill name such as "stealth".
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("flat") || s.eq_ignore_ascii_case("none") {
            return Some(Self::Flat);
        }
        if let Some(rest) = s.strip_prefix("save:").or_else(|| s.strip_prefix("save ")) {
            return Ability::parse(rest).map(Self::Save);
        }
        if let Some(ability) = Ability::parse(s) {
            return Some(Self::Ability(ability));
        }
        Skill::parse(s).map(Self::Skill)
    }
}

impl fmt::Display for AbilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => write!(f, "Flat Roll"),
            Self::Ability(a) => write!(f, "{a} Check"),
            Self::Save(a) => write!(f, "{a} Saving Throw"),
            Self::Skill(s) => write!(f, "{s} ({})", s.ability().key().to_uppercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_abilities() {
        assert_eq!(Ability::parse("dex"), Some(Ability::Dex));
        assert_eq!(Ability::parse("Wisdom"), Some(Ability::Wis));
        assert_eq!(Ability::parse("luck"), None);
    }

    #[test]
    fn parse_skills() {
        assert_eq!(Skill::parse("stealth"), Some(Skill::Stealth));
        assert_eq!(Skill::parse("sleight-of-hand"), Some(Skill::SleightOfHand));
        assert_eq!(Skill::parse("Animal Handling"), Some(Skill::AnimalHandling));
        assert_eq!(Skill::parse("juggling"), None);
    }

    #[test]
    fn skills_map_to_abilities() {
        assert_eq!(Skill::Athletics.ability(), Ability::Str);
        assert_eq!(Skill::Perception.ability(), Ability::Wis);
        assert_eq!(Skill::Persuasion.ability(), Ability::Cha);
    }

    #[test]
    fn parse_keys() {
        assert_eq!(AbilityKey::parse("flat"), Some(AbilityKey::Flat));
        assert_eq!(AbilityKey::parse("con"), Some(AbilityKey::Ability(Ability::Con)));
        assert_eq!(AbilityKey::parse("save:wis"), Some(AbilityKey::Save(Ability::Wis)));
        assert_eq!(
            AbilityKey::parse("perception"),
            Some(AbilityKey::Skill(Skill::Perception))
        );
        assert_eq!(AbilityKey::parse("save:luck"), None);
    }

    #[test]
    fn key_display() {
        assert_eq!(AbilityKey::Flat.to_string(), "Flat Roll");
        assert_eq!(AbilityKey::Save(Ability::Dex).to_string(), "Dexterity Saving Throw");
        assert_eq!(AbilityKey::Skill(Skill::Stealth).to_string(), "Stealth (DEX)");
    }

    #[test]
    fn flat_has_no_modifier() {
        assert!(!AbilityKey::Flat.has_modifier());
        assert!(AbilityKey::Ability(Ability::Str).has_modifier());
    }
}
