use serde::{Deserialize, Serialize};

use crate::ability::{Ability, AbilityKey, Skill};
use crate::error::CoreResult;
use crate::id::EntrantId;

/// Name and portrait shown on an entrant's tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayInfo {
    /// Display name.
    pub name: String,
    /// Portrait path or URL.
    pub image: Option<String>,
}

impl DisplayInfo {
    /// Placeholder used when an entrant cannot be resolved.
    pub fn placeholder() -> Self {
        Self {
            name: "Unknown".to_string(),
            image: None,
        }
    }
}

/// Source of entrant display data and modifiers.
///
/// Lookups may fail for references the directory does not know; callers
/// degrade to placeholder data and a zero modifier rather than erroring.
pub trait EntrantDirectory: Send + Sync {
    /// The modifier `id` adds to a roll under `key`.
    fn modifier(&self, id: &EntrantId, key: AbilityKey) -> Option<i32>;

    /// Name and portrait for `id`.
    fn display_info(&self, id: &EntrantId) -> Option<DisplayInfo>;
}

/// The modifier an entrant adds under `key`; 0 for flat rolls and unknown entrants.
pub fn compute_modifier(directory: &dyn EntrantDirectory, id: &EntrantId, key: AbilityKey) -> i32 {
    if !key.has_modifier() {
        return 0;
    }
    directory.modifier(id, key).unwrap_or(0)
}

/// Display data for `id`, or the placeholder.
pub fn display_or_placeholder(directory: &dyn EntrantDirectory, id: &EntrantId) -> DisplayInfo {
    directory
        .display_info(id)
        .unwrap_or_else(DisplayInfo::placeholder)
}

/// The six ability scores of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct AbilityScores {
    pub str: i32,
    pub dex: i32,
    pub con: i32,
    pub int: i32,
    pub wis: i32,
    pub cha: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            str: 10,
            dex: 10,
            con: 10,
            int: 10,
            wis: 10,
            cha: 10,
        }
    }
}

impl AbilityScores {
    /// The raw score for an ability.
    pub fn score(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Str => self.str,
            Ability::Dex => self.dex,
            Ability::Con => self.con,
            Ability::Int => self.int,
            Ability::Wis => self.wis,
            Ability::Cha => self.cha,
        }
    }

    /// The ability modifier: `floor((score - 10) / 2)`.
    pub fn modifier(&self, ability: Ability) -> i32 {
        (self.score(ability) - 10).div_euclid(2)
    }
}

/// A minimal character sheet: enough to derive check modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrantSheet {
    /// Reference used in session descriptors.
    pub id: EntrantId,
    /// Display name.
    pub name: String,
    /// Portrait path or URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Ability scores.
    #[serde(default)]
    pub abilities: AbilityScores,
    /// Proficiency bonus added to proficient saves and skills.
    #[serde(default = "default_proficiency")]
    pub proficiency: i32,
    /// Saving throws the entrant is proficient in.
    #[serde(default)]
    pub saves: Vec<Ability>,
    /// Skills the entrant is proficient in.
    #[serde(default)]
    pub skills: Vec<Skill>,
    /// Skills that add double proficiency.
    #[serde(default)]
    pub expertise: Vec<Skill>,
}

fn default_proficiency() -> i32 {
    2
}

impl EntrantSheet {
    /// Create a sheet with average scores and no proficiencies.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: EntrantId::new(id),
            name: name.into(),
            image: None,
            abilities: AbilityScores::default(),
            proficiency: default_proficiency(),
            saves: Vec::new(),
            skills: Vec::new(),
            expertise: Vec::new(),
        }
    }

    /// Set the ability scores.
    pub fn with_abilities(mut self, abilities: AbilityScores) -> Self {
        self.abilities = abilities;
        self
    }

    /// Add a proficient saving throw.
    pub fn with_save(mut self, ability: Ability) -> Self {
        self.saves.push(ability);
        self
    }

    /// Add a proficient skill.
    pub fn with_skill(mut self, skill: Skill) -> Self {
        self.skills.push(skill);
        self
    }

    /// The modifier this sheet adds under `key`.
    pub fn modifier(&self, key: AbilityKey) -> i32 {
        match key {
            AbilityKey::Flat => 0,
            AbilityKey::Ability(a) => self.abilities.modifier(a),
            AbilityKey::Save(a) => {
                let prof = if self.saves.contains(&a) {
                    self.proficiency
                } else {
                    0
                };
                self.abilities.modifier(a) + prof
            }
            AbilityKey::Skill(s) => {
                let prof = if self.expertise.contains(&s) {
                    self.proficiency * 2
                } else if self.skills.contains(&s) {
                    self.proficiency
                } else {
                    0
                };
                self.abilities.modifier(s.ability()) + prof
            }
        }
    }
}

/// An in-memory directory of entrant sheets, loadable from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    entrants: Vec<EntrantSheet>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a roster from `{"entrants": [...]}` JSON.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add or replace a sheet.
    pub fn insert(&mut self, sheet: EntrantSheet) {
        match self.entrants.iter_mut().find(|s| s.id == sheet.id) {
            Some(existing) => *existing = sheet,
            None => self.entrants.push(sheet),
        }
    }

    /// Builder form of [`Roster::insert`].
    pub fn with(mut self, sheet: EntrantSheet) -> Self {
        self.insert(sheet);
        self
    }

    /// Look up a sheet by reference.
    pub fn get(&self, id: &EntrantId) -> Option<&EntrantSheet> {
        self.entrants.iter().find(|s| &s.id == id)
    }

    /// Find a sheet by case-insensitive name or exact reference.
    pub fn find(&self, name_or_id: &str) -> Option<&EntrantSheet> {
        self.entrants
            .iter()
            .find(|s| s.id.as_str() == name_or_id || s.name.eq_ignore_ascii_case(name_or_id))
    }

    /// All sheets in insertion order.
    pub fn sheets(&self) -> &[EntrantSheet] {
        &self.entrants
    }

    /// Number of sheets.
    pub fn len(&self) -> usize {
        self.entrants.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.entrants.is_empty()
    }
}

impl EntrantDirectory for Roster {
    fn modifier(&self, id: &EntrantId, key: AbilityKey) -> Option<i32> {
        self.get(id).map(|sheet| sheet.modifier(key))
    }

    fn display_info(&self, id: &EntrantId) -> Option<DisplayInfo> {
        self.get(id).map(|sheet| DisplayInfo {
            name: sheet.name.clone(),
            image: sheet.image.clone(),
        })
    }
}
