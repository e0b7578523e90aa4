//! The summary published once a session resolves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gw_core::{AbilityKey, Role, SessionId};
use gw_mechanics::{RollMode, SuccessRule, Verdict};

use crate::replica::SessionReplica;

/// One tile in the recap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecapEntry {
    /// Display name, or "Unknown" when names are hidden.
    pub name: String,
    /// Actor or contestant.
    pub role: Role,
    /// Result total; `None` if the session was forced before this entrant rolled.
    pub total: Option<i32>,
    /// Modifier applied.
    pub modifier: i32,
    /// Critical success.
    pub crit: bool,
    /// Fumble.
    pub fumble: bool,
    /// Roll mode used.
    pub mode: Option<RollMode>,
}

/// A resolved group check, ready for a chat log or a journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecapRecord {
    /// The session summarized.
    pub session_id: SessionId,
    /// Overlay title.
    pub title: String,
    /// Modifier selection.
    pub ability_key: AbilityKey,
    /// Fixed DC, only when it may be shown.
    pub dc: Option<i32>,
    /// Contestant average, for contested checks.
    pub threshold: Option<f64>,
    /// Judging rule.
    pub rule: SuccessRule,
    /// Every tile, actors first.
    pub entries: Vec<RecapEntry>,
    /// `None` when no verdict could be reached.
    pub success: Option<bool>,
    /// Ended by "force complete".
    pub forced: bool,
    /// When the record was built.
    pub created_at: DateTime<Utc>,
}

const HIDDEN_NAME: &str = "Unknown";

impl RecapRecord {
    /// Summarize a replica that resolved with `verdict`.
    pub fn from_replica(replica: &SessionReplica, verdict: &Verdict, forced: bool) -> Self {
        let descriptor = replica.descriptor();
        let hide_names = descriptor.visibility.hide_names;
        let entries = replica
            .entrants()
            .iter()
            .map(|e| {
                let result = e.result();
                RecapEntry {
                    name: if hide_names {
                        HIDDEN_NAME.to_string()
                    } else {
                        e.display.name.clone()
                    },
                    role: e.role,
                    total: result.map(|r| r.total),
                    modifier: result.map_or(e.modifier, |r| r.modifier),
                    crit: result.is_some_and(|r| r.crit),
                    fumble: result.is_some_and(|r| r.fumble),
                    mode: result.map(|r| r.mode),
                }
            })
            .collect();

        Self {
            session_id: replica.session_id(),
            title: descriptor.title(),
            ability_key: descriptor.ability_key,
            dc: descriptor.displayed_dc(false),
            threshold: if descriptor.is_contested() {
                verdict.threshold
            } else {
                None
            },
            rule: verdict.rule,
            entries,
            success: verdict.success,
            forced,
            created_at: Utc::now(),
        }
    }

    /// Headline outcome.
    pub fn outcome(&self) -> &'static str {
        match self.success {
            Some(true) => "Success",
            Some(false) => "Failure",
            None => "No verdict",
        }
    }

    fn threshold_line(&self) -> Option<String> {
        if let Some(dc) = self.dc {
            Some(format!("DC {dc}"))
        } else {
            self.threshold
                .map(|t| format!("contested, threshold {t:.1}"))
        }
    }

    fn entry_line(entry: &RecapEntry) -> String {
        let mut line = match entry.total {
            Some(total) => format!("{} ({}): {total}", entry.name, entry.role),
            None => format!("{} ({}): no roll", entry.name, entry.role),
        };
        if let Some(mode) = entry.mode
            && mode != RollMode::Normal
        {
            line.push_str(&format!(" [{mode}]"));
        }
        if entry.crit {
            line.push_str(" critical");
        }
        if entry.fumble {
            line.push_str(" fumble");
        }
        line
    }

    /// Export as markdown.
    pub fn export_markdown(&self) -> String {
        let mut out = format!("## {}\n\n", self.title);
        if let Some(line) = self.threshold_line() {
            out.push_str(&format!("*{line}, {} rule*\n\n", self.rule));
        } else {
            out.push_str(&format!("*{} rule*\n\n", self.rule));
        }
        for entry in &self.entries {
            out.push_str(&format!("- {}\n", Self::entry_line(entry)));
        }
        out.push('\n');
        out.push_str(&format!("**{}**", self.outcome()));
        if self.forced {
            out.push_str(" (forced)");
        }
        out.push('\n');
        out
    }

    /// Export as plain text.
    pub fn export_text(&self) -> String {
        let underline = "=".repeat(self.title.chars().count());
        let mut out = format!("{}\n{underline}\n", self.title);
        match self.threshold_line() {
            Some(line) => out.push_str(&format!("{line}, {} rule\n\n", self.rule)),
            None => out.push_str(&format!("{} rule\n\n", self.rule)),
        }
        for entry in &self.entries {
            out.push_str(&format!("  {}\n", Self::entry_line(entry)));
        }
        out.push('\n');
        out.push_str(&format!("Outcome: {}", self.outcome()));
        if self.forced {
            out.push_str(" (forced)");
        }
        out.push('\n');
        out
    }
}
