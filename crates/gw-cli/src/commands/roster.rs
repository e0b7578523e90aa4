use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use gw_core::{Ability, compute_modifier};

pub fn run(path: Option<&Path>, ability: Option<&str>, json: bool) -> Result<(), String> {
    let roster = super::load_roster(path)?;
    if json {
        let out = serde_json::to_string_pretty(&roster)
            .map_err(|e| format!("cannot serialize roster: {e}"))?;
        println!("{out}");
        return Ok(());
    }
    let key = ability.map(super::parse_ability).transpose()?;

    let mut header = vec!["ID".to_string(), "Name".to_string()];
    header.extend(Ability::ALL.iter().map(|a| a.key().to_uppercase()));
    if let Some(key) = key {
        header.push(key.to_string());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    for sheet in roster.sheets() {
        let mut row = vec![sheet.id.to_string(), sheet.name.clone()];
        row.extend(
            Ability::ALL
                .iter()
                .map(|a| super::signed(sheet.abilities.modifier(*a))),
        );
        if let Some(key) = key {
            row.push(super::signed(compute_modifier(&roster, &sheet.id, key)));
        }
        table.add_row(row);
    }

    println!(
        "  {} {}",
        "Roster".bold(),
        format!("({} entrants)", roster.len()).dimmed()
    );
    println!("{table}");
    Ok(())
}
