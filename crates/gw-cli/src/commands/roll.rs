use colored::Colorize;

use gw_mechanics::{RollFormula, SeededRoller, build_roll_formula};

pub fn run(
    formula: Option<&str>,
    mode: &str,
    modifier: Option<i32>,
    times: u32,
    seed: u64,
) -> Result<(), String> {
    let formula: RollFormula = match formula {
        Some(text) => text.parse().map_err(|e| format!("{e}"))?,
        None => build_roll_formula(super::parse_mode(mode)?, modifier),
    };

    let mut roller = SeededRoller::new(seed);
    println!(
        "  {} {formula} {}",
        "Rolling".bold(),
        format!("(seed={seed})").dimmed()
    );
    for _ in 0..times.max(1) {
        let roll = roller.roll_now(&formula);
        let flags = roll.flags();
        let note = if flags.crit {
            format!(" {}", "critical".green().bold())
        } else if flags.fumble {
            format!(" {}", "fumble".red().bold())
        } else {
            String::new()
        };
        println!("  {roll}{note}");
    }
    Ok(())
}
