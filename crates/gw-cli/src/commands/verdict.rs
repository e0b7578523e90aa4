use std::collections::HashMap;

use colored::Colorize;

use gw_core::{EntrantId, SessionDescriptor, Visibility};
use gw_mechanics::{SuccessRule, compute_verdict};

pub fn run(
    actors: &[i32],
    contestants: &[i32],
    dc: Option<i32>,
    average: bool,
) -> Result<(), String> {
    if actors.is_empty() {
        return Err("at least one actor total is required".into());
    }

    let actor_ids: Vec<EntrantId> = (1..=actors.len())
        .map(|i| EntrantId::new(format!("actor-{i}")))
        .collect();
    let contestant_ids: Vec<EntrantId> = (1..=contestants.len())
        .map(|i| EntrantId::new(format!("contestant-{i}")))
        .collect();

    let mut descriptor = SessionDescriptor::new(actor_ids.clone())
        .with_contestants(contestant_ids.clone())
        .with_visibility(Visibility {
            use_average: average,
            ..Visibility::default()
        });
    if let Some(dc) = dc {
        descriptor = descriptor.with_dc(dc);
    }

    let results: HashMap<EntrantId, i32> = actor_ids
        .into_iter()
        .zip(actors.iter().copied())
        .chain(contestant_ids.into_iter().zip(contestants.iter().copied()))
        .collect();
    let verdict = compute_verdict(&descriptor, &results);

    let source = if descriptor.is_contested() {
        "contestant average"
    } else {
        "DC"
    };
    match verdict.threshold {
        Some(t) => println!("  Threshold: {t:.1} ({source})"),
        None => println!("  Threshold: {}", "none".dimmed()),
    }
    if let Some(avg) = verdict.actor_average {
        println!("  Actor average: {avg:.1}");
    }
    if verdict.rule == SuccessRule::Majority && verdict.threshold.is_some() {
        println!(
            "  Passes: {}/{} ({} needed)",
            verdict.passes,
            actors.len(),
            verdict.required
        );
    }

    let label = match verdict.success {
        Some(true) => "Success".green().bold(),
        Some(false) => "Failure".red().bold(),
        None => "Undecided".yellow().bold(),
    };
    println!("  Verdict: {label} ({} rule)", verdict.rule);
    Ok(())
}
