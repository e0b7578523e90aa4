use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::warn;

use gw_core::{EntrantDirectory, EntrantId, Role, Roster, SessionDescriptor, SessionId, Visibility};
use gw_mechanics::{RollMode, Verdict};
use gw_session::{
    Client, ClientConfig, LocalRelay, Phase, Presenter, RecapRecord, RelayInbox, ReplicaView,
    ResultPayload, TimedPresenter,
};

const DEFAULT_DC: i32 = 12;

/// Flags of the `simulate` subcommand.
pub struct SimulateOptions {
    pub roster: Option<PathBuf>,
    pub actors: Vec<String>,
    pub contestants: Vec<String>,
    pub ability: String,
    pub dc: Option<i32>,
    pub average: bool,
    pub hide_names: bool,
    pub show_dc: bool,
    pub mode: String,
    pub label: Option<String>,
    pub duplicate: bool,
    pub abort: bool,
    pub force_after: Option<usize>,
    pub seed: u64,
    pub pace: bool,
    pub export: Option<String>,
}

enum Export {
    Markdown,
    Text,
}

impl Export {
    fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Markdown),
            "text" | "txt" => Ok(Self::Text),
            other => Err(format!("unknown export format '{other}' (expected md or text)")),
        }
    }
}

/// How a session ended on one client.
#[derive(Clone, PartialEq)]
enum Outcome {
    Resolved(Verdict),
    Aborted,
}

/// Reports each client's ending to the command, optionally pacing like a real overlay.
struct Tally {
    client: String,
    tx: UnboundedSender<(String, Outcome)>,
    pace: Option<TimedPresenter>,
}

impl Tally {
    fn report(&self, outcome: Outcome) {
        if self.tx.send((self.client.clone(), outcome)).is_err() {
            warn!(client = %self.client, "outcome receiver dropped");
        }
    }
}

#[async_trait]
impl Presenter for Tally {
    async fn intro(&mut self, view: &ReplicaView) {
        if let Some(pace) = &mut self.pace {
            pace.intro(view).await;
        }
    }

    async fn outro(&mut self, view: &ReplicaView, verdict: &Verdict) {
        if let Some(pace) = &mut self.pace {
            pace.outro(view, verdict).await;
        }
        self.report(Outcome::Resolved(verdict.clone()));
    }

    async fn fade_out(&mut self, session_id: SessionId) {
        if let Some(pace) = &mut self.pace {
            pace.fade_out(session_id).await;
        }
        self.report(Outcome::Aborted);
    }
}

/// One simulated client and the entrants it rolls for.
struct Seat {
    client: Client,
    inbox: RelayInbox,
    mine: Vec<EntrantId>,
}

fn resolve(roster: &Roster, refs: &[String]) -> Result<Vec<EntrantId>, String> {
    refs.iter()
        .map(|r| {
            roster
                .find(r.trim())
                .map(|s| s.id.clone())
                .ok_or_else(|| format!("no entrant named '{}' in the roster", r.trim()))
        })
        .collect()
}

pub async fn run(opts: SimulateOptions) -> Result<(), String> {
    let roster = super::load_roster(opts.roster.as_deref())?;
    let mode = super::parse_mode(&opts.mode)?;
    let ability = super::parse_ability(&opts.ability)?;
    let export = opts.export.as_deref().map(Export::parse).transpose()?;

    let contestants = resolve(&roster, &opts.contestants)?;
    let actors = if opts.actors.is_empty() {
        roster
            .sheets()
            .iter()
            .map(|s| s.id.clone())
            .filter(|id| !contestants.contains(id))
            .collect()
    } else {
        resolve(&roster, &opts.actors)?
    };

    let mut descriptor = SessionDescriptor::new(actors.clone())
        .with_contestants(contestants.clone())
        .with_ability(ability)
        .with_visibility(Visibility {
            show_dc: opts.show_dc,
            hide_names: opts.hide_names,
            use_average: opts.average,
        });
    if contestants.is_empty() {
        descriptor = descriptor.with_dc(opts.dc.unwrap_or(DEFAULT_DC));
    }
    if let Some(label) = &opts.label {
        descriptor = descriptor.with_label(label.clone());
    }
    descriptor.validate().map_err(|e| e.to_string())?;

    let directory: Arc<dyn EntrantDirectory> = Arc::new(roster.clone());
    let relay = if opts.duplicate {
        LocalRelay::default().with_duplicates()
    } else {
        LocalRelay::default()
    };
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
    let (recap_tx, mut recap_rx) = mpsc::unbounded_channel::<RecapRecord>();

    let seat = |config: ClientConfig, mine: Vec<EntrantId>| {
        let config = if opts.pace { config } else { config.instant() };
        let (link, inbox) = relay.connect();
        let tally = Tally {
            client: config.name.clone(),
            tx: outcome_tx.clone(),
            pace: opts.pace.then(|| TimedPresenter::from_config(&config)),
        };
        let client = Client::new(config, link, Arc::clone(&directory)).with_presenter(tally);
        Seat {
            client,
            inbox,
            mine,
        }
    };

    let gm_config = ClientConfig::default()
        .with_name("gm")
        .privileged()
        .with_seed(opts.seed);
    let gm = seat(gm_config, contestants.clone());
    let mut seats = vec![Seat {
        client: gm.client.with_recap_sink(recap_tx),
        ..gm
    }];
    for (i, actor) in actors.iter().enumerate() {
        let config = ClientConfig::default()
            .with_name(actor.as_str())
            .with_controls([actor.clone()])
            .with_seed(opts.seed.wrapping_add(i as u64 + 1));
        seats.push(seat(config, vec![actor.clone()]));
    }
    drop(outcome_tx);

    let session = seats[0]
        .client
        .dispatch(descriptor.clone())
        .map_err(|e| e.to_string())?;

    let mut rolls: HashMap<EntrantId, ResultPayload> = HashMap::new();
    let mut ended_by_gm = false;
    loop {
        let mut progressed = false;

        for seat in seats.iter_mut() {
            for frame in seat.inbox.poll() {
                progressed = true;
                if let Err(e) = seat.client.handle_frame(&frame).await {
                    warn!(client = %seat.client.config().name, %e, "bad frame");
                }
            }
        }

        let gm = &mut seats[0].client;
        let live = gm
            .active()
            .filter(|r| r.phase() == Phase::Active)
            .map(|r| (r.results().len(), r.is_complete()));
        if !ended_by_gm && let Some((results, complete)) = live {
            if opts.abort {
                gm.abort().await.map_err(|e| e.to_string())?;
                ended_by_gm = true;
                progressed = true;
            } else if let Some(n) = opts.force_after
                && results >= n
                && !complete
            {
                gm.force_complete().await.map_err(|e| e.to_string())?;
                ended_by_gm = true;
                progressed = true;
            }
        }

        if !opts.abort && !ended_by_gm {
            'roll: for seat in seats.iter_mut() {
                for id in seat.client.rollable_entrants() {
                    if !seat.mine.contains(&id) {
                        continue;
                    }
                    if let Some(payload) = seat
                        .client
                        .roll(&id, mode)
                        .await
                        .map_err(|e| e.to_string())?
                    {
                        rolls.insert(id, payload);
                    }
                    progressed = true;
                    break 'roll;
                }
            }
        }

        if !progressed {
            break;
        }
    }

    let mut outcomes = Vec::new();
    while let Ok(outcome) = outcome_rx.try_recv() {
        outcomes.push(outcome);
    }

    print_header(&descriptor, &roster, mode, opts.seed, seats.len());
    let recap = recap_rx.try_recv().ok();
    match &recap {
        Some(recap) => print_results(&descriptor, recap, &rolls),
        None => {
            let aborted = outcomes.iter().all(|(_, o)| *o == Outcome::Aborted);
            if !aborted || outcomes.is_empty() {
                return Err(format!("session {session} did not resolve"));
            }
            println!("  {}", "Session aborted: no verdict, no recap.".yellow());
            println!();
        }
    }

    let agreeing = outcomes
        .first()
        .map_or(0, |(_, first)| outcomes.iter().filter(|(_, o)| o == first).count());
    let delivery = if opts.duplicate {
        " (duplicate delivery)".dimmed().to_string()
    } else {
        String::new()
    };
    println!("  Replicas: {agreeing}/{} agree{delivery}", seats.len());

    if let Some(recap) = &recap
        && let Some(export) = export
    {
        println!();
        match export {
            Export::Markdown => print!("{}", recap.export_markdown()),
            Export::Text => print!("{}", recap.export_text()),
        }
    }
    Ok(())
}

fn print_header(
    descriptor: &SessionDescriptor,
    roster: &Roster,
    mode: RollMode,
    seed: u64,
    clients: usize,
) {
    let against = match descriptor.dc {
        Some(dc) if !descriptor.is_contested() => format!("DC {dc}"),
        _ => {
            let names: Vec<&str> = descriptor
                .contestant_refs
                .iter()
                .filter_map(|id| roster.get(id).map(|s| s.name.as_str()))
                .collect();
            format!("contested by {}", names.join(", "))
        }
    };
    let rule = if descriptor.visibility.use_average {
        "average"
    } else {
        "majority"
    };
    println!(
        "  {} {} {}",
        "Group Check".bold(),
        descriptor.title(),
        format!("({clients} clients, {mode}, seed={seed})").dimmed()
    );
    println!(
        "  {} actors vs {against}, {rule} rule",
        descriptor.actor_refs.len()
    );
    println!();
}

fn print_results(
    descriptor: &SessionDescriptor,
    recap: &RecapRecord,
    rolls: &HashMap<EntrantId, ResultPayload>,
) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Entrant", "Role", "Dice", "Mod", "Total", ""]);

    for ((id, _), entry) in descriptor.entrants().zip(&recap.entries) {
        let dice = rolls
            .get(id)
            .map(|p| {
                let faces: Vec<String> = p.dice_faces.iter().map(u32::to_string).collect();
                format!("[{}]", faces.join(", "))
            })
            .unwrap_or_else(|| "--".to_string());
        let note = if entry.crit {
            "critical".green().bold().to_string()
        } else if entry.fumble {
            "fumble".red().bold().to_string()
        } else {
            String::new()
        };
        let role = match entry.role {
            Role::Actor => "actor",
            Role::Contestant => "contestant",
        };
        table.add_row(vec![
            entry.name.clone(),
            role.to_string(),
            dice,
            super::signed(entry.modifier),
            entry
                .total
                .map_or_else(|| "--".to_string(), |t| t.to_string()),
            note,
        ]);
    }
    println!("{table}");
    println!();

    let verdict = match recap.success {
        Some(true) => "SUCCESS".green().bold(),
        Some(false) => "FAILURE".red().bold(),
        None => "NO VERDICT".yellow().bold(),
    };
    let forced = if recap.forced { " (forced)" } else { "" };
    match recap.threshold {
        Some(t) => println!("  Verdict: {verdict}{forced} vs threshold {t:.1}"),
        None => println!("  Verdict: {verdict}{forced}"),
    }
}
