//! CLI frontend for Gruppenwurf group checks.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gw",
    about = "Gruppenwurf: shared group checks for table-top sessions",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log session traffic to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a group check across simulated clients sharing one relay
    Simulate {
        /// Roster JSON file (default: built-in demo party)
        #[arg(short, long)]
        roster: Option<PathBuf>,

        /// Actors by name or ID, comma separated (default: everyone not contesting)
        #[arg(short, long, value_delimiter = ',')]
        actors: Vec<String>,

        /// Contestants by name or ID; their average replaces the DC
        #[arg(short, long, value_delimiter = ',')]
        contestants: Vec<String>,

        /// Ability key, e.g. dex, save:wis, stealth (default: flat roll)
        #[arg(short = 'k', long, default_value = "flat")]
        ability: String,

        /// Fixed DC for uncontested checks
        #[arg(short, long)]
        dc: Option<i32>,

        /// Judge by average instead of majority
        #[arg(long)]
        average: bool,

        /// Hide entrant names in the recap
        #[arg(long)]
        hide_names: bool,

        /// Show the DC to players and in the recap
        #[arg(long)]
        show_dc: bool,

        /// Roll mode for everyone: normal, advantage, disadvantage
        #[arg(short, long, default_value = "normal")]
        mode: String,

        /// Overlay title
        #[arg(short, long)]
        label: Option<String>,

        /// Deliver every frame twice
        #[arg(long)]
        duplicate: bool,

        /// Abort right after the intro
        #[arg(long, conflicts_with = "force_after")]
        abort: bool,

        /// Force complete once this many results are in
        #[arg(long)]
        force_after: Option<usize>,

        /// Base RNG seed; each client derives its own
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Wait out intro and outro timings instead of skipping them
        #[arg(long)]
        pace: bool,

        /// Print the recap: md or text
        #[arg(short, long)]
        export: Option<String>,
    },

    /// Judge a set of totals without rolling
    Verdict {
        /// Actor totals, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        actors: Vec<i32>,

        /// Contestant totals, comma separated
        #[arg(short, long, value_delimiter = ',')]
        contestants: Vec<i32>,

        /// Fixed DC
        #[arg(short, long)]
        dc: Option<i32>,

        /// Judge by average instead of majority
        #[arg(long)]
        average: bool,
    },

    /// Roll a formula such as 1d20+5 or 2d20kh
    Roll {
        /// Dice formula (default: 1d20 in the given mode)
        formula: Option<String>,

        /// Roll mode when no formula is given
        #[arg(short, long, default_value = "normal")]
        mode: String,

        /// Modifier when no formula is given
        #[arg(long, allow_hyphen_values = true)]
        modifier: Option<i32>,

        /// Number of rolls
        #[arg(short = 'n', long, default_value = "1")]
        times: u32,

        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },

    /// List roster entries and their modifiers
    Roster {
        /// Roster JSON file (default: built-in demo party)
        #[arg(short, long)]
        roster: Option<PathBuf>,

        /// Also show the modifier for this ability key
        #[arg(short = 'k', long)]
        ability: Option<String>,

        /// Print the roster as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Simulate {
            roster,
            actors,
            contestants,
            ability,
            dc,
            average,
            hide_names,
            show_dc,
            mode,
            label,
            duplicate,
            abort,
            force_after,
            seed,
            pace,
            export,
        } => {
            let opts = commands::simulate::SimulateOptions {
                roster,
                actors,
                contestants,
                ability,
                dc,
                average,
                hide_names,
                show_dc,
                mode,
                label,
                duplicate,
                abort,
                force_after,
                seed,
                pace,
                export,
            };
            commands::simulate::run(opts).await
        }
        Commands::Verdict {
            actors,
            contestants,
            dc,
            average,
        } => commands::verdict::run(&actors, &contestants, dc, average),
        Commands::Roll {
            formula,
            mode,
            modifier,
            times,
            seed,
        } => commands::roll::run(formula.as_deref(), &mode, modifier, times, seed),
        Commands::Roster {
            roster,
            ability,
            json,
        } => commands::roster::run(roster.as_deref(), ability.as_deref(), json),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
