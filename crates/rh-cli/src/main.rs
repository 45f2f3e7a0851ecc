//! CLI frontend for the Rehearsal interaction engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rh",
    about = "Rehearsal: check and play branching conversation catalogs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a bundle's catalog against its navigation rules
    Check {
        /// Bundle file (JSON with catalog, navigation and engine sections)
        bundle: PathBuf,
    },

    /// List the interactions in a bundle
    List {
        /// Bundle file
        bundle: PathBuf,

        /// Filter by interaction kind (e.g. one-step, reord, dialogue)
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Show one interaction with its options and rules
    Show {
        /// Bundle file
        bundle: PathBuf,

        /// Interaction id
        id: u32,
    },

    /// Run a scripted learner session
    Play {
        /// Bundle file
        bundle: PathBuf,

        /// Script file: a JSON list of steps
        #[arg(short, long)]
        script: PathBuf,

        /// RNG seed for option shuffling (overrides the bundle)
        #[arg(long)]
        seed: Option<u64>,

        /// Do not voice anything
        #[arg(long)]
        mute: bool,

        /// Print the session store after the script finishes
        #[arg(long)]
        dump: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check { bundle } => commands::check::run(&bundle),
        Commands::List { bundle, kind } => commands::list::run(&bundle, kind.as_deref()),
        Commands::Show { bundle, id } => commands::show::run(&bundle, id),
        Commands::Play {
            bundle,
            script,
            seed,
            mute,
            dump,
        } => commands::play::run(&bundle, &script, seed, mute, dump),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
