use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fluency_progress::progress::CefrLevel;

mod cli;

#[derive(Parser)]
#[command(name = "fluency")]
#[command(about = "Fluency - track XP, streaks, missions and badges for a language learner")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.fluency/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding saved progress (defaults to ~/.fluency/state)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Learner whose progress is read and written
    #[arg(short, long, global = true, default_value = "default")]
    learner: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a completed learning session
    Session {
        /// CEFR level of the session (A1..C2)
        #[arg(long)]
        level: CefrLevel,

        /// Activity, e.g. conversation, roleplay, vocabulary
        #[arg(long)]
        activity: String,

        /// Learning goal, e.g. travel, work, exam
        #[arg(long)]
        goal: String,
    },

    /// Show XP, level and streaks
    Status,

    /// List badges and which are unlocked
    Badges {
        /// Only show unlocked badges
        #[arg(long)]
        unlocked: bool,
    },

    /// Show the daily missions, refilling the pool first
    Missions {
        /// CEFR level used to pick new missions
        #[arg(long, default_value = "A1")]
        level: CefrLevel,
    },

    /// Show seasonal events
    Events,

    /// Deliver due streak reminders to the console
    Remind {
        /// Keep polling instead of exiting after one pass
        #[arg(long)]
        watch: bool,

        /// Seconds between polls with --watch
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },

    /// Record a minigame result
    Minigame {
        /// Minigame identifier
        game: String,

        score: u32,

        #[arg(long, default_value_t = 100)]
        max_score: u32,
    },

    /// Grant XP by hand
    Grant {
        amount: f64,

        /// XP source (session, streak_bonus, mission, badge, seasonal_event, minigame, manual)
        #[arg(long, default_value = "manual")]
        source: String,
    },

    /// Write a commented default config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = cli::EngineOptions {
        config_path: cli.config,
        state_dir: cli.state_dir,
        learner: cli.learner,
    };

    match cli.command {
        Commands::Session {
            level,
            activity,
            goal,
        } => cli::session::session_command(&opts, level, activity, goal)?,
        Commands::Status => cli::status::status_command(&opts)?,
        Commands::Badges { unlocked } => cli::badges::badges_command(&opts, unlocked)?,
        Commands::Missions { level } => cli::missions::missions_command(&opts, level)?,
        Commands::Events => cli::events::events_command(&opts)?,
        Commands::Remind { watch, interval } => {
            cli::remind::remind_command(&opts, watch, interval)?
        }
        Commands::Minigame {
            game,
            score,
            max_score,
        } => cli::minigame::minigame_command(&opts, &game, score, max_score)?,
        Commands::Grant { amount, source } => cli::grant::grant_command(&opts, amount, &source)?,
        Commands::Init { force } => cli::init::init_command(opts.config_path.as_deref(), force)?,
    }

    Ok(())
}
