//! Headless runner for Tank Battle.
//!
//! Plays one match without a renderer: the player tank idles (or fires
//! every tick with `--autofire`) while the enemy AI does its thing. Progress
//! goes to the log; the final summary is printed to stdout as JSON.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tankbattle_core::entity::TankKind;
use tankbattle_core::event::{GameEvent, Winner};
use tankbattle_core::input::{InputFrame, Intent};
use tankbattle_core::map;
use tankbattle_core::settings::Settings;
use tankbattle_core::simulation::{Control, Simulation};
use tracing::{debug, info};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Compact,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Map file to play. Unreadable maps fall back to a random map.
    #[arg(long)]
    map: Option<PathBuf>,

    /// Settings JSON file. Missing keys keep their defaults.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Difficulty preset to apply (easy, normal, hard, or one from the settings file).
    #[arg(long)]
    difficulty: Option<String>,

    /// Seed for every random draw in the match.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Stop after this many ticks if nobody has won.
    #[arg(long, default_value_t = 3600)]
    ticks: u64,

    /// Pace ticks at the configured frame rate instead of running flat out.
    #[arg(long)]
    realtime: bool,

    /// Have the player fire every tick.
    #[arg(long)]
    autofire: bool,

    /// Write the starting layout to this file.
    #[arg(long)]
    save_map: Option<PathBuf>,

    /// Log output format. Overrides LOG_FORMAT.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Debug, Serialize)]
struct Summary {
    seed: u64,
    ticks: u64,
    outcome: Option<Winner>,
    player_alive: bool,
    enemies_left: usize,
    commanders_left: usize,
    shots_fired: usize,
    tanks_destroyed: usize,
}

fn init_tracing(format: Option<LogFormat>) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = match format {
        Some(format) => format == LogFormat::Json,
        None => matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json")),
    };
    // Logs go to stderr so stdout carries only the summary.
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

fn load_settings(args: &Args) -> Result<Settings> {
    let settings = match &args.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    match &args.difficulty {
        Some(name) => settings
            .with_difficulty(name)
            .with_context(|| format!("failed to apply difficulty {name:?}")),
        None => Ok(settings),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let settings = load_settings(&args)?;
    let frame_time = Duration::from_secs(1) / settings.game.fps.max(1);
    let mut sim = Simulation::new(settings, args.seed).context("invalid settings")?;

    match &args.map {
        Some(path) => sim.start_match_from_file(path),
        None => sim.start_random_match(),
    }

    if let Some(path) = &args.save_map {
        let game = &sim.settings().game;
        map::save_file(path, &sim.export_layout(), game.wall_size, &sim.settings().playfield())
            .with_context(|| format!("failed to save map to {}", path.display()))?;
        info!(path = %path.display(), "map saved");
    }

    let input = if args.autofire {
        InputFrame::new().with(Intent::Fire)
    } else {
        InputFrame::new()
    };

    let mut shots_fired = 0;
    let mut tanks_destroyed = 0;
    for _ in 0..args.ticks {
        let control = sim.step(&input);

        for event in sim.take_events() {
            debug!(tick = event.tick, event = ?event.event, "event");
            match event.event {
                GameEvent::BulletFired { .. } => shots_fired += 1,
                GameEvent::TankDestroyed { .. } => tanks_destroyed += 1,
                _ => {}
            }
        }

        if control != Control::Running {
            break;
        }
        if args.realtime {
            std::thread::sleep(frame_time);
        }
    }

    let summary = Summary {
        seed: args.seed,
        ticks: sim.tick(),
        outcome: sim.outcome(),
        player_alive: sim.arena().player().is_some(),
        enemies_left: sim.count(TankKind::EnemyNormal),
        commanders_left: sim.count(TankKind::EnemyCommander),
        shots_fired,
        tanks_destroyed,
    };
    match summary.outcome {
        Some(winner) => info!(%winner, ticks = summary.ticks, "match decided"),
        None => info!(ticks = summary.ticks, "tick limit reached"),
    }

    let json = serde_json::to_string_pretty(&summary).context("failed to encode summary")?;
    println!("{json}");
    Ok(())
}
