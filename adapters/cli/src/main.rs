#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Horde Dash session.

mod autopilot;
mod presentation;
mod simulation;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use horde_dash_core::{Command, Tuning};
use horde_dash_world::query;
use tracing::info;
use tracing_subscriber::EnvFilter;

use autopilot::Autopilot;
use simulation::Simulation;

#[derive(Debug, Parser)]
#[command(name = "horde-dash")]
#[command(about = "Runs a headless Horde Dash session with scripted input")]
struct Args {
    /// Tuning file in TOML format; missing sections fall back to defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the random seed from the tuning file
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated seconds to run (default: countdown plus round length)
    #[arg(long)]
    seconds: Option<f32>,

    /// Fixed frame rate of the simulation loop
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Seconds between autopilot dashes; zero disables dashing
    #[arg(long, default_value_t = 1.0)]
    dash_every: f32,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn load_tuning(path: Option<&PathBuf>) -> Result<Tuning> {
    let Some(path) = path else {
        return Ok(Tuning::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read tuning file {}", path.display()))?;
    parse_tuning(&text).with_context(|| format!("invalid tuning file {}", path.display()))
}

fn parse_tuning(text: &str) -> Result<Tuning> {
    let tuning: Tuning = toml::from_str(text).context("malformed TOML")?;
    tuning.validate()?;
    Ok(tuning)
}

/// Entry point for the Horde Dash command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut tuning = load_tuning(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        tuning.seed = seed;
    }
    ensure!(args.fps > 0, "--fps must be positive");
    let dash_every = Duration::try_from_secs_f32(args.dash_every)
        .context("--dash-every must be a non-negative number of seconds")?;
    let seconds = args
        .seconds
        .unwrap_or(tuning.session.countdown + tuning.session.round_length);
    ensure!(
        seconds.is_finite() && seconds >= 0.0,
        "--seconds must be a non-negative number"
    );

    let frame = Duration::from_secs_f64(1.0 / f64::from(args.fps));
    let frames = (f64::from(seconds) * f64::from(args.fps)).ceil() as u64;
    let mut autopilot = Autopilot::new(dash_every);
    let mut simulation = Simulation::new(tuning);
    info!(seed = query::tuning(simulation.world()).seed, frames, "starting session");

    simulation.apply(Command::OpenSession);
    let mut input = Vec::new();
    for _ in 0..frames {
        autopilot.plan(simulation.world(), frame, &mut input);
        for command in input.drain(..) {
            simulation.apply(command);
        }
        simulation.apply(Command::Tick { dt: frame });
        if simulation.presentation().outcome().is_some() {
            break;
        }
    }

    let world = simulation.world();
    let player = query::player(world);
    let presentation = simulation.presentation();
    let outcome = presentation
        .outcome()
        .map_or_else(|| "running".to_owned(), |reason| format!("{reason:?}"));
    println!(
        "score={} health={}/{} live_enemies={} launched={} killed={} refused_attacks={} outcome={}",
        presentation.score(),
        presentation.health().unwrap_or(player.health),
        player.max_health,
        simulation.spawning().population().live(),
        presentation.launched(),
        presentation.killed(),
        simulation.attack_gate().refused(),
        outcome,
    );
    Ok(())
}
