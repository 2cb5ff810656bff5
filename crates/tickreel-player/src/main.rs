//! Tickreel player binary.
//!
//! Loads a simulation document, builds its scene, and replays the event
//! log. Playback is controlled from stdin (see [`console`]); with `--step`
//! the player applies a single step, prints the status, and exits.

mod console;
mod error;

use std::path::{Path, PathBuf};

use clap::Parser;
use tickreel_core::{LoggingConfig, PlayerConfig, SimulationData, Spooler};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::PlayerError;

/// Config file read from the working directory when `--config` is absent.
const DEFAULT_CONFIG_PATH: &str = "tickreel.yaml";

/// Replay a recorded simulation event log against its scene.
#[derive(Parser)]
#[command(name = "tickreel")]
#[command(about = "Replay a recorded simulation event log")]
#[command(version)]
struct Cli {
    /// Simulation document (JSON with entities, visuals, grid, and events).
    document: PathBuf,

    /// Config file; defaults to tickreel.yaml in the working directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial speed factor in steps per second, overriding the config.
    #[arg(long)]
    speed: Option<f64>,

    /// Seek to this step before anything else.
    #[arg(long)]
    seek: Option<f64>,

    /// Apply a single step, print the status as JSON, and exit.
    #[arg(long)]
    step: bool,

    /// Wait for a `run` command instead of playing immediately.
    #[arg(long)]
    paused: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    info!(document = %cli.document.display(), "Tickreel starting");
    play(&cli, &config).await?;
    Ok(())
}

async fn play(cli: &Cli, config: &PlayerConfig) -> Result<(), PlayerError> {
    let data = SimulationData::from_file(&cli.document)?;
    let scene = data.build_scene()?;

    let mut playback = config.playback;
    if let Some(speed) = cli.speed {
        playback.speed_factor = speed;
    }
    let spooler = Spooler::with_config(data.log, scene, playback)?;

    let total = spooler.total_steps();
    spooler.add_step_changed_listener(move |step: u64| info!(step, total, "Step"));

    if let Some(target) = cli.seek {
        spooler.skip_to(target).await?;
    }

    if cli.step {
        spooler.advance_one_step()?;
        console::print_status(&spooler)?;
        return Ok(());
    }

    if !cli.paused {
        drop(spooler.run());
    }
    console::drive(&spooler).await?;

    info!(step = spooler.current_step(), total, "Playback finished");
    console::print_status(&spooler)
}

/// Load configuration from `path`, or from [`DEFAULT_CONFIG_PATH`] if it
/// exists, falling back to defaults.
fn load_config(path: Option<&Path>) -> Result<PlayerConfig, PlayerError> {
    if let Some(path) = path {
        return Ok(PlayerConfig::from_file(path)?);
    }
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        Ok(PlayerConfig::from_file(default_path)?)
    } else {
        // Tracing is not initialized yet.
        eprintln!("Config file not found, using defaults");
        Ok(PlayerConfig::default())
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
