//! Frostbite headless runner.
//!
//! Plays a scenario through the behavior engine without a window: contacts
//! and input come from the scenario file, render commands go to the log.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --scenario level.json --ticks 120
//! RUST_LOG=debug cargo run            # built-in demo with every transition logged
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{info, warn};

use frostbite::game::Simulation;
use frostbite::resources::gameconfig::GameConfig;
use frostbite::scenario::{DEMO_SCENARIO, Scenario};

/// Frostbite entity-behavior engine
#[derive(Parser)]
#[command(version, about = "Runs a scripted scenario through the behavior engine.")]
struct Cli {
    /// INI configuration file. Missing or invalid files fall back to defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON scenario to play. Without one the built-in demo runs.
    #[arg(long, value_name = "PATH")]
    scenario: Option<PathBuf>,

    /// Idle ticks to run after the last scenario frame, so delayed calls can fire.
    #[arg(long, default_value_t = 120)]
    ticks: u32,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Write the effective configuration to PATH before running.
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let mut config = match &cli.config {
        Some(path) => GameConfig::with_path(path),
        None => GameConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        warn!("{e}; using defaults");
    }

    if let Some(path) = &cli.write_config {
        let mut out = config.clone();
        out.config_path = path.clone();
        if let Err(e) = out.save_to_file() {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
        println!("Configuration written to {}", path.display());
    }

    let scenario = match &cli.scenario {
        Some(path) => Scenario::from_path(path),
        None => DEMO_SCENARIO.parse(),
    };
    let scenario = match scenario {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let dt = config.tick_delta();
    let mut sim = Simulation::new(config);
    let mut ticks = match scenario.run(&mut sim, dt) {
        Ok(ticks) => ticks,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    sim.set_input(&[]);
    for _ in 0..cli.ticks {
        sim.tick(dt);
        ticks += 1;
    }
    info!("ran {ticks} tick(s), {:.2}s simulated", sim.time().elapsed);

    let hud = sim.hud();
    println!("Stars:       {}", hud.stars);
    println!("Health:      {}", hud.health);
    println!("Spike hits:  {}", hud.spike_hits);
    println!("Game over:   {}", hud.game_over);
    let errors = sim.listener_errors();
    if !errors.is_empty() {
        println!("Listener errors: {}", errors.len());
        for e in errors {
            println!("  {e}");
        }
    }
    ExitCode::SUCCESS
}
