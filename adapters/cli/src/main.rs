#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless dungeon chase session.

mod config;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{Scenario, DEMO_SCENARIO},
    session::Session,
};

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless dungeon chase simulation", long_about = None)]
struct Args {
    /// Scenario file to run instead of the built-in demo
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of physics ticks to simulate, overriding the scenario
    #[arg(short, long)]
    ticks: Option<u32>,

    /// Seed for spawn selection, overriding the scenario
    #[arg(short, long)]
    seed: Option<u64>,
}

/// Entry point for the dungeon chase command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();
    let mut scenario = match &args.config {
        Some(path) => Scenario::load(path)
            .with_context(|| format!("failed to load scenario {}", path.display()))?,
        None => Scenario::parse(DEMO_SCENARIO).context("built-in demo scenario is invalid")?,
    };
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }
    let ticks = args.ticks.unwrap_or(scenario.ticks);

    info!(
        rooms = scenario.content.rooms.len(),
        enemies = scenario.content.enemies.len(),
        seed = scenario.seed,
        ticks,
        "scenario loaded"
    );

    let mut session = Session::new(scenario);
    let stats = session.run(ticks);

    println!(
        "simulated {} ticks: {} rooms entered, {} enemies spawned ({} rejected), {} moves, {} idles",
        stats.ticks, stats.rooms_entered, stats.spawned, stats.rejected, stats.moves, stats.idles
    );
    match (session.active_room(), session.nearest_enemy_distance()) {
        (Some(room), Some(distance)) => println!(
            "room {}: nearest enemy is {distance:.2} units from the player",
            room.get()
        ),
        (Some(room), None) => println!("room {}: no enemies remain", room.get()),
        (None, _) => println!("no room is active"),
    }
    Ok(())
}
