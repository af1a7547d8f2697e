#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays the built-in demo level headlessly.

mod demo;
mod logging;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use lemmings_system_behavior::{PhysicsConfig, SkillTable};
use lemmings_world::World;

/// Headless lemmings simulation
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file overriding the physics constants
    #[arg(long)]
    physics: Option<PathBuf>,
    /// TOML file overriding skill animation and mask descriptors
    #[arg(long)]
    skills: Option<PathBuf>,
    /// Maximum number of ticks to simulate
    #[arg(long, default_value_t = 1500)]
    ticks: u64,
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_physics(path: Option<&PathBuf>) -> Result<PhysicsConfig> {
    let Some(path) = path else {
        return Ok(PhysicsConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading physics configuration {}", path.display()))?;
    PhysicsConfig::from_toml_str(&text)
        .with_context(|| format!("loading physics configuration {}", path.display()))
}

fn load_skills(path: Option<&PathBuf>) -> Result<SkillTable> {
    let Some(path) = path else {
        return Ok(SkillTable::standard());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading skill table {}", path.display()))?;
    SkillTable::from_toml_str(&text)
        .with_context(|| format!("loading skill table {}", path.display()))
}

/// Entry point for the lemmings command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let physics = load_physics(args.physics.as_ref())?;
    let skills = load_skills(args.skills.as_ref())?;
    let world = World::new(demo::level()?, skills, physics).context("setting up the demo level")?;

    let summary = demo::Session::new(world).run(args.ticks);
    println!("{summary}");
    Ok(())
}
