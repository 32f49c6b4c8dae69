//! # Ghost Sim
//!
//! Headless runner for the Ghost character controller.
//!
//! Loads `ghost.toml` (or the path given as the first argument), the level
//! and input script it names, plays the script at a fixed timestep and
//! prints the run summary as JSON.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use ghost_engine::{InputScript, Runner, SimConfig};
use ghost_gameplay::{Level, LoggedEvent};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("ghost=info".parse()?))
        .init();

    info!("Ghost sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load_from(path),
        None => SimConfig::load(),
    };
    config.validate();

    let level = Level::load_from(&config.level_path)
        .with_context(|| format!("loading level {}", config.level_path.display()))?;
    let script = InputScript::load_from(&config.script_path)
        .with_context(|| format!("loading input script {}", config.script_path.display()))?;

    let events_path = config.events_path.clone();
    let mut runner = Runner::new(config, level);
    let summary = runner.run(&script).context("running simulation")?;

    if let Some(path) = events_path {
        let events = runner.drain_events();
        write_events(&path, &events)
            .with_context(|| format!("writing events to {}", path.display()))?;
        info!("Wrote {} events to {}", events.len(), path.display());
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);

    info!("Ghost sim finished");
    Ok(())
}

/// Write events as JSON lines.
fn write_events(path: &Path, events: &[LoggedEvent]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for event in events {
        serde_json::to_writer(&mut writer, event)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
