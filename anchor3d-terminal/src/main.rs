/// anchor3d Terminal Demo - Label pinned to a moving cube
///
/// Demonstrates screen-anchored labels over the terminal ASCII rasterizer.
/// Controls:
///   - WASD / Arrow Keys: Move the camera
///   - E/R: Move the camera up/down
///   - Mouse click: Pick the mesh under the cursor
///   - Q/ESC: Quit
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anchor3d_terminal::{DemoConfig, TerminalApp};
use anyhow::{Context, Result};
use clap::Parser;

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    // Stderr belongs to the renderer; only log when a file is given
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let config = DemoConfig::parse();
    init_tracing(config.log_file.as_deref())?;

    println!("anchor3d Terminal Renderer - Loading...");
    println!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut app = TerminalApp::new(&config)?;
    app.run()?;

    println!("Thank you for using anchor3d!");
    Ok(())
}
