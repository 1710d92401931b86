/// Heli3D Terminal Demo - Helicopter with spinning tail fan
///
/// Controls:
///   - 1 / 2 / 3: Spin the fan up (needed before the helicopter can move)
///   - Arrow Keys: Move the helicopter
///   - W / S: Fly forward / backward
///   - A / D: Pan the camera
///   - Q/ESC: Quit
use anyhow::{Context, Result};
use clap::Parser;
use heli3d_core::DemoConfig;
use heli3d_terminal::TerminalApp;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(version, about = "Helicopter demo rendered in the terminal")]
struct Args {
    /// RON file overriding the default scene configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Write logs to this file (the terminal itself is used for drawing)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let config = match &args.config {
        Some(path) => DemoConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DemoConfig::default(),
    };

    println!("Heli3D Terminal Renderer - Loading...");
    info!(fps = args.fps, "starting terminal renderer");

    let mut app = TerminalApp::new(&config, args.fps)?;
    app.run()?;

    println!("Thank you for flying Heli3D!");
    Ok(())
}
