//! Autobattler CLI
//!
//! Verifies the marker assets, picks a game mode, wires the platform
//! backend into the monitor and polls until killed.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use autobattler::{platforms, AssetCatalog, GameMode, Monitor, MonitorConfig};

#[derive(Parser)]
#[command(name = "autobattler")]
#[command(about = "Screen-driven match automation for game clients")]
struct Cli {
    /// Game mode to automate. Prompts interactively when omitted.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Directory holding the marker reference images.
    #[arg(long, default_value = "assets")]
    assets_dir: PathBuf,

    /// Append-only event log, mirrored to the console.
    #[arg(long, default_value = "autobattler.log")]
    log_file: PathBuf,

    /// Polling interval in milliseconds.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    #[value(name = "1v1")]
    OneVsOne,
    #[value(name = "2v2")]
    TwoVsTwo,
    #[value(name = "trophy-road")]
    TrophyRoad,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::OneVsOne => GameMode::OneVsOne,
            ModeArg::TwoVsTwo => GameMode::TwoVsTwo,
            ModeArg::TrophyRoad => GameMode::TrophyRoad,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli.log_file);

    print_banner();
    println!("Verifying marker images...");
    let catalog = AssetCatalog::new(&cli.assets_dir);
    let report = catalog.verify();
    for (marker, path) in &report.found {
        println!("  - '{marker}' image found at {}", path.display());
    }
    if !report.is_complete() {
        for (marker, path) in &report.missing {
            eprintln!("  - ERROR: '{marker}' image NOT found at: {}", path.display());
        }
        eprintln!();
        eprintln!(
            "One or more marker images are missing. Place them under '{}' and try again.",
            cli.assets_dir.display()
        );
        std::process::exit(1);
    }

    let mode: GameMode = match cli.mode {
        Some(mode) => mode.into(),
        None => prompt_mode()?,
    };

    let (sensor, actuator) =
        platforms::create_backend(&catalog).context("initializing the screen backend")?;

    let config = MonitorConfig {
        tick_interval: Duration::from_millis(cli.tick_ms),
        ..MonitorConfig::default()
    };

    info!(%mode, "autobattler initialized and ready");
    info!("keep the game window focused and unobstructed");
    info!("events are appended to {}", cli.log_file.display());

    let mut monitor = Monitor::with_config(sensor, actuator, mode, config);
    monitor.run().await;
    Ok(())
}

fn print_banner() {
    println!("--------------------------------------------------");
    println!("  AUTOBATTLER");
    println!("--------------------------------------------------");
}

/// Interactive mode menu. Invalid input re-prompts; it is never fatal.
fn prompt_mode() -> Result<GameMode> {
    println!();
    println!("Choose a game mode to automate:");
    println!("  1. 1v1 (classic)");
    println!("  2. 2v2");
    println!("  3. 1v1 trophy road");

    let stdin = io::stdin();
    loop {
        print!("Enter 1, 2 or 3: ");
        io::stdout().flush().ok();
        let mut line = String::new();
        stdin
            .lock()
            .read_line(&mut line)
            .context("reading mode selection")?;
        match GameMode::from_menu_choice(&line) {
            Ok(mode) => return Ok(mode),
            Err(err) => println!("{err}"),
        }
    }
}

/// Console logging plus a best-effort append-only file mirror. A log
/// file that cannot be opened downgrades to console-only; it never
/// stops the bot.
fn init_logging(log_file: &Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer());

    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
    {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            registry
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .init();
            Some(guard)
        }
        Err(err) => {
            registry.init();
            warn!(
                "could not open log file {}: {err}; logging to console only",
                log_file.display()
            );
            None
        }
    }
}
