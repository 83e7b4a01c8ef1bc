mod app;
mod calibration;
mod config;
mod controller;
mod error;
mod geometry;
#[cfg(feature = "hooks")]
mod hotkeys;
mod human_mouse;
mod input;
mod scan;
mod timing;


use clap::Parser;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::ConfigFile;
use controller::{Event, RunController, StatusBoard};
use input::EnigoInput;
use timing::{TimingModel, TimingProfile};

/// Clicks every cell of an on-screen grid while holding a modifier key.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Grid config file (created with defaults if missing)
    #[arg(short, long, value_name = "PATH", default_value = config::DEFAULT_PATH)]
    config: PathBuf,

    /// No window; drive everything with the global hotkeys
    #[arg(long)]
    headless: bool,

    /// Seconds to wait after start before the first click
    #[arg(long, value_name = "SECS", default_value_t = 3.0)]
    start_delay: f64,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    if cli.headless && !cfg!(feature = "hooks") {
        warn!("--headless needs global hotkeys; rebuild with `--features hooks`");
        return Ok(());
    }

    let board = StatusBoard::default();
    let (tx, rx) = mpsc::channel();
    let profile = TimingProfile { start_delay: cli.start_delay.max(0.0), ..TimingProfile::HUMAN };
    let source = ConfigFile::new(&cli.config);
    let status = Arc::clone(&board);

    // enigo handles are not Send on every platform, so the controller builds its own
    let worker = thread::spawn(move || {
        let mut controller = RunController::new(EnigoInput::new(), source, TimingModel::new(profile), status);
        controller.run_forever(rx);
    });

    #[cfg(feature = "hooks")]
    {
        hotkeys::spawn(tx.clone());
        info!("Hotkeys: {}", hotkeys::HELP);
    }
    info!("Config file: {}", cli.config.display());

    if cli.headless {
        let _ = worker.join();
        return Ok(());
    }

    let result = app::run(tx.clone(), Arc::clone(&board));
    let _ = tx.send(Event::Shutdown);
    let _ = worker.join();
    result
}
