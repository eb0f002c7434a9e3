//! # RPi5 Kiosk
//!
//! Full-screen retro terminal for a touch-screen Raspberry Pi. Mouse clicks
//! stand in for taps; the physical keyboard mirrors the on-screen one.

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use env_logger::{Builder, Env, Target};

use rpi_kiosk::net::{FixedProbe, LinkProbe, SysfsLinkProbe};
use rpi_kiosk::stats::{MockStats, MockUptime};
use rpi_kiosk::{App, Args, FileStore, SettingsStore};

fn init_logging(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Runs `run` once mouse capture is on. Never bails out early, so the
/// caller's terminal teardown always follows.
fn with_capture(
    enable: impl FnOnce() -> io::Result<()>,
    run: impl FnOnce() -> Result<()>,
) -> Result<()> {
    match enable() {
        Ok(()) => run(),
        Err(e) => Err(anyhow::Error::new(e).context("enabling mouse capture")),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings_path = args.settings_path();

    // Headless maintenance commands
    if args.print_settings {
        let store = SettingsStore::new(FileStore::open(&settings_path));
        println!("{}", serde_json::to_string_pretty(&store.get())?);
        return Ok(());
    }
    if args.reset_settings {
        let mut store = SettingsStore::new(FileStore::open(&settings_path));
        store
            .reset(|| true)
            .with_context(|| format!("resetting {}", settings_path.display()))?;
        eprintln!("rpi-kiosk: settings reset ({})", settings_path.display());
        return Ok(());
    }

    init_logging(&args.log_path())?;
    log::info!("starting, settings at {}", settings_path.display());

    let probe: Box<dyn LinkProbe> = match args.forced_link() {
        Some(online) => Box::new(FixedProbe(online)),
        None => Box::new(SysfsLinkProbe::new()),
    };
    let mut app = App::new(
        SettingsStore::new(FileStore::open(&settings_path)),
        MockStats::new(),
        MockUptime::new(),
        probe.is_online(),
        Instant::now(),
    );
    if args.forced_link().is_none() {
        app.watch_link(probe);
    }

    let terminal = ratatui::init();
    let result = with_capture(
        || execute!(stdout(), EnableMouseCapture),
        || app.run(terminal),
    );
    let _ = execute!(stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        log::error!("exited with error: {e:#}");
    } else {
        log::info!("exited");
    }
    result
}
