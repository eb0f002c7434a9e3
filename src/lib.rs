//! RPi5 kiosk dashboard: a retro phosphor terminal with live system status,
//! GPIO toggles and persistent display settings.

pub mod app;
pub mod gpio;
pub mod keyboard;
pub mod net;
pub mod settings;
pub mod stats;
pub mod terminal;
pub mod theme;
pub mod timers;
pub mod touch;
pub mod ui;

use std::path::PathBuf;

use clap::Parser;

pub use crate::app::{App, AppEvent};
pub use crate::settings::{FileStore, MemoryStore, SettingsStore};
pub use crate::terminal::{Command, TerminalEngine};

pub const APP_DIR: &str = "rpi-kiosk";
pub const SETTINGS_FILE: &str = "settings.json";
pub const LOG_FILE: &str = "kiosk.log";

#[derive(Parser, Debug)]
#[command(version, about = "Retro terminal kiosk for the Raspberry Pi 5", long_about = None)]
pub struct Args {
    /// Settings file (defaults to the user config dir)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file; the TUI owns the screen so logs never go to stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Start offline and skip link detection
    #[arg(long, conflicts_with = "online")]
    pub offline: bool,

    /// Start online and skip link detection
    #[arg(long)]
    pub online: bool,

    /// Clear persisted settings and exit
    #[arg(long)]
    pub reset_settings: bool,

    /// Print the effective settings as JSON and exit
    #[arg(long)]
    pub print_settings: bool,
}

impl Args {
    pub fn settings_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| config_dir().join(SETTINGS_FILE))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| config_dir().join(LOG_FILE))
    }

    /// Forced link state, if either flag was given.
    pub fn forced_link(&self) -> Option<bool> {
        match (self.online, self.offline) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_flags_conflict() {
        assert!(Args::try_parse_from(["rpi-kiosk", "--online", "--offline"]).is_err());
        let args = Args::try_parse_from(["rpi-kiosk", "--offline"]).unwrap();
        assert_eq!(args.forced_link(), Some(false));
        let args = Args::try_parse_from(["rpi-kiosk"]).unwrap();
        assert_eq!(args.forced_link(), None);
    }

    #[test]
    fn explicit_config_path_wins() {
        let args = Args::try_parse_from(["rpi-kiosk", "-c", "/tmp/k.json"]).unwrap();
        assert_eq!(args.settings_path(), PathBuf::from("/tmp/k.json"));
        assert!(args.log_path().ends_with(LOG_FILE));
    }
}
