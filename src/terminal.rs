//! The pseudo-console: scrollback, input line and command dispatch.
//!
//! Commands never fail in the process sense. An unknown command is just an
//! error-styled line and a hint.

use std::time::Duration;

use shared::{SystemStats, TerminalLine, Uptime};

use crate::gpio::level_label;
use crate::keyboard::Key;

pub const REBOOT_DELAY: Duration = Duration::from_millis(2000);
pub const MAX_SCROLLBACK: usize = 1000;

const HINT: &str = "Type HELP for available commands";

const HELP_LINES: [&str; 7] = [
    "  HELP     - Display available commands",
    "  STATUS   - Show system status",
    "  GPIO     - Toggle GPIO panel",
    "  SETTINGS - Open settings panel",
    "  CLEAR    - Clear terminal",
    "  STATS    - Display detailed stats",
    "  REBOOT   - Restart system",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Gpio,
    Settings,
    Clear,
    Stats,
    Reboot,
    Unrecognized,
}

impl Command {
    /// Case-insensitive match of the whole trimmed input.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "help" => Self::Help,
            "status" => Self::Status,
            "gpio" => Self::Gpio,
            "settings" => Self::Settings,
            "clear" => Self::Clear,
            "stats" => Self::Stats,
            "reboot" => Self::Reboot,
            _ => Self::Unrecognized,
        }
    }
}

/// What the console needs from the rest of the dashboard.
pub trait CommandHost {
    fn is_online(&self) -> bool;
    fn stats(&self) -> SystemStats;
    fn uptime(&mut self) -> Uptime;
    /// Flips GPIO panel visibility and returns the new visibility.
    fn toggle_gpio_panel(&mut self) -> bool;
    fn open_settings(&mut self);
    /// Arranges for [`TerminalEngine::complete_reboot`] after `delay`.
    fn schedule_reboot(&mut self, delay: Duration);
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Input line
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
}

impl InputBuffer {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Applies one key. Returns the submitted text on ENTER when the line is
    /// not blank; a blank line is left untouched.
    pub fn apply(&mut self, key: Key) -> Option<String> {
        match key {
            Key::Char(c) => self.text.push(c),
            Key::Space => self.text.push(' '),
            Key::Back => {
                self.text.pop();
            }
            Key::Clear => self.text.clear(),
            Key::Enter => {
                if !self.text.trim().is_empty() {
                    return Some(std::mem::take(&mut self.text));
                }
            }
        }
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Engine
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct TerminalEngine {
    lines: Vec<TerminalLine>,
    input: InputBuffer,
    scroll: usize,
}

impl TerminalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A console showing the start-up banner.
    pub fn with_banner() -> Self {
        let mut t = Self::new();
        for line in [
            TerminalLine::system("ROBCO INDUSTRIES UNIFIED OPERATING SYSTEM"),
            TerminalLine::system("COPYRIGHT 2075-2102, ROBCO INDUSTRIES"),
            TerminalLine::system("-Server 1-"),
            TerminalLine::output(""),
            TerminalLine::success("Raspberry Pi 5 Kit Manager Online"),
            TerminalLine::output(HINT),
        ] {
            t.push(line);
        }
        t
    }

    pub fn lines(&self) -> &[TerminalLine] {
        &self.lines
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    /// Appends a line, dropping the oldest once the scrollback is full, and
    /// snaps the view back to the newest line.
    pub fn push(&mut self, line: TerminalLine) {
        self.lines.push(line);
        if self.lines.len() > MAX_SCROLLBACK {
            let excess = self.lines.len() - MAX_SCROLLBACK;
            self.lines.drain(..excess);
        }
        self.scroll = 0;
    }

    /// Feeds one keyboard key into the input line, dispatching on submit.
    pub fn key(&mut self, key: Key, host: &mut dyn CommandHost) -> Option<Command> {
        let submitted = self.input.apply(key)?;
        self.submit(&submitted, host)
    }

    /// Echoes and runs `input`. Blank input changes nothing.
    pub fn submit(&mut self, input: &str, host: &mut dyn CommandHost) -> Option<Command> {
        if input.trim().is_empty() {
            return None;
        }
        self.push(TerminalLine::command(format!("> {input}")));

        let cmd = Command::parse(input);
        log::debug!("dispatch {input:?} -> {cmd:?}");
        match cmd {
            Command::Help => {
                self.push(TerminalLine::success("AVAILABLE COMMANDS:"));
                for l in HELP_LINES {
                    self.push(TerminalLine::output(l));
                }
            }
            Command::Status => {
                let s = host.stats();
                self.push(TerminalLine::success(format!(
                    "SYSTEM STATUS: {}",
                    if host.is_online() { "ONLINE" } else { "OFFLINE" }
                )));
                self.push(TerminalLine::output(format!("CPU: {}%", s.cpu)));
                self.push(TerminalLine::output(format!("TEMP: {}°C", s.temp)));
                self.push(TerminalLine::output(format!("STORAGE: {}% used", s.storage)));
            }
            Command::Gpio => {
                let visible = host.toggle_gpio_panel();
                self.push(gpio_visibility_line(visible));
            }
            Command::Settings => {
                host.open_settings();
                self.push(TerminalLine::success("Opening settings panel..."));
            }
            Command::Clear => {
                self.lines.clear();
                self.scroll = 0;
            }
            Command::Stats => {
                let s = host.stats();
                let uptime = host.uptime();
                self.push(TerminalLine::success("=== DETAILED SYSTEM STATISTICS ==="));
                self.push(TerminalLine::output(format!("CPU Usage: {}%", s.cpu)));
                self.push(TerminalLine::output(format!("Temperature: {}°C", s.temp)));
                self.push(TerminalLine::output(format!("Storage Used: {}%", s.storage)));
                self.push(TerminalLine::output(format!(
                    "Network: {}",
                    if host.is_online() { "Connected" } else { "Disconnected" }
                )));
                self.push(TerminalLine::output(format!("Uptime: {uptime}")));
            }
            Command::Reboot => {
                self.push(TerminalLine::warning("INITIATING SYSTEM REBOOT..."));
                host.schedule_reboot(REBOOT_DELAY);
            }
            Command::Unrecognized => {
                self.push(TerminalLine::error(format!("Command not found: {input}")));
                self.push(TerminalLine::output(HINT));
            }
        }
        Some(cmd)
    }

    pub fn complete_reboot(&mut self) {
        self.push(TerminalLine::success("System restart complete"));
    }

    // ─── Scrollback view ────────────────────────────────────────────────────

    /// Lines scrolled back from the newest one.
    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.scroll = (self.scroll + n).min(self.lines.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.scroll = self.scroll.saturating_sub(n);
    }
}

// ─── Lines raised by the dashboard rather than by a command ─────────────────

pub fn gpio_visibility_line(visible: bool) -> TerminalLine {
    TerminalLine::success(format!(
        "GPIO Control {}",
        if visible { "ENABLED" } else { "DISABLED" }
    ))
}

pub fn pin_line(pin: u8, level: bool) -> TerminalLine {
    TerminalLine::success(format!("GPIO {pin} set to {}", level_label(level)))
}

pub fn poll_interval_line(ms: u32) -> TerminalLine {
    let secs = f64::from(ms) / 1000.0;
    TerminalLine::success(format!("Poll interval updated to {secs}s"))
}

pub fn action_line(label: &str) -> TerminalLine {
    TerminalLine::success(format!("{label} activated"))
}

pub fn settings_saved_line() -> TerminalLine {
    TerminalLine::success("Settings saved")
}

#[cfg(test)]
mod tests {
    use shared::{LineKind, Temperature};

    use super::*;

    #[derive(Default)]
    struct Host {
        online: bool,
        gpio: bool,
        settings_opened: usize,
        reboots: Vec<Duration>,
    }

    impl CommandHost for Host {
        fn is_online(&self) -> bool {
            self.online
        }

        fn stats(&self) -> SystemStats {
            SystemStats {
                cpu: 42,
                temp: Temperature::from_tenths(515),
                storage: 73,
            }
        }

        fn uptime(&mut self) -> Uptime {
            Uptime { hours: 7, minutes: 3 }
        }

        fn toggle_gpio_panel(&mut self) -> bool {
            self.gpio = !self.gpio;
            self.gpio
        }

        fn open_settings(&mut self) {
            self.settings_opened += 1;
        }

        fn schedule_reboot(&mut self, delay: Duration) {
            self.reboots.push(delay);
        }
    }

    fn texts(t: &TerminalEngine) -> Vec<&str> {
        t.lines().iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn parse_is_case_insensitive_and_exact() {
        assert_eq!(Command::parse("HeLp"), Command::Help);
        assert_eq!(Command::parse("  reboot "), Command::Reboot);
        assert_eq!(Command::parse("help me"), Command::Unrecognized);
        assert_eq!(Command::parse("stat"), Command::Unrecognized);
    }

    #[test]
    fn blank_input_appends_nothing() {
        let mut t = TerminalEngine::with_banner();
        let mut host = Host::default();
        let before = t.lines().len();
        assert_eq!(t.submit("", &mut host), None);
        assert_eq!(t.submit("   \t", &mut host), None);
        assert_eq!(t.lines().len(), before);
    }

    #[test]
    fn help_lists_vocabulary_after_echo() {
        let mut t = TerminalEngine::new();
        let mut host = Host::default();
        t.submit("help", &mut host);

        let lines = t.lines();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], TerminalLine::command("> help"));
        assert_eq!(lines[1], TerminalLine::success("AVAILABLE COMMANDS:"));
        assert!(lines[2..].iter().all(|l| l.kind == LineKind::Output));
        assert_eq!(lines[8].text, "  REBOOT   - Restart system");
    }

    #[test]
    fn status_reports_connectivity_and_metrics() {
        let mut t = TerminalEngine::new();
        let mut host = Host { online: true, ..Host::default() };
        t.submit("STATUS", &mut host);
        assert_eq!(
            texts(&t),
            vec![
                "> STATUS",
                "SYSTEM STATUS: ONLINE",
                "CPU: 42%",
                "TEMP: 51.5°C",
                "STORAGE: 73% used",
            ]
        );
    }

    #[test]
    fn stats_block_includes_network_and_uptime() {
        let mut t = TerminalEngine::new();
        let mut host = Host::default();
        t.submit("Stats", &mut host);
        assert_eq!(
            texts(&t),
            vec![
                "> Stats",
                "=== DETAILED SYSTEM STATISTICS ===",
                "CPU Usage: 42%",
                "Temperature: 51.5°C",
                "Storage Used: 73%",
                "Network: Disconnected",
                "Uptime: 7h 3m",
            ]
        );
    }

    #[test]
    fn gpio_twice_returns_to_hidden() {
        let mut t = TerminalEngine::new();
        let mut host = Host::default();
        t.submit("gpio", &mut host);
        t.submit("GPIO", &mut host);
        assert!(!host.gpio);
        assert_eq!(t.lines()[1].text, "GPIO Control ENABLED");
        assert_eq!(t.lines()[3].text, "GPIO Control DISABLED");
    }

    #[test]
    fn settings_opens_surface() {
        let mut t = TerminalEngine::new();
        let mut host = Host::default();
        t.submit("settings", &mut host);
        assert_eq!(host.settings_opened, 1);
        assert_eq!(texts(&t), vec!["> settings", "Opening settings panel..."]);
    }

    #[test]
    fn clear_empties_the_log() {
        let mut t = TerminalEngine::with_banner();
        let mut host = Host::default();
        t.submit("help", &mut host);
        assert_eq!(t.submit("CLEAR", &mut host), Some(Command::Clear));
        assert!(t.lines().is_empty());
    }

    #[test]
    fn reboot_warns_and_schedules_completion() {
        let mut t = TerminalEngine::new();
        let mut host = Host::default();
        t.submit("reboot", &mut host);
        assert_eq!(t.lines()[1], TerminalLine::warning("INITIATING SYSTEM REBOOT..."));
        assert_eq!(host.reboots, vec![REBOOT_DELAY]);

        t.complete_reboot();
        assert_eq!(t.lines().last(), Some(&TerminalLine::success("System restart complete")));
    }

    #[test]
    fn unknown_command_echoes_input_as_typed() {
        let mut t = TerminalEngine::new();
        let mut host = Host::default();
        t.submit("FooBar", &mut host);
        assert_eq!(t.lines()[1], TerminalLine::error("Command not found: FooBar"));
        assert_eq!(t.lines()[2], TerminalLine::output("Type HELP for available commands"));
    }

    #[test]
    fn typed_keys_build_and_submit_the_line() {
        let mut t = TerminalEngine::new();
        let mut host = Host::default();
        for c in ['H', 'E', 'L', 'P'] {
            assert_eq!(t.key(Key::Char(c), &mut host), None);
        }
        assert_eq!(t.input().as_str(), "HELP");
        assert_eq!(t.key(Key::Enter, &mut host), Some(Command::Help));
        assert!(t.input().is_empty());
        assert_eq!(t.lines()[0].text, "> HELP");
        assert_eq!(t.lines().len(), 9);
    }

    #[test]
    fn input_buffer_editing() {
        let mut b = InputBuffer::default();
        assert_eq!(b.apply(Key::Back), None);
        assert!(b.is_empty());

        b.apply(Key::Char('A'));
        b.apply(Key::Space);
        b.apply(Key::Char('B'));
        assert_eq!(b.as_str(), "A B");
        b.apply(Key::Back);
        assert_eq!(b.as_str(), "A ");
        b.apply(Key::Clear);
        assert!(b.is_empty());
    }

    #[test]
    fn blank_submit_keeps_buffer() {
        let mut b = InputBuffer::default();
        b.apply(Key::Space);
        b.apply(Key::Space);
        assert_eq!(b.apply(Key::Enter), None);
        assert_eq!(b.as_str(), "  ");
    }

    #[test]
    fn scrollback_is_capped() {
        let mut t = TerminalEngine::new();
        for i in 0..MAX_SCROLLBACK + 5 {
            t.push(TerminalLine::output(i.to_string()));
        }
        assert_eq!(t.lines().len(), MAX_SCROLLBACK);
        assert_eq!(t.lines()[0].text, "5");
    }

    #[test]
    fn new_lines_snap_view_to_tail() {
        let mut t = TerminalEngine::with_banner();
        t.scroll_up(3);
        assert_eq!(t.scroll_offset(), 3);
        t.scroll_up(100);
        assert_eq!(t.scroll_offset(), t.lines().len() - 1);
        t.push(TerminalLine::output("x"));
        assert_eq!(t.scroll_offset(), 0);
    }

    #[test]
    fn dashboard_lines() {
        assert_eq!(pin_line(17, true).text, "GPIO 17 set to HIGH");
        assert_eq!(poll_interval_line(7000).text, "Poll interval updated to 7s");
        assert_eq!(poll_interval_line(1500).text, "Poll interval updated to 1.5s");
        assert_eq!(action_line("CAMERA").text, "CAMERA activated");
    }
}
