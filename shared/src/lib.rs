use std::fmt;

use serde::Serialize;

// ==========================================
// TERMINAL SCROLLBACK
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    System,
    Output,
    Success,
    Warning,
    Error,
    Command,
}

/// One row of the pseudo-console. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalLine {
    pub text: String,
    pub kind: LineKind,
}

impl TerminalLine {
    pub fn new(text: impl Into<String>, kind: LineKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::System)
    }

    pub fn output(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Output)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Success)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Warning)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Error)
    }

    pub fn command(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Command)
    }
}

// ==========================================
// TELEMETRY
// ==========================================

/// Temperature in tenths of a degree Celsius, so it always renders with
/// exactly one fractional digit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Temperature(u16);

impl Temperature {
    pub const fn from_tenths(tenths: u16) -> Self {
        Self(tenths)
    }

    pub const fn tenths(self) -> u16 {
        self.0
    }

    pub fn celsius(self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemStats {
    pub cpu: u8,
    pub temp: Temperature,
    pub storage: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uptime {
    pub hours: u8,
    pub minutes: u8,
}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

// ==========================================
// GPIO
// ==========================================

/// BCM numbering, in header order rather than numeric order.
pub const GPIO_PINS: [u8; 22] = [
    2, 3, 4, 17, 27, 22, 10, 9, 11, 5, 6, 13, 19, 26, 14, 15, 18, 23, 24, 25, 8, 7,
];

// ==========================================
// SETTINGS
// ==========================================

pub const DEFAULT_POLL_INTERVAL_MS: u32 = 5000;
pub const MIN_POLL_INTERVAL_MS: u32 = 1000;
pub const MAX_POLL_INTERVAL_MS: u32 = 30_000;
pub const POLL_INTERVAL_STEP_MS: u32 = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Green,
    Amber,
    Blue,
    Red,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Green, Theme::Amber, Theme::Blue, Theme::Red];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Amber => "amber",
            Self::Blue => "blue",
            Self::Red => "red",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GpioLayout {
    #[default]
    Grid,
    List,
}

impl GpioLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::List => "list",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "grid" => Some(Self::Grid),
            "list" => Some(Self::List),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Grid => Self::List,
            Self::List => Self::Grid,
        }
    }
}

impl fmt::Display for GpioLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    pub poll_interval_ms: u32,
    pub gpio_layout: GpioLayout,
    pub animations_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Green,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            gpio_layout: GpioLayout::Grid,
            animations_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingField {
    Theme,
    PollInterval,
    GpioLayout,
    Animations,
}

impl SettingField {
    pub const ALL: [SettingField; 4] = [
        SettingField::Theme,
        SettingField::PollInterval,
        SettingField::GpioLayout,
        SettingField::Animations,
    ];

    /// Key under which the field is persisted.
    pub fn key(self) -> &'static str {
        match self {
            Self::Theme => "theme",
            Self::PollInterval => "poll-interval",
            Self::GpioLayout => "gpio-layout",
            Self::Animations => "animations",
        }
    }
}

/// A single-field partial update. Consumers merge it into what they hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingChange {
    Theme(Theme),
    PollInterval(u32),
    GpioLayout(GpioLayout),
    Animations(bool),
}

impl SettingChange {
    pub fn field(&self) -> SettingField {
        match self {
            Self::Theme(_) => SettingField::Theme,
            Self::PollInterval(_) => SettingField::PollInterval,
            Self::GpioLayout(_) => SettingField::GpioLayout,
            Self::Animations(_) => SettingField::Animations,
        }
    }

    pub fn apply(&self, settings: &mut Settings) {
        match *self {
            Self::Theme(t) => settings.theme = t,
            Self::PollInterval(ms) => settings.poll_interval_ms = ms,
            Self::GpioLayout(l) => settings.gpio_layout = l,
            Self::Animations(on) => settings.animations_enabled = on,
        }
    }

    /// String encoding used by the persisted key/value store.
    pub fn encoded(&self) -> String {
        match self {
            Self::Theme(t) => t.as_str().to_string(),
            Self::PollInterval(ms) => ms.to_string(),
            Self::GpioLayout(l) => l.as_str().to_string(),
            Self::Animations(on) => on.to_string(),
        }
    }
}
