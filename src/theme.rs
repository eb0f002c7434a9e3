//! Phosphor palettes and status severities.

use ratatui::style::Color;
use shared::{SystemStats, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Color,
    pub dim: Color,
    pub dark: Color,
    pub bg_hl: Color,
    pub fg: Color,
    pub warn: Color,
    pub err: Color,
}

const WARN: Color = Color::Rgb(255, 200, 0);
const ERR: Color = Color::Rgb(255, 70, 50);

const fn scale(c: (u8, u8, u8), pct: u16) -> Color {
    Color::Rgb(
        (c.0 as u16 * pct / 100) as u8,
        (c.1 as u16 * pct / 100) as u8,
        (c.2 as u16 * pct / 100) as u8,
    )
}

const fn palette(rgb: (u8, u8, u8)) -> Palette {
    Palette {
        accent: Color::Rgb(rgb.0, rgb.1, rgb.2),
        dim: scale(rgb, 55),
        dark: scale(rgb, 25),
        bg_hl: scale(rgb, 12),
        fg: scale(rgb, 85),
        warn: WARN,
        err: ERR,
    }
}

pub fn rgb(theme: Theme) -> (u8, u8, u8) {
    match theme {
        Theme::Green => (0x00, 0xff, 0x41),
        Theme::Amber => (0xff, 0xb0, 0x00),
        Theme::Blue => (0x00, 0xd4, 0xff),
        Theme::Red => (0xff, 0x2a, 0x2a),
    }
}

impl Palette {
    pub fn of(theme: Theme) -> Self {
        palette(rgb(theme))
    }

    pub fn severity(&self, s: Severity) -> Color {
        match s {
            Severity::Success => self.accent,
            Severity::Warning => self.warn,
            Severity::Error => self.err,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Status thresholds
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

pub fn connection_severity(online: bool) -> Severity {
    if online {
        Severity::Success
    } else {
        Severity::Error
    }
}

pub fn cpu_severity(cpu: u8) -> Severity {
    match cpu {
        81.. => Severity::Error,
        61..=80 => Severity::Warning,
        _ => Severity::Success,
    }
}

pub fn temp_severity(stats: &SystemStats) -> Severity {
    match stats.temp.tenths() {
        701.. => Severity::Error,
        601..=700 => Severity::Warning,
        _ => Severity::Success,
    }
}

pub fn storage_severity(storage: u8) -> Severity {
    if storage > 80 {
        Severity::Warning
    } else {
        Severity::Success
    }
}
