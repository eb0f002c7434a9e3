//! Persisted kiosk settings with per-field change subscriptions.
//!
//! Values are stored as strings under fixed keys (see
//! [`SettingField::key`]). A missing key always means "use the default".

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use shared::{
    DEFAULT_POLL_INTERVAL_MS, GpioLayout, SettingChange, SettingField, Settings, Theme,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings encoding: {0}")]
    Json(#[from] serde_json::Error),
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Key/Value Backends
// ═══════════════════════════════════════════════════════════════════════════════

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
    fn remove(&mut self, key: &str) -> Result<(), SettingsError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SettingsError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A flat JSON object of string values, rewritten on every change.
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens `path`, treating a missing or unreadable file as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                log::warn!("ignoring corrupt settings file {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                log::warn!("cannot read settings file {}: {e}", path.display());
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), SettingsError> {
        let io = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(io)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json).map_err(io)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), SettingsError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Settings Store
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(SettingChange)>;

pub struct SettingsStore {
    backend: Box<dyn KeyValueStore>,
    subscribers: Vec<(SubscriptionId, SettingField, Callback)>,
    next_id: u64,
}

impl SettingsStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn get(&self) -> Settings {
        let d = Settings::default();
        let raw = |f: SettingField| self.backend.get(f.key());
        Settings {
            theme: raw(SettingField::Theme)
                .and_then(|s| Theme::parse(&s))
                .unwrap_or(d.theme),
            poll_interval_ms: raw(SettingField::PollInterval)
                .and_then(|s| s.trim().parse::<u32>().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            gpio_layout: raw(SettingField::GpioLayout)
                .and_then(|s| GpioLayout::parse(&s))
                .unwrap_or(d.gpio_layout),
            animations_enabled: raw(SettingField::Animations).is_none_or(|s| s != "false"),
        }
    }

    /// Raw persisted string for `field`, `None` when absent.
    pub fn persisted(&self, field: SettingField) -> Option<String> {
        self.backend.get(field.key())
    }

    pub fn subscribe(
        &mut self,
        field: SettingField,
        callback: impl FnMut(SettingChange) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, field, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), SettingsError> {
        self.set(SettingChange::Theme(theme))
    }

    pub fn set_poll_interval(&mut self, ms: u32) -> Result<(), SettingsError> {
        self.set(SettingChange::PollInterval(ms))
    }

    pub fn set_gpio_layout(&mut self, layout: GpioLayout) -> Result<(), SettingsError> {
        self.set(SettingChange::GpioLayout(layout))
    }

    pub fn set_animations(&mut self, enabled: bool) -> Result<(), SettingsError> {
        self.set(SettingChange::Animations(enabled))
    }

    /// Persists one field and notifies that field's subscribers. Subscribers
    /// are notified even if the write fails.
    pub fn set(&mut self, change: SettingChange) -> Result<(), SettingsError> {
        let key = change.field().key();
        let value = change.encoded();
        let result = self.backend.set(key, &value);
        match &result {
            Ok(()) => log::info!("setting {key} = {value}"),
            Err(e) => log::warn!("setting {key} = {value} not persisted: {e}"),
        }
        self.notify(change);
        result
    }

    /// Restores every field to its default and drops the persisted entries,
    /// but only if `confirm` returns true. Only fields whose value actually
    /// changes are notified. Returns whether a reset happened.
    pub fn reset(&mut self, confirm: impl FnOnce() -> bool) -> Result<bool, SettingsError> {
        if !confirm() {
            log::debug!("settings reset declined");
            return Ok(false);
        }

        let before = self.get();
        let defaults = Settings::default();
        let mut first_err = None;
        for field in SettingField::ALL {
            if let Err(e) = self.backend.remove(field.key()) {
                log::warn!("cannot remove setting {}: {e}", field.key());
                first_err.get_or_insert(e);
            }
            let change = change_for(field, &defaults);
            if change != change_for(field, &before) {
                self.notify(change);
            }
        }
        log::info!("settings reset to defaults");

        match first_err {
            Some(e) => Err(e),
            None => Ok(true),
        }
    }

    fn notify(&mut self, change: SettingChange) {
        let field = change.field();
        for (_, f, cb) in self.subscribers.iter_mut() {
            if *f == field {
                cb(change);
            }
        }
    }
}

fn change_for(field: SettingField, s: &Settings) -> SettingChange {
    match field {
        SettingField::Theme => SettingChange::Theme(s.theme),
        SettingField::PollInterval => SettingChange::PollInterval(s.poll_interval_ms),
        SettingField::GpioLayout => SettingChange::GpioLayout(s.gpio_layout),
        SettingField::Animations => SettingChange::Animations(s.animations_enabled),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Presentation side effects
// ═══════════════════════════════════════════════════════════════════════════════

pub const NO_ANIMATIONS_CLASS: &str = "no-animations";

/// Screen-wide presentation flags derived from settings: the active theme
/// attribute (absent for the default theme) and the motion class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presentation {
    pub theme_attr: Option<Theme>,
    pub motion_class: Option<&'static str>,
}

impl Presentation {
    pub fn from_settings(s: &Settings) -> Self {
        let mut p = Self::default();
        p.apply(SettingChange::Theme(s.theme));
        p.apply(SettingChange::Animations(s.animations_enabled));
        p
    }

    pub fn apply(&mut self, change: SettingChange) {
        match change {
            SettingChange::Theme(Theme::Green) => self.theme_attr = None,
            SettingChange::Theme(t) => self.theme_attr = Some(t),
            SettingChange::Animations(on) => {
                self.motion_class = if on { None } else { Some(NO_ANIMATIONS_CLASS) }
            }
            SettingChange::PollInterval(_) | SettingChange::GpioLayout(_) => {}
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme_attr.unwrap_or_default()
    }

    pub fn animations(&self) -> bool {
        self.motion_class.is_none()
    }
}
