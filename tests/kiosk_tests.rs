use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::SeedableRng;
use rand::rngs::StdRng;
use shared::{GpioLayout, LineKind, SettingChange, Theme};

use rpi_kiosk::keyboard::Key;
use rpi_kiosk::stats::{MockStats, MockUptime};
use rpi_kiosk::{App, FileStore, MemoryStore, SettingsStore};

fn kiosk(store: SettingsStore, now: Instant) -> App {
    let mut app = App::new(
        store,
        MockStats::with_rng(StdRng::seed_from_u64(7)),
        MockUptime::with_rng(StdRng::seed_from_u64(8)),
        true,
        now,
    );
    app.activate(now);
    app
}

fn texts(app: &App) -> Vec<String> {
    app.terminal.lines().iter().map(|l| l.text.clone()).collect()
}

#[test]
fn typing_help_on_the_keyboard_lists_commands() {
    let mut app = kiosk(SettingsStore::new(MemoryStore::new()), Instant::now());
    for c in "HELP".chars() {
        app.press(Key::Char(c));
    }
    app.press(Key::Enter);

    let lines = texts(&app);
    assert!(lines.contains(&"> HELP".to_string()));
    let header = app
        .terminal
        .lines()
        .iter()
        .find(|l| l.text == "AVAILABLE COMMANDS:")
        .unwrap();
    assert_eq!(header.kind, LineKind::Success);
    assert!(app.terminal.input().is_empty());
}

#[test]
fn physical_keys_drive_the_same_terminal() {
    let mut app = kiosk(SettingsStore::new(MemoryStore::new()), Instant::now());
    for code in [
        KeyCode::Char('s'),
        KeyCode::Char('t'),
        KeyCode::Char('a'),
        KeyCode::Char('t'),
        KeyCode::Char('u'),
        KeyCode::Char('s'),
        KeyCode::Enter,
    ] {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }
    let lines = texts(&app);
    assert!(lines.contains(&"SYSTEM STATUS: ONLINE".to_string()));
    assert!(lines.iter().any(|l| l.starts_with("CPU: ")));
}

#[test]
fn reboot_survives_interleaved_commands() {
    let t0 = Instant::now();
    let mut app = kiosk(SettingsStore::new(MemoryStore::new()), t0);
    app.submit("reboot");
    app.submit("clear");
    app.submit("help");

    app.advance(t0 + Duration::from_millis(1999));
    assert!(!texts(&app).contains(&"System restart complete".to_string()));

    app.advance(t0 + Duration::from_millis(2000));
    let done = texts(&app)
        .iter()
        .filter(|l| *l == "System restart complete")
        .count();
    assert_eq!(done, 1);
    assert_eq!(app.pending_timers(), 0);
}

#[test]
fn clear_then_unknown_command() {
    let mut app = kiosk(SettingsStore::new(MemoryStore::new()), Instant::now());
    app.submit("clear");
    assert!(app.terminal.lines().is_empty());

    app.submit("  Reboot now ");
    let lines = app.terminal.lines();
    assert_eq!(lines[0].text, ">   Reboot now ");
    assert_eq!(lines[1].text, "Command not found:   Reboot now ");
    assert_eq!(lines[1].kind, LineKind::Error);
}

#[test]
fn gpio_twice_forgets_pin_levels() {
    let mut app = kiosk(SettingsStore::new(MemoryStore::new()), Instant::now());
    app.submit("gpio");
    app.toggle_pin(17);
    assert_eq!(app.dash.gpio.as_ref().and_then(|p| p.level(17)), Some(true));
    assert!(texts(&app).contains(&"GPIO 17 set to HIGH".to_string()));

    app.submit("gpio");
    assert!(!app.gpio_visible());
    app.submit("GPIO");
    assert_eq!(app.dash.gpio.as_ref().and_then(|p| p.level(17)), Some(false));
}

#[test]
fn settings_persist_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kiosk").join("settings.json");
    let t0 = Instant::now();

    {
        let mut app = kiosk(SettingsStore::new(FileStore::open(&path)), t0);
        app.change_setting(SettingChange::Theme(Theme::Amber));
        app.change_setting(SettingChange::GpioLayout(GpioLayout::List));
        app.change_setting(SettingChange::PollInterval(9000));
        app.change_setting(SettingChange::Animations(false));
        assert!(texts(&app).contains(&"Poll interval updated to 9s".to_string()));
        app.deactivate();
    }

    let app = kiosk(SettingsStore::new(FileStore::open(&path)), t0);
    let s = app.dash.current;
    assert_eq!(s.theme, Theme::Amber);
    assert_eq!(s.gpio_layout, GpioLayout::List);
    assert_eq!(s.poll_interval_ms, 9000);
    assert!(!s.animations_enabled);
    assert_eq!(app.dash.presentation.theme(), Theme::Amber);
    assert!(!app.dash.presentation.animations());
}

#[test]
fn reset_restores_defaults_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let t0 = Instant::now();

    let mut app = kiosk(SettingsStore::new(FileStore::open(&path)), t0);
    app.change_setting(SettingChange::Theme(Theme::Red));
    app.open_settings();
    app.answer_reset(true);
    assert_eq!(app.dash.current.theme, Theme::Green);
    app.deactivate();

    let reopened = SettingsStore::new(FileStore::open(&path));
    assert_eq!(reopened.get(), shared::Settings::default());
}
