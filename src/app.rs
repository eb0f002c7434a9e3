//! Application state and the event loop.
//!
//! Everything runs on one thread. Input, the stats deadline, deferred reboot
//! completions and queued notifications are handled one at a time, each to
//! completion, in the order they are observed.

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use shared::{
    GPIO_PINS, MAX_POLL_INTERVAL_MS, MIN_POLL_INTERVAL_MS, POLL_INTERVAL_STEP_MS, SettingChange,
    SettingField, Settings, SystemStats, Uptime,
};

use crate::gpio::GpioPanel;
use crate::keyboard::{self, Key};
use crate::net::{LinkProbe, LinkWatcher, NetworkMonitor};
use crate::settings::{Presentation, SettingsError, SettingsStore};
use crate::stats::{StatsSampler, StatsSource, UptimeSource};
use crate::terminal::{self, CommandHost, TerminalEngine};
use crate::timers::TimerQueue;
use crate::touch::{HitMap, TouchAdapter, TouchPhase};
use crate::ui;

const TICK: Duration = Duration::from_millis(250);
const BLINK: Duration = Duration::from_millis(500);
const SCROLL_PAGE: usize = 5;

/// Work posted back onto the loop thread by observers and the link watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Setting(SettingChange),
    Connectivity(bool),
    Pin(u8, bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    RebootComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    Gpio,
    Camera,
    Scripts,
    Config,
}

impl QuickAction {
    pub const ALL: [QuickAction; 4] = [Self::Gpio, Self::Camera, Self::Scripts, Self::Config];

    pub fn label(self) -> &'static str {
        match self {
            Self::Gpio => "GPIO",
            Self::Camera => "CAMERA",
            Self::Scripts => "SCRIPTS",
            Self::Config => "CONFIG",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsRow {
    Theme,
    PollInterval,
    GpioLayout,
    Animations,
    Reset,
    Close,
}

impl SettingsRow {
    pub const ALL: [SettingsRow; 6] = [
        Self::Theme,
        Self::PollInterval,
        Self::GpioLayout,
        Self::Animations,
        Self::Reset,
        Self::Close,
    ];
}

/// Anything on screen that reacts to a tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Key(Key),
    Pin(u8),
    Action(QuickAction),
    OpenSettings,
    SettingsRow(SettingsRow),
    SettingsAdjust(SettingsRow, i8),
    Confirm(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Terminal,
    Gpio,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsView {
    pub row: usize,
    pub confirm_reset: bool,
}

impl SettingsView {
    pub fn selected(&self) -> SettingsRow {
        SettingsRow::ALL[self.row]
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Dashboard: everything the console can reach
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Dashboard {
    pub settings: SettingsStore,
    /// Settings as last notified; merged one field at a time.
    pub current: Settings,
    pub presentation: Presentation,
    pub sampler: StatsSampler,
    pub network: NetworkMonitor,
    pub gpio: Option<GpioPanel>,
    pub settings_view: Option<SettingsView>,
    uptime: Box<dyn UptimeSource>,
    timers: TimerQueue<Deferred>,
    tx: Sender<AppEvent>,
    now: Instant,
}

impl Dashboard {
    fn set_gpio_visible(&mut self, visible: bool) {
        if visible == self.gpio.is_some() {
            return;
        }
        self.gpio = if visible {
            let tx = self.tx.clone();
            Some(GpioPanel::mount().with_callback(move |pin, level| {
                let _ = tx.send(AppEvent::Pin(pin, level));
            }))
        } else {
            None
        };
    }
}

impl CommandHost for Dashboard {
    fn is_online(&self) -> bool {
        self.network.is_online()
    }

    fn stats(&self) -> SystemStats {
        self.sampler.current()
    }

    fn uptime(&mut self) -> Uptime {
        self.uptime.uptime()
    }

    fn toggle_gpio_panel(&mut self) -> bool {
        let visible = self.gpio.is_none();
        self.set_gpio_visible(visible);
        visible
    }

    fn open_settings(&mut self) {
        if self.settings_view.is_none() {
            self.settings_view = Some(SettingsView::default());
        }
    }

    fn schedule_reboot(&mut self, delay: Duration) {
        self.timers.schedule(self.now, delay, Deferred::RebootComplete);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Application
// ═══════════════════════════════════════════════════════════════════════════════

pub struct App {
    pub terminal: TerminalEngine,
    pub dash: Dashboard,
    pub focus: Focus,
    pub gpio_cursor: usize,
    pub status: String,
    pub err: bool,
    pub quit: bool,
    rx: Receiver<AppEvent>,
    touch: TouchAdapter<Target>,
    hits: HitMap<Target>,
    watcher: Option<LinkWatcher>,
    started: Instant,
}

impl App {
    pub fn new(
        mut settings: SettingsStore,
        stats: impl StatsSource + 'static,
        uptime: impl UptimeSource + 'static,
        online: bool,
        now: Instant,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        for field in SettingField::ALL {
            let tx = tx.clone();
            settings.subscribe(field, move |change| {
                let _ = tx.send(AppEvent::Setting(change));
            });
        }
        let current = settings.get();

        Self {
            terminal: TerminalEngine::with_banner(),
            dash: Dashboard {
                presentation: Presentation::from_settings(&current),
                sampler: StatsSampler::new(stats, current.poll_interval_ms),
                network: NetworkMonitor::activate(online),
                gpio: None,
                settings_view: None,
                uptime: Box::new(uptime),
                timers: TimerQueue::new(),
                settings,
                current,
                tx,
                now,
            },
            focus: Focus::Terminal,
            gpio_cursor: 0,
            status: "Ready: type HELP  │  F2 Settings  │  Tab Focus  │  Ctrl+C Quit".into(),
            err: false,
            quit: false,
            rx,
            touch: TouchAdapter::new(),
            hits: HitMap::default(),
            watcher: None,
            started: now,
        }
    }

    /// Starts periodic sampling. Call once before the first frame.
    pub fn activate(&mut self, now: Instant) {
        self.dash.now = now;
        self.dash.sampler.activate(now);
    }

    /// Stops everything that would otherwise keep running after the view is
    /// gone: the stats deadline and the link watcher thread.
    pub fn deactivate(&mut self) {
        self.dash.sampler.deactivate();
        if let Some(mut w) = self.watcher.take() {
            w.stop();
        }
    }

    pub fn watch_link(&mut self, probe: Box<dyn LinkProbe>) {
        let initial = self.dash.network.is_online();
        self.watcher = Some(LinkWatcher::spawn(
            probe,
            initial,
            self.dash.tx.clone(),
            AppEvent::Connectivity,
        ));
    }

    /// Sender for events produced off the loop thread.
    pub fn events(&self) -> Sender<AppEvent> {
        self.dash.tx.clone()
    }

    pub fn gpio_visible(&self) -> bool {
        self.dash.gpio.is_some()
    }

    pub fn settings_open(&self) -> bool {
        self.dash.settings_view.is_some()
    }

    pub fn pending_timers(&self) -> usize {
        self.dash.timers.len()
    }

    /// Cursor blink phase. Always "on" when animations are disabled.
    pub fn blink_on(&self) -> bool {
        if !self.dash.presentation.animations() {
            return true;
        }
        let phase = self.dash.now.saturating_duration_since(self.started).as_millis()
            / BLINK.as_millis();
        phase % 2 == 0
    }

    // ─── Time ───────────────────────────────────────────────────────────────

    /// Runs whatever became due by `now` and drains queued notifications.
    pub fn advance(&mut self, now: Instant) {
        self.dash.now = now;
        if self.dash.sampler.poll(now).is_some() {
            log::trace!("stats sample {:?}", self.dash.sampler.current());
        }
        for d in self.dash.timers.take_due(now) {
            match d {
                Deferred::RebootComplete => self.terminal.complete_reboot(),
            }
        }
        self.drain_events();
    }

    fn next_wakeup(&self, now: Instant) -> Duration {
        [self.dash.sampler.next_due(), self.dash.timers.next_deadline()]
            .into_iter()
            .flatten()
            .map(|at| at.saturating_duration_since(now))
            .fold(TICK, Duration::min)
    }

    pub fn drain_events(&mut self) {
        while let Ok(ev) = self.rx.try_recv() {
            self.on_app_event(ev);
        }
    }

    fn on_app_event(&mut self, ev: AppEvent) {
        match ev {
            AppEvent::Setting(change) => {
                change.apply(&mut self.dash.current);
                self.dash.presentation.apply(change);
                if let SettingChange::PollInterval(ms) = change {
                    self.dash.sampler.set_interval(ms, self.dash.now);
                    self.terminal.push(terminal::poll_interval_line(ms));
                }
            }
            AppEvent::Connectivity(online) => self.dash.network.on_transition(online),
            AppEvent::Pin(pin, level) => self.terminal.push(terminal::pin_line(pin, level)),
        }
    }

    // ─── Actions ────────────────────────────────────────────────────────────

    pub fn submit(&mut self, input: &str) {
        self.terminal.submit(input, &mut self.dash);
        self.after_dispatch();
    }

    pub fn press(&mut self, key: Key) {
        self.terminal.key(key, &mut self.dash);
        self.after_dispatch();
    }

    fn after_dispatch(&mut self) {
        if !self.gpio_visible() && self.focus == Focus::Gpio {
            self.focus = Focus::Terminal;
        }
        self.drain_events();
    }

    pub fn quick_action(&mut self, action: QuickAction) {
        match action {
            QuickAction::Gpio => {
                let visible = self.dash.toggle_gpio_panel();
                self.terminal.push(terminal::gpio_visibility_line(visible));
                self.after_dispatch();
            }
            other => self.terminal.push(terminal::action_line(other.label())),
        }
    }

    pub fn toggle_pin(&mut self, pin: u8) {
        if let Some(panel) = self.dash.gpio.as_mut()
            && let Err(e) = panel.toggle(pin)
        {
            log::warn!("{e}");
        }
        self.drain_events();
    }

    pub fn open_settings(&mut self) {
        self.dash.open_settings();
    }

    pub fn close_settings(&mut self) {
        if self.dash.settings_view.take().is_some() {
            self.terminal.push(terminal::settings_saved_line());
        }
    }

    /// Applies one settings change through the store, reporting failed
    /// writes on the status bar.
    pub fn change_setting(&mut self, change: SettingChange) {
        let result = self.dash.settings.set(change);
        self.report(result);
        self.drain_events();
    }

    /// Answers the reset confirmation.
    pub fn answer_reset(&mut self, confirmed: bool) {
        if let Some(view) = self.dash.settings_view.as_mut() {
            view.confirm_reset = false;
        }
        match self.dash.settings.reset(|| confirmed) {
            Ok(true) => {
                self.status = "  ✓ Settings restored to defaults".into();
                self.err = false;
            }
            Ok(false) => {
                self.status = "Reset cancelled".into();
                self.err = false;
            }
            Err(e) => self.report(Err(e)),
        }
        self.drain_events();
    }

    fn report(&mut self, result: Result<(), SettingsError>) {
        if let Err(e) = result {
            self.status = format!("  ✗ {e}");
            self.err = true;
        }
    }

    fn adjust_setting(&mut self, row: SettingsRow, delta: i8) {
        let cur = self.dash.current;
        let change = match row {
            SettingsRow::Theme => Some(SettingChange::Theme(if delta < 0 {
                cur.theme.prev()
            } else {
                cur.theme.next()
            })),
            SettingsRow::PollInterval => {
                let step = i64::from(POLL_INTERVAL_STEP_MS) * i64::from(delta.signum());
                let ms = (i64::from(cur.poll_interval_ms) + step).clamp(
                    i64::from(MIN_POLL_INTERVAL_MS),
                    i64::from(MAX_POLL_INTERVAL_MS),
                ) as u32;
                (ms != cur.poll_interval_ms).then_some(SettingChange::PollInterval(ms))
            }
            SettingsRow::GpioLayout => Some(SettingChange::GpioLayout(cur.gpio_layout.toggled())),
            SettingsRow::Animations => Some(SettingChange::Animations(!cur.animations_enabled)),
            SettingsRow::Reset | SettingsRow::Close => None,
        };
        if let Some(change) = change {
            self.change_setting(change);
        }
    }

    fn activate_settings_row(&mut self, row: SettingsRow) {
        if let Some(view) = self.dash.settings_view.as_mut()
            && let Some(i) = SettingsRow::ALL.iter().position(|r| *r == row)
        {
            view.row = i;
        }
        match row {
            SettingsRow::Reset => {
                if let Some(view) = self.dash.settings_view.as_mut() {
                    view.confirm_reset = true;
                }
            }
            SettingsRow::Close => self.close_settings(),
            other => self.adjust_setting(other, 1),
        }
    }

    fn activate_target(&mut self, target: Target) {
        log::debug!("activate {target:?}");
        match target {
            Target::Key(k) => {
                self.focus = Focus::Terminal;
                self.press(k);
            }
            Target::Pin(pin) => {
                self.focus = Focus::Gpio;
                if let Some(i) = GPIO_PINS.iter().position(|p| *p == pin) {
                    self.gpio_cursor = i;
                }
                self.toggle_pin(pin);
            }
            Target::Action(a) => self.quick_action(a),
            Target::OpenSettings => self.open_settings(),
            Target::SettingsRow(row) => self.activate_settings_row(row),
            Target::SettingsAdjust(row, delta) => self.adjust_setting(row, delta),
            Target::Confirm(yes) => self.answer_reset(yes),
        }
    }

    // ─── Input ──────────────────────────────────────────────────────────────

    pub fn on_event(&mut self, ev: Event) {
        match ev {
            Event::Key(k) if k.kind == KeyEventKind::Press => self.on_key(k),
            Event::Mouse(m) => self.on_mouse(m),
            _ => {}
        }
    }

    pub fn on_mouse(&mut self, m: MouseEvent) {
        let phase = match m.kind {
            MouseEventKind::Down(MouseButton::Left) => TouchPhase::Start,
            MouseEventKind::Up(MouseButton::Left) => TouchPhase::End,
            MouseEventKind::ScrollUp => return self.terminal.scroll_up(1),
            MouseEventKind::ScrollDown => return self.terminal.scroll_down(1),
            _ => return,
        };
        let target = self.hits.hit(m.column, m.row);
        // While a modal is up only its own controls respond.
        let target = target.filter(|t| self.accepts(*t));
        if let Some(t) = self.touch.feed(phase, target) {
            self.activate_target(t);
        }
    }

    fn accepts(&self, t: Target) -> bool {
        match &self.dash.settings_view {
            None => !matches!(
                t,
                Target::SettingsRow(_) | Target::SettingsAdjust(..) | Target::Confirm(_)
            ),
            Some(v) if v.confirm_reset => matches!(t, Target::Confirm(_)),
            Some(_) => matches!(t, Target::SettingsRow(_) | Target::SettingsAdjust(..)),
        }
    }

    pub fn on_key(&mut self, k: KeyEvent) {
        if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }
        if k.code == KeyCode::F(10) {
            self.quit = true;
            return;
        }

        if self.dash.settings_view.is_some() {
            return self.on_key_settings(k);
        }

        match k.code {
            KeyCode::F(2) => return self.open_settings(),
            KeyCode::F(5) => return self.quick_action(QuickAction::Gpio),
            KeyCode::F(6) => return self.quick_action(QuickAction::Camera),
            KeyCode::F(7) => return self.quick_action(QuickAction::Scripts),
            KeyCode::F(8) => return self.quick_action(QuickAction::Config),
            KeyCode::PageUp => return self.terminal.scroll_up(SCROLL_PAGE),
            KeyCode::PageDown => return self.terminal.scroll_down(SCROLL_PAGE),
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Terminal if self.gpio_visible() => Focus::Gpio,
                    _ => Focus::Terminal,
                };
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::Terminal => {
                if let Some(key) = keyboard::from_key_event(&k) {
                    self.press(key);
                }
            }
            Focus::Gpio => self.on_key_gpio(k),
        }
    }

    fn on_key_gpio(&mut self, k: KeyEvent) {
        let len = GPIO_PINS.len();
        let cols = match self.dash.current.gpio_layout {
            shared::GpioLayout::Grid => ui::GPIO_GRID_COLS,
            shared::GpioLayout::List => 1,
        };
        match k.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.gpio_cursor = (self.gpio_cursor + len - 1) % len;
            }
            KeyCode::Right | KeyCode::Char('l') => self.gpio_cursor = (self.gpio_cursor + 1) % len,
            KeyCode::Up | KeyCode::Char('k') => {
                self.gpio_cursor = (self.gpio_cursor + len - cols % len) % len;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.gpio_cursor = (self.gpio_cursor + cols) % len;
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_pin(GPIO_PINS[self.gpio_cursor]),
            KeyCode::Esc => self.focus = Focus::Terminal,
            _ => {}
        }
    }

    fn on_key_settings(&mut self, k: KeyEvent) {
        let Some(view) = self.dash.settings_view else {
            return;
        };

        if view.confirm_reset {
            match k.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => self.answer_reset(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.answer_reset(false),
                _ => {}
            }
            return;
        }

        let rows = SettingsRow::ALL.len();
        match k.code {
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(v) = self.dash.settings_view.as_mut() {
                    v.row = (v.row + rows - 1) % rows;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(v) = self.dash.settings_view.as_mut() {
                    v.row = (v.row + 1) % rows;
                }
            }
            KeyCode::Left | KeyCode::Char('h') => self.adjust_setting(view.selected(), -1),
            KeyCode::Right | KeyCode::Char('l') => self.adjust_setting(view.selected(), 1),
            KeyCode::Enter | KeyCode::Char(' ') => self.activate_settings_row(view.selected()),
            KeyCode::Esc | KeyCode::F(2) => self.close_settings(),
            _ => {}
        }
    }

    // ─── Main Loop ──────────────────────────────────────────────────────────

    pub fn run(mut self, mut term: ratatui::DefaultTerminal) -> Result<()> {
        self.activate(Instant::now());
        loop {
            let mut hits = HitMap::default();
            term.draw(|f| hits = ui::draw(f, &self))?;
            self.hits = hits;

            let timeout = self.next_wakeup(Instant::now());
            if event::poll(timeout)? {
                let ev = event::read()?;
                self.dash.now = Instant::now();
                self.on_event(ev);
            }

            self.advance(Instant::now());

            if self.quit {
                break;
            }
        }
        self.deactivate();
        Ok(())
    }
}
