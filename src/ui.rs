//! Rendering. Every draw also returns the tap regions of the frame it drew.

use ratatui::prelude::*;
use ratatui::widgets::*;
use shared::{GpioLayout, LineKind, TerminalLine};

use crate::app::{App, Focus, QuickAction, SettingsRow, Target};
use crate::gpio::level_label;
use crate::keyboard::{self, Key};
use crate::theme::{self, Palette, Severity};
use crate::touch::HitMap;

pub const GPIO_GRID_COLS: usize = 6;
const GPIO_ROWS: usize = shared::GPIO_PINS.len().div_ceil(GPIO_GRID_COLS);
const LIST_HEIGHT: u16 = 12;

pub fn draw(f: &mut Frame, app: &App) -> HitMap<Target> {
    let pal = Palette::of(app.dash.presentation.theme());
    let mut hits = HitMap::default();

    let gpio_height = match (&app.dash.gpio, app.dash.current.gpio_layout) {
        (None, _) => 0,
        (Some(_), GpioLayout::Grid) => GPIO_ROWS as u16 * 2 + 2,
        (Some(_), GpioLayout::List) => LIST_HEIGHT,
    };

    let [header, grid, actions, gpio, term, kb, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(4),
        Constraint::Length(3),
        Constraint::Length(gpio_height),
        Constraint::Min(6),
        Constraint::Length(6),
        Constraint::Length(4),
    ])
    .areas(f.area());

    draw_header(f, header, &pal, &mut hits);
    draw_status_grid(f, grid, app, &pal);
    draw_actions(f, actions, &pal, &mut hits);
    if gpio_height > 0 {
        draw_gpio(f, gpio, app, &pal, &mut hits);
    }
    draw_terminal(f, term, app, &pal);
    draw_keyboard(f, kb, &pal, &mut hits);
    draw_footer(f, footer, app, &pal);

    if app.dash.settings_view.is_some() {
        draw_settings(f, app, &pal, &mut hits);
    }

    hits
}

fn panel<'a>(title: &'a str, pal: &Palette) -> Block<'a> {
    Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::new().fg(pal.dim))
        .title(Span::styled(
            format!(" {title} "),
            Style::new().fg(pal.accent).bold(),
        ))
}

// ─── Header ─────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, pal: &Palette, hits: &mut HitMap<Target>) {
    let block = Block::bordered()
        .border_type(BorderType::Double)
        .border_style(Style::new().fg(pal.accent));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let text = Line::from(vec![
        Span::styled("  ◆ ", Style::new().fg(pal.accent).bold()),
        Span::styled("R P i 5   K I T", Style::new().fg(pal.accent).bold()),
        Span::styled("  ◆  ", Style::new().fg(pal.accent)),
        Span::styled("Kiosk Manager", Style::new().fg(pal.dim)),
    ]);
    f.render_widget(Paragraph::new(text), inner);

    let label = " ⚙ SETTINGS ";
    let w = label.chars().count() as u16;
    if inner.width > w {
        let btn = Rect::new(inner.right() - w, inner.y, w, 1);
        f.render_widget(
            Paragraph::new(Span::styled(
                label,
                Style::new().fg(Color::Black).bg(pal.accent).bold(),
            )),
            btn,
        );
        hits.add(btn, Target::OpenSettings);
    }
}

// ─── Status Grid ────────────────────────────────────────────────────────────

fn draw_status_grid(f: &mut Frame, area: Rect, app: &App, pal: &Palette) {
    let s = app.dash.sampler.current();
    let online = app.dash.network.is_online();
    let cards = [
        (
            "CONNECTION",
            if online { "ONLINE" } else { "OFFLINE" }.to_string(),
            theme::connection_severity(online),
        ),
        ("CPU USAGE", format!("{}%", s.cpu), theme::cpu_severity(s.cpu)),
        ("TEMPERATURE", format!("{}°C", s.temp), theme::temp_severity(&s)),
        (
            "STORAGE",
            format!("{}%", s.storage),
            theme::storage_severity(s.storage),
        ),
    ];

    let areas = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);
    for ((label, value, sev), cell) in cards.into_iter().zip(areas.iter()) {
        let color = pal.severity(sev);
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(if sev == Severity::Success {
                pal.dim
            } else {
                color
            }));
        let lines = vec![
            Line::from(Span::styled(label, Style::new().fg(pal.dim))).centered(),
            Line::from(Span::styled(value, Style::new().fg(color).bold())).centered(),
        ];
        f.render_widget(Paragraph::new(lines).block(block), *cell);
    }
}

// ─── Quick Access ───────────────────────────────────────────────────────────

fn draw_actions(f: &mut Frame, area: Rect, pal: &Palette, hits: &mut HitMap<Target>) {
    let block = panel("QUICK ACCESS", pal);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let cells = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(inner);
    for (i, (action, cell)) in QuickAction::ALL.iter().zip(cells.iter()).enumerate() {
        let text = Line::from(vec![
            Span::styled(format!("F{} ", i + 5), Style::new().fg(pal.dark)),
            Span::styled(action.label(), Style::new().fg(pal.accent).bold()),
        ])
        .centered();
        f.render_widget(Paragraph::new(text), *cell);
        hits.add(*cell, Target::Action(*action));
    }
}

// ─── GPIO ───────────────────────────────────────────────────────────────────

fn draw_gpio(f: &mut Frame, area: Rect, app: &App, pal: &Palette, hits: &mut HitMap<Target>) {
    let Some(panel_state) = app.dash.gpio.as_ref() else {
        return;
    };
    let block = panel("GPIO INTERFACE", pal);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let focused = app.focus == Focus::Gpio;
    let style_for = |i: usize, level: bool| {
        let base = if level {
            Style::new().fg(Color::Black).bg(pal.accent).bold()
        } else {
            Style::new().fg(pal.fg)
        };
        if focused && i == app.gpio_cursor {
            base.add_modifier(Modifier::REVERSED)
        } else {
            base
        }
    };

    match app.dash.current.gpio_layout {
        GpioLayout::Grid => {
            let col_w = inner.width / GPIO_GRID_COLS as u16;
            for (i, (pin, level)) in panel_state.iter().enumerate() {
                let col = (i % GPIO_GRID_COLS) as u16;
                let row = (i / GPIO_GRID_COLS) as u16;
                let cell = Rect::new(inner.x + col * col_w, inner.y + row * 2, col_w, 2)
                    .intersection(inner);
                let indicator = if level { "●" } else { "○" };
                let lines = vec![
                    Line::from(format!("GPIO {pin}")).centered(),
                    Line::from(format!("{indicator} {}", level_label(level))).centered(),
                ];
                f.render_widget(Paragraph::new(lines).style(style_for(i, level)), cell);
                hits.add(cell, Target::Pin(pin));
            }
        }
        GpioLayout::List => {
            let visible = inner.height as usize;
            let first = app.gpio_cursor.saturating_sub(visible.saturating_sub(1));
            for (row, (i, (pin, level))) in panel_state
                .iter()
                .enumerate()
                .skip(first)
                .take(visible)
                .enumerate()
            {
                let cell = Rect::new(inner.x, inner.y + row as u16, inner.width, 1);
                let indicator = if level { "●" } else { "○" };
                let text = format!("  GPIO {pin:<4} {indicator} {}", level_label(level));
                f.render_widget(Paragraph::new(text).style(style_for(i, level)), cell);
                hits.add(cell, Target::Pin(pin));
            }
        }
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

fn line_style(kind: LineKind, pal: &Palette) -> Style {
    match kind {
        LineKind::System => Style::new().fg(pal.accent).bold(),
        LineKind::Output => Style::new().fg(pal.fg),
        LineKind::Success => Style::new().fg(pal.accent),
        LineKind::Warning => Style::new().fg(pal.warn).bold(),
        LineKind::Error => Style::new().fg(pal.err).bold(),
        LineKind::Command => Style::new().fg(pal.dim),
    }
}

/// The slice of scrollback that fits `rows`, honouring the scroll offset.
pub fn visible_lines(lines: &[TerminalLine], rows: usize, scroll: usize) -> &[TerminalLine] {
    let end = lines.len().saturating_sub(scroll);
    let start = end.saturating_sub(rows);
    &lines[start..end]
}

fn draw_terminal(f: &mut Frame, area: Rect, app: &App, pal: &Palette) {
    let scroll = app.terminal.scroll_offset();
    let title = if scroll > 0 {
        format!("TERMINAL  ↑{scroll}")
    } else {
        "TERMINAL".to_string()
    };
    let border = if app.focus == Focus::Terminal {
        pal.accent
    } else {
        pal.dim
    };
    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::new().fg(border))
        .title(Span::styled(
            format!(" {title} "),
            Style::new().fg(pal.accent).bold(),
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = (inner.height as usize).saturating_sub(1);
    let mut lines: Vec<Line> = visible_lines(app.terminal.lines(), rows, scroll)
        .iter()
        .map(|l| Line::from(Span::styled(l.text.clone(), line_style(l.kind, pal))))
        .collect();

    let cursor = if app.blink_on() { "█" } else { " " };
    lines.push(Line::from(vec![
        Span::styled("> ", Style::new().fg(pal.accent).bold()),
        Span::styled(
            app.terminal.input().as_str().to_string(),
            Style::new().fg(pal.fg),
        ),
        Span::styled(cursor, Style::new().fg(pal.accent)),
    ]));

    f.render_widget(Paragraph::new(lines), inner);
}

// ─── On-screen keyboard ─────────────────────────────────────────────────────

fn key_width(k: Key) -> u16 {
    k.label().chars().count() as u16 + 4
}

fn draw_keyboard(f: &mut Frame, area: Rect, pal: &Palette, hits: &mut HitMap<Target>) {
    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::new().fg(pal.dark));
    let inner = block.inner(area);
    f.render_widget(block, area);

    for (r, row) in keyboard::rows().into_iter().enumerate() {
        let y = inner.y + r as u16;
        if y >= inner.bottom() {
            break;
        }
        let total: u16 = row.iter().map(|k| key_width(*k) + 1).sum();
        let mut x = inner.x + inner.width.saturating_sub(total) / 2;
        for key in row {
            let w = key_width(key);
            let cell = Rect::new(x, y, w, 1).intersection(inner);
            let style = if key.is_wide() {
                Style::new().fg(Color::Black).bg(pal.dim).bold()
            } else {
                Style::new().fg(pal.accent).bg(pal.bg_hl).bold()
            };
            f.render_widget(
                Paragraph::new(format!("  {}  ", key.label())).style(style),
                cell,
            );
            hits.add(cell, Target::Key(key));
            x += w + 1;
        }
    }
}

// ─── Footer ─────────────────────────────────────────────────────────────────

fn draw_footer(f: &mut Frame, area: Rect, app: &App, pal: &Palette) {
    let online = app.dash.network.is_online();
    let net = if online {
        Span::styled(" ● SYSTEM ONLINE ", Style::new().fg(pal.accent).bold())
    } else {
        Span::styled(" ● SYSTEM OFFLINE ", Style::new().fg(pal.err).bold())
    };
    let sc = if app.err { pal.err } else { pal.dim };

    let help = match app.focus {
        Focus::Terminal => {
            " Type + Enter │ PgUp/PgDn Scroll │ F2 Settings │ F5-F8 Actions │ Tab GPIO │ ^C Quit "
        }
        Focus::Gpio => " ←↑↓→ Select pin │ Enter Toggle │ Tab/Esc Terminal │ Ctrl+C Quit ",
    };

    let lines = vec![
        Line::from(vec![
            net,
            Span::raw(" "),
            Span::styled(app.status.clone(), Style::new().fg(sc)),
        ]),
        Line::from(Span::styled(help, Style::new().fg(pal.dark))),
    ];

    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::new().fg(pal.dark));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

// ─── Settings modal ─────────────────────────────────────────────────────────

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    let w = w.min(area.width);
    let h = h.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

const LABEL_W: u16 = 22;
const ARROW_L: &str = "◀ ";
const ARROW_R: &str = " ▶";

fn draw_settings(f: &mut Frame, app: &App, pal: &Palette, hits: &mut HitMap<Target>) {
    let Some(view) = app.dash.settings_view else {
        return;
    };
    let cur = &app.dash.current;
    let area = centered(f.area(), 58, 16);
    f.render_widget(Clear, area);

    let block = Block::bordered()
        .border_type(BorderType::Double)
        .border_style(Style::new().fg(pal.accent))
        .title(Span::styled(" SETTINGS ", Style::new().fg(pal.accent).bold()))
        .title_bottom(Line::from(Span::styled(
            " raspi5Kit v1.0 ",
            Style::new().fg(pal.dark),
        )));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if view.confirm_reset {
        draw_confirm(f, inner, pal, hits);
        return;
    }

    let secs = cur.poll_interval_ms / 1000;
    let rows: [(SettingsRow, &str, Option<String>); 6] = [
        (
            SettingsRow::Theme,
            "TERMINAL THEME",
            Some(cur.theme.as_str().to_uppercase()),
        ),
        (
            SettingsRow::PollInterval,
            "STATS UPDATE INTERVAL",
            Some(format!("{secs}s")),
        ),
        (
            SettingsRow::GpioLayout,
            "GPIO LAYOUT",
            Some(match cur.gpio_layout {
                GpioLayout::Grid => "GRID VIEW".into(),
                GpioLayout::List => "LIST VIEW".into(),
            }),
        ),
        (
            SettingsRow::Animations,
            "ANIMATIONS",
            Some(if cur.animations_enabled { "ENABLED" } else { "DISABLED" }.into()),
        ),
        (SettingsRow::Reset, "RESET DEFAULTS", None),
        (SettingsRow::Close, "SAVE & CLOSE", None),
    ];

    for (i, (row, label, value)) in rows.into_iter().enumerate() {
        let y = inner.y + 1 + (i as u16) * 2;
        if y >= inner.bottom() {
            break;
        }
        let line_area = Rect::new(inner.x, y, inner.width, 1);
        let sel = view.row == i;
        let ls = if sel {
            Style::new().fg(pal.accent).bg(pal.bg_hl).bold()
        } else {
            Style::new().fg(pal.fg)
        };
        let arrow = if sel { " ▸ " } else { "   " };

        let mut spans = vec![
            Span::styled(arrow, ls),
            Span::styled(format!("{label:<w$}", w = LABEL_W as usize), ls),
        ];
        let adjustable = matches!(row, SettingsRow::Theme | SettingsRow::PollInterval);
        if let Some(v) = &value {
            let vs = Style::new().fg(pal.accent).bold();
            if adjustable {
                spans.push(Span::styled(ARROW_L, Style::new().fg(pal.dim)));
                spans.push(Span::styled(v.clone(), vs));
                spans.push(Span::styled(ARROW_R, Style::new().fg(pal.dim)));
            } else {
                spans.push(Span::styled(v.clone(), vs));
            }
        }
        f.render_widget(Paragraph::new(Line::from(spans)), line_area);
        hits.add(line_area, Target::SettingsRow(row));

        if adjustable && let Some(v) = &value {
            let vx = inner.x + 3 + LABEL_W;
            let left = Rect::new(vx, y, 2, 1).intersection(inner);
            let right_x = vx + 2 + v.chars().count() as u16;
            let right = Rect::new(right_x, y, 2, 1).intersection(inner);
            hits.add(left, Target::SettingsAdjust(row, -1));
            hits.add(right, Target::SettingsAdjust(row, 1));
        }
    }
}

fn draw_confirm(f: &mut Frame, inner: Rect, pal: &Palette, hits: &mut HitMap<Target>) {
    let mid = inner.y + inner.height / 2;
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Reset all settings to defaults? [Y/N]",
            Style::new().fg(pal.warn).bold(),
        )))
        .centered(),
        Rect::new(inner.x, mid.saturating_sub(2), inner.width, 1),
    );

    let yes = " [ YES ] ";
    let no = " [ NO ] ";
    let w = (yes.len() + 4 + no.len()) as u16;
    let x = inner.x + inner.width.saturating_sub(w) / 2;
    let yes_area = Rect::new(x, mid, yes.len() as u16, 1).intersection(inner);
    let no_x = x + yes.len() as u16 + 4;
    let no_area = Rect::new(no_x, mid, no.len() as u16, 1).intersection(inner);

    f.render_widget(
        Paragraph::new(yes).style(Style::new().fg(Color::Black).bg(pal.warn).bold()),
        yes_area,
    );
    f.render_widget(
        Paragraph::new(no).style(Style::new().fg(Color::Black).bg(pal.dim).bold()),
        no_area,
    );
    hits.add(yes_area, Target::Confirm(true));
    hits.add(no_area, Target::Confirm(false));
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::settings::{MemoryStore, SettingsStore};
    use crate::stats::{MockStats, MockUptime};

    fn app() -> App {
        let now = Instant::now();
        let mut app = App::new(
            SettingsStore::new(MemoryStore::new()),
            MockStats::with_rng(StdRng::seed_from_u64(5)),
            MockUptime::with_rng(StdRng::seed_from_u64(6)),
            false,
            now,
        );
        app.activate(now);
        app
    }

    fn render(app: &App) -> (String, HitMap<Target>) {
        let mut term = Terminal::new(TestBackend::new(100, 48)).unwrap();
        let mut hits = HitMap::default();
        term.draw(|f| hits = draw(f, app)).unwrap();
        let buf = term.backend().buffer().clone();
        let text = buf
            .content()
            .chunks(buf.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        (text, hits)
    }

    #[test]
    fn visible_lines_respects_scroll() {
        let lines: Vec<_> = (0..10).map(|i| TerminalLine::output(i.to_string())).collect();
        assert_eq!(visible_lines(&lines, 3, 0)[0].text, "7");
        assert_eq!(visible_lines(&lines, 3, 2)[2].text, "7");
        assert_eq!(visible_lines(&lines, 30, 0).len(), 10);
        assert!(visible_lines(&lines, 3, 20).is_empty());
    }

    #[test]
    fn dashboard_renders_banner_and_offline_state() {
        let (text, hits) = render(&app());
        assert!(text.contains("ROBCO INDUSTRIES"));
        assert!(text.contains("SYSTEM OFFLINE"));
        assert!(text.contains("QUICK ACCESS"));
        // 26 letters, 4 action keys, 4 quick actions and the settings button.
        assert_eq!(hits.len(), 35);
    }

    #[test]
    fn gpio_panel_registers_every_pin() {
        let mut app = app();
        app.submit("gpio");
        let (text, hits) = render(&app);
        assert!(text.contains("GPIO INTERFACE"));
        assert!(text.contains("GPIO 17"));
        assert_eq!(hits.len(), 35 + 22);
    }

    #[test]
    fn settings_modal_draws_over_dashboard() {
        let mut app = app();
        app.submit("settings");
        let (text, hits) = render(&app);
        assert!(text.contains("STATS UPDATE INTERVAL"));
        assert!(text.contains("5s"));
        let mid = hits.hit(50, 24);
        assert!(mid.is_some());
    }
}
