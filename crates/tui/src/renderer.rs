use std::io::stdout;
use std::iter;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, Borders, List, ListItem, ListState, Paragraph, Wrap,
        canvas::{Canvas, Context, Line as CanvasLine, Points, Rectangle},
    },
};
use tracing::{debug, warn};
use tripchart_core::selection::SelectionController;
use tripchart_core::views::chart::{plot_area, render_chart};
use tripchart_core::views::time_axis::{AXIS_HEIGHT, render_time_axis};
use tripchart_protocol::{
    LineStyle, Point, RenderCommand, SERIES_PALETTE, TextAlign, ThemeToken, Viewport,
};

/// Render units per terminal cell. Chart layout constants are in these
/// units, so a cell is roughly one glyph wide and a bit under a line tall.
const CELL_WIDTH: f64 = 4.0;
const CELL_HEIGHT: f64 = 8.0;
const AXIS_ROWS: u16 = 3;
const SIDEBAR_WIDTH: u16 = 26;
const DASH: f64 = 6.0;
const DASH_GAP: f64 = 4.0;

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::Series(i) | ThemeToken::SeriesFill(i) => {
            let (r, g, b) = SERIES_PALETTE[usize::from(i) % SERIES_PALETTE.len()];
            Color::Rgb(r, g, b)
        }
        ThemeToken::ChartBackground | ThemeToken::Background => Color::Black,
        ThemeToken::ChartBorder | ThemeToken::GridLine => Color::DarkGray,
        ThemeToken::DoseLine => Color::Gray,
        ThemeToken::DoseText | ThemeToken::TextPrimary => Color::White,
        ThemeToken::AxisText => Color::Gray,
        ThemeToken::TextMuted => Color::DarkGray,
    }
}

/// Text shown in the non-chart panels.
#[derive(Debug, Clone, Default)]
pub struct Panels {
    pub narrative: String,
    pub metadata: String,
    pub substance: String,
}

impl Panels {
    pub fn to_markdown(&self) -> String {
        format!(
            "## Narrative\n\n{}\n## Metadata\n\n{}\n## Substance\n\n{}\n",
            self.narrative, self.metadata, self.substance
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    Charts,
    Narrative,
    Metadata,
    Substance,
}

impl Panel {
    fn title(self) -> &'static str {
        match self {
            Panel::Charts => "Charts",
            Panel::Narrative => "Narrative",
            Panel::Metadata => "Metadata",
            Panel::Substance => "Substance",
        }
    }

    fn next(self) -> Self {
        match self {
            Panel::Charts => Panel::Narrative,
            Panel::Narrative => Panel::Metadata,
            Panel::Metadata => Panel::Substance,
            Panel::Substance => Panel::Charts,
        }
    }
}

pub struct App {
    controller: SelectionController,
    panels: Panels,
    panel: Panel,
    cursor: ListState,
    scroll: u16,
    status: String,
}

impl App {
    pub fn new(controller: SelectionController, panels: Panels, status: String) -> Self {
        Self {
            controller,
            panels,
            panel: Panel::Charts,
            cursor: ListState::default().with_selected(Some(0)),
            scroll: 0,
            status,
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let count = self.controller.available_metrics().len();
        if count == 0 {
            return;
        }
        let current = self.cursor.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(count - 1);
        self.cursor.select(Some(next));
    }

    /// Toggle the metric under the cursor. A rejected selection leaves the
    /// charts as they were and shows the error.
    fn toggle_current(&mut self) {
        let Some(metric) = self
            .cursor
            .selected()
            .and_then(|i| self.controller.available_metrics().get(i))
            .cloned()
        else {
            return;
        };
        match self.controller.toggle(&metric) {
            Ok(charts) => {
                debug!(%metric, charts = charts.len(), "selection toggled");
                self.status.clear();
            }
            Err(err) => {
                warn!(%err, "selection rejected");
                self.status = err.to_string();
            }
        }
    }

    /// Returns `false` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_current(),
            KeyCode::Tab => {
                self.panel = self.panel.next();
                self.scroll = 0;
            }
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            _ => {}
        }
        true
    }

    fn panel_text(&self) -> &str {
        match self.panel {
            Panel::Charts => "",
            Panel::Narrative => &self.panels.narrative,
            Panel::Metadata => &self.panels.metadata,
            Panel::Substance => &self.panels.substance,
        }
    }
}

pub fn run(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if !app.handle_key(key.code) {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }
}

fn draw(frame: &mut Frame, app: &mut App) {
    let [header_area, body, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(frame.area());
    let [sidebar, main] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)]).areas(body);

    let timeline = app.controller.timeline();
    let header = Paragraph::new(format!(
        " tripchart | {} records, {} doses | ↑↓ move | space toggle | tab {} | q quit ",
        timeline.len(),
        app.controller.doses().len(),
        app.panel.next().title().to_lowercase(),
    ))
    .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(header, header_area);

    let selection = app.controller.selection();
    let items: Vec<ListItem> = app
        .controller
        .available_metrics()
        .iter()
        .map(|metric| {
            let position = selection.metrics().iter().position(|m| m == metric);
            let (mark, style) = match position {
                Some(index) => (
                    "[x] ",
                    Style::default().fg(theme_to_color(ThemeToken::series(index))),
                ),
                None => ("[ ] ", Style::default().fg(Color::Gray)),
            };
            ListItem::new(Line::from(vec![
                Span::styled(mark, style),
                Span::raw(metric.to_string()),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Metrics "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, sidebar, &mut app.cursor);

    match app.panel {
        Panel::Charts => draw_charts(frame, main, &app.controller),
        panel => {
            let text = Paragraph::new(app.panel_text())
                .wrap(Wrap { trim: false })
                .scroll((app.scroll, 0))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!(" {} ", panel.title())),
                );
            frame.render_widget(text, main);
        }
    }

    let status = Paragraph::new(app.status.as_str()).style(Style::default().fg(Color::Yellow));
    frame.render_widget(status, status_area);
}

/// The shared time ruler on top, then one chart per selected metric.
fn draw_charts(frame: &mut Frame, area: Rect, controller: &SelectionController) {
    let charts = controller.charts();
    let window = controller.timeline().time_window();
    let Some(window) = window.filter(|_| !charts.is_empty()) else {
        let hint = Paragraph::new(" Select a metric with space.")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, area);
        return;
    };

    let constraints = iter::once(Constraint::Length(AXIS_ROWS))
        .chain(iter::repeat_n(Constraint::Fill(1), charts.len()));
    let rows = Layout::vertical(constraints).split(area);

    let ruler_plot = plot_area(&viewport_for(rows[1]));
    let ruler = Viewport {
        x: ruler_plot.x,
        y: 0.0,
        width: ruler_plot.width,
        height: AXIS_HEIGHT,
    };
    let axis = render_time_axis(&ruler, &window, 0.0);
    frame.render_widget(command_canvas(&axis, viewport_for(rows[0])), rows[0]);

    for (index, (spec, row)) in charts.iter().zip(rows.iter().skip(1)).enumerate() {
        let viewport = viewport_for(*row);
        let commands = render_chart(spec, &viewport, &window, index);
        frame.render_widget(command_canvas(&commands, viewport), *row);
    }
}

fn viewport_for(area: Rect) -> Viewport {
    Viewport::new(
        f64::from(area.width) * CELL_WIDTH,
        f64::from(area.height) * CELL_HEIGHT,
    )
}

fn command_canvas(
    commands: &[RenderCommand],
    viewport: Viewport,
) -> Canvas<'_, impl Fn(&mut Context) + '_> {
    Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, viewport.width])
        .y_bounds([0.0, viewport.height])
        .paint(move |ctx| paint_commands(ctx, commands, viewport.height))
}

/// Replay render commands on a canvas. Command coordinates grow downwards,
/// canvas coordinates upwards.
fn paint_commands(ctx: &mut Context, commands: &[RenderCommand], height: f64) {
    let flip = |p: Point| (p.x, height - p.y);

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                border_color: Some(border),
                ..
            } => ctx.draw(&Rectangle {
                x: rect.x,
                y: height - rect.y - rect.h,
                width: rect.w,
                height: rect.h,
                color: theme_to_color(*border),
            }),
            RenderCommand::DrawText {
                position,
                text,
                color,
                align,
                ..
            } => {
                let width = text.chars().count() as f64 * CELL_WIDTH;
                let x = match align {
                    TextAlign::Left => position.x,
                    TextAlign::Center => position.x - width / 2.0,
                    TextAlign::Right => position.x - width,
                };
                ctx.print(
                    x.max(0.0),
                    height - position.y,
                    Span::styled(text.clone(), Style::default().fg(theme_to_color(*color))),
                );
            }
            RenderCommand::DrawLine {
                from,
                to,
                color,
                style,
                ..
            } => {
                let color = theme_to_color(*color);
                match style {
                    LineStyle::Solid => segment(ctx, flip(*from), flip(*to), color),
                    LineStyle::Dashed => dashed(ctx, flip(*from), flip(*to), color),
                }
            }
            RenderCommand::DrawPolyline { points, color, .. } => {
                let color = theme_to_color(*color);
                for pair in points.windows(2) {
                    segment(ctx, flip(pair[0]), flip(pair[1]), color);
                }
            }
            RenderCommand::DrawPoint { center, color, .. } => ctx.draw(&Points {
                coords: &[flip(*center)],
                color: theme_to_color(*color),
            }),
            // Braille fills would bury the series line; the canvas clips to
            // its own bounds already.
            RenderCommand::FillArea { .. }
            | RenderCommand::DrawRect { .. }
            | RenderCommand::SetClip { .. }
            | RenderCommand::ClearClip
            | RenderCommand::BeginGroup { .. }
            | RenderCommand::EndGroup => {}
        }
    }
}

fn segment(ctx: &mut Context, from: (f64, f64), to: (f64, f64), color: Color) {
    ctx.draw(&CanvasLine {
        x1: from.0,
        y1: from.1,
        x2: to.0,
        y2: to.1,
        color,
    });
}

fn dashed(ctx: &mut Context, from: (f64, f64), to: (f64, f64), color: Color) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let length = dx.hypot(dy);
    if length <= 0.0 {
        return;
    }
    let at = |t: f64| (from.0 + dx * t / length, from.1 + dy * t / length);

    let mut t = 0.0;
    while t < length {
        let end = (t + DASH).min(length);
        segment(ctx, at(t), at(end), color);
        t += DASH + DASH_GAP;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripchart_core::Session;
    use tripchart_core::config::DosePolicy;
    use tripchart_core::parsers::RawTable;

    fn app() -> App {
        let table = RawTable::new(
            ["time", "dose", "comment", "anxiety", "euphoria"]
                .map(String::from)
                .to_vec(),
            vec![
                ["20:00", "LSD:100ug", "onset", "3", "1"].map(String::from).to_vec(),
                ["21:00", "0", "peak", "1", "7"].map(String::from).to_vec(),
            ],
        );
        let session = Session::load(&table, DosePolicy::Skip).unwrap();
        let controller = SelectionController::for_session(&session, &["anxiety".parse().unwrap()]).unwrap();
        App::new(controller, Panels::default(), String::new())
    }

    #[test]
    fn space_toggles_metric_under_cursor() {
        let mut app = app();
        assert!(app.handle_key(KeyCode::Down));
        assert!(app.handle_key(KeyCode::Char(' ')));
        assert_eq!(
            app.controller.selection().metrics(),
            ["anxiety", "euphoria"]
        );

        app.handle_key(KeyCode::Up);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.controller.selection().metrics(), ["euphoria"]);
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut app = app();
        app.handle_key(KeyCode::Up);
        assert_eq!(app.cursor.selected(), Some(0));
        for _ in 0..5 {
            app.handle_key(KeyCode::Down);
        }
        assert_eq!(app.cursor.selected(), Some(1));
    }

    #[test]
    fn tab_cycles_panels_and_q_quits() {
        let mut app = app();
        app.handle_key(KeyCode::Tab);
        assert_eq!(app.panel, Panel::Narrative);
        for _ in 0..3 {
            app.handle_key(KeyCode::Tab);
        }
        assert_eq!(app.panel, Panel::Charts);
        assert!(!app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn series_colors_come_from_the_palette() {
        assert_eq!(
            theme_to_color(ThemeToken::series(0)),
            Color::Rgb(0xFD, 0x32, 0x16)
        );
        assert_eq!(
            theme_to_color(ThemeToken::series(24)),
            theme_to_color(ThemeToken::series(0))
        );
    }

    #[test]
    fn markdown_export_has_all_panels() {
        let panels = Panels {
            narrative: "**T+20:00 : ** *onset* \n\n --- \n".into(),
            metadata: "**Age** : 31\n\n".into(),
            substance: "# LSD\n".into(),
        };
        let doc = panels.to_markdown();
        assert!(doc.starts_with("## Narrative\n\n**T+20:00"));
        assert!(doc.contains("## Metadata\n\n**Age** : 31"));
        assert!(doc.ends_with("## Substance\n\n# LSD\n\n"));
    }
}
