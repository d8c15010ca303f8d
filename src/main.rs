use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use matscore_terminal::config::FeedConfig;
use matscore_terminal::html::export_html;
use matscore_terminal::logging::init_logging;
use matscore_terminal::page::{
    COMPLETION_TEXT, DatePicker, EMPTY_STATE_TEXT, Node, Page, UNAVAILABLE_TEXT,
};
use matscore_terminal::renderer::StreamRenderer;
use matscore_terminal::state::{self, AppState, CloseReason, StreamPhase, apply_delta};

struct App {
    state: AppState,
    config: FeedConfig,
    should_quit: bool,
}

impl App {
    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('h') | KeyCode::Left => self.state.shift_day(-1),
            KeyCode::Char('l') | KeyCode::Right => self.state.shift_day(1),
            KeyCode::Char('t') => self.state.jump_to(DatePicker::today().value()),
            KeyCode::Char('r') => self.state.refetch(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char(' ') | KeyCode::Enter => self.state.toggle_selected_league(),
            KeyCode::PageDown => self.state.scroll = self.state.scroll.saturating_add(10),
            KeyCode::PageUp => self.state.scroll = self.state.scroll.saturating_sub(10),
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn export(&mut self) {
        match export_html(self.state.renderer.page(), &self.config.export_dir) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "html export written");
                self.state
                    .push_log(format!("[INFO] Exported {}", path.display()));
            }
            Err(err) => {
                tracing::warn!(error = %err, "html export failed");
                self.state.push_log(format!("[WARN] Export failed: {err:#}"));
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = FeedConfig::from_env();
    let _log_guard = init_logging(&config.log_dir);

    let date_picker = config
        .initial_date
        .map(DatePicker::new)
        .unwrap_or_else(DatePicker::today);
    let (tx, rx) = mpsc::channel();
    let renderer = StreamRenderer::attach(
        Page::analysis_page(date_picker),
        config.build_source(),
        tx,
    )
    .context("analysis loader did not start")?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App {
        state: AppState::new(renderer),
        config,
        should_quit: false,
    };
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.state.renderer.tick(Instant::now());

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let results = Paragraph::new(results_lines(&app.state))
        .block(Block::default().title("Analyses").borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((app.state.scroll, 0));
    frame.render_widget(results, chunks[1]);

    let console = Paragraph::new(console_text(&app.state, chunks[2].height))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(
        "←/h →/l Day | t Today | r Refetch | j/k League | Space Collapse | e Export | ? Help | q Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let renderer = &state.renderer;
    let phase = match renderer.phase() {
        StreamPhase::Idle => "idle".to_string(),
        StreamPhase::Connecting => "connecting".to_string(),
        StreamPhase::Streaming => "streaming".to_string(),
        StreamPhase::Closed(CloseReason::Completed) => "complete".to_string(),
        StreamPhase::Closed(CloseReason::Cancelled) => "cancelled".to_string(),
        StreamPhase::Closed(CloseReason::Failed(_)) => "error".to_string(),
    };
    let line1 = format!(
        "  MATSCORE | {} | {} | {}",
        renderer.page().date_picker.iso(),
        phase,
        renderer.source_description()
    );
    let line2 = format!(
        "  Leagues: {}  Cards: {}",
        renderer.page().leagues().count(),
        renderer.page().card_count()
    );
    format!("{line1}\n{line2}")
}

fn results_lines(state: &AppState) -> Vec<Line<'static>> {
    let page = state.renderer.page();
    let mut lines = Vec::new();
    let mut league_idx = 0usize;

    for node in &page.nodes {
        match node {
            Node::Heading(text) => {
                lines.push(Line::styled(
                    text.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                lines.push(Line::default());
            }
            Node::Loading => {
                let label = page.loading_label.clone().unwrap_or_else(|| "…".to_string());
                lines.push(Line::styled(label, Style::default().fg(Color::DarkGray)));
            }
            Node::League(section) => {
                let selected = league_idx == state.selected_league;
                league_idx += 1;
                let marker = if section.open { "▾" } else { "▸" };
                let mut style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
                if selected {
                    style = style.bg(Color::DarkGray);
                }
                let mut title = format!("{marker} {}", section.name);
                if let Some(country) = &section.country {
                    title.push_str(&format!(" ({country})"));
                }
                title.push_str(&format!(" [{}]", section.cards.len()));
                lines.push(Line::styled(title, style));
                if !section.open {
                    continue;
                }
                for card in &section.cards {
                    let kickoff = card.kickoff_time.as_deref().unwrap_or("--:--");
                    lines.push(Line::from(vec![
                        Span::styled(
                            format!("   {kickoff}  "),
                            Style::default().fg(Color::DarkGray),
                        ),
                        Span::styled(
                            format!("{} vs {}", card.home_team, card.away_team),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                    ]));
                    lines.push(Line::from(format!(
                        "          Likely scenario: {}",
                        card.recommendation
                    )));
                    let link = match &card.link {
                        Some(href) => Span::styled(
                            format!("          {href}"),
                            Style::default().fg(Color::Blue),
                        ),
                        None => Span::styled(
                            format!("          {UNAVAILABLE_TEXT}"),
                            Style::default().fg(Color::DarkGray),
                        ),
                    };
                    lines.push(Line::from(link));
                }
                lines.push(Line::default());
            }
            Node::EmptyState => lines.push(Line::from(EMPTY_STATE_TEXT)),
            Node::Completion => lines.push(Line::styled(
                COMPLETION_TEXT,
                Style::default().fg(Color::Green),
            )),
            Node::Error(text) => lines.push(Line::styled(
                text.clone(),
                Style::default().fg(Color::Red),
            )),
        }
    }
    lines
}

fn console_text(state: &AppState, height: u16) -> String {
    let visible = height.saturating_sub(2) as usize;
    let skip = state.logs.len().saturating_sub(visible);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "MatScore Terminal - Help",
        "",
        "Date:",
        "  ← / h        Previous day",
        "  → / l        Next day",
        "  t            Today",
        "  r            Refetch current date",
        "",
        "Results:",
        "  j/k or ↑/↓   Select league",
        "  Space/Enter  Collapse or expand league",
        "  PgUp/PgDn    Scroll",
        "  e            Export page as HTML",
        "",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
