mod clipboard;
mod help;
mod state;

use crate::cli::Cli;
use crate::model::{SessionConfig, SessionEvent, SessionView};
use crate::orchestrator::{self, UiCommand};
use crate::session::MapSession;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Terminal,
};
use state::{Field, UiState};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli, cfg: SessionConfig) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let (completion_tx, completion_rx) = mpsc::unbounded_channel();

    let session = MapSession::new(&cfg, completion_tx).context("set up session")?;

    if args.new_map {
        let _ = cmd_tx.send(UiCommand::NewMap);
    }

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(event_rx, cmd_tx));

    let res = orchestrator::run_controller(session, completion_rx, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res.map(|_| ())
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    mut event_rx: UnboundedReceiver<SessionEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState::default();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if k.modifiers == KeyModifiers::CONTROL && k.code == KeyCode::Char('c') {
                    let _ = cmd_tx.send(UiCommand::Quit);
                    break Ok(());
                }

                if state.editing.is_some() {
                    handle_edit_key(&mut state, k.code, &cmd_tx);
                    continue;
                }

                match k.code {
                    KeyCode::Char('q') => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    KeyCode::Char('?') => state.show_help = !state.show_help,
                    KeyCode::Esc => state.show_help = false,
                    KeyCode::Char('a') => {
                        let _ = cmd_tx.send(UiCommand::AddStop);
                    }
                    KeyCode::Char('x') => {
                        let _ = cmd_tx.send(UiCommand::RemoveLastStop);
                    }
                    KeyCode::Char('g') => {
                        let _ = cmd_tx.send(UiCommand::Recompute);
                    }
                    KeyCode::Char('n') => {
                        let _ = cmd_tx.send(UiCommand::NewMap);
                    }
                    KeyCode::Char('y') => {
                        state.info = match clipboard::copy_to_clipboard(state.fragment()) {
                            Ok(()) => "Copied fragment to clipboard".into(),
                            Err(e) => format!("Clipboard error: {e:#}"),
                        };
                    }
                    KeyCode::Down | KeyCode::Tab => state.move_focus(1),
                    KeyCode::Up | KeyCode::BackTab => state.move_focus(-1),
                    KeyCode::Left if state.focused() == Some(Field::Mode) => {
                        state.move_mode_cursor(-1)
                    }
                    KeyCode::Right if state.focused() == Some(Field::Mode) => {
                        state.move_mode_cursor(1)
                    }
                    KeyCode::Char(' ') | KeyCode::Enter
                        if state.focused() == Some(Field::Mode) =>
                    {
                        if let Some(cmd) = state.select_mode_under_cursor() {
                            let _ = cmd_tx.send(cmd);
                        }
                    }
                    KeyCode::Enter => {
                        state.begin_edit();
                    }
                    KeyCode::PageDown => {
                        state.fragment_scroll = state.fragment_scroll.saturating_add(10)
                    }
                    KeyCode::PageUp => {
                        state.fragment_scroll = state.fragment_scroll.saturating_sub(10)
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn handle_edit_key(state: &mut UiState, code: KeyCode, cmd_tx: &UnboundedSender<UiCommand>) {
    match code {
        KeyCode::Enter => {
            if let Some(cmd) = state.commit_edit() {
                let _ = cmd_tx.send(cmd);
            }
        }
        KeyCode::Esc => state.cancel_edit(),
        KeyCode::Backspace => {
            if let Some(buf) = state.editing.as_mut() {
                buf.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(buf) = state.editing.as_mut() {
                buf.push(c);
            }
        }
        _ => {}
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(rows[0]);

    draw_form(cols[0], f, state);
    draw_fragment(cols[1], f, state);
    draw_status(rows[1], f, state);

    if state.show_help {
        let popup = centered(area, 60, 70);
        f.render_widget(Clear, popup);
        help::draw_help(popup, f);
    }
}

fn field_style(state: &UiState, field: Field) -> Style {
    if state.focused() != Some(field) {
        return Style::default();
    }
    if state.editing.is_some() {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    }
}

fn field_text(state: &UiState, field: Field) -> String {
    match (&state.editing, state.focused() == Some(field)) {
        (Some(buf), true) => format!("{buf}▏"),
        _ => state.field_value(field),
    }
}

fn draw_form(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Bus stops");
    let Some(view) = &state.view else {
        f.render_widget(Paragraph::new("Waiting for session…").block(block), area);
        return;
    };

    let label = Style::default().fg(Color::Gray);
    let mut lines: Vec<Line> = Vec::new();
    for (i, pair) in view.stops.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("#{:<3}", pair.id), label),
            Span::styled("start ", label),
            Span::styled(field_text(state, Field::Start(i)), field_style(state, Field::Start(i))),
        ]));
        lines.push(Line::from(vec![
            Span::raw("    "),
            Span::styled("end   ", label),
            Span::styled(field_text(state, Field::End(i)), field_style(state, Field::End(i))),
        ]));
    }

    if view.include_run_parameters {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Ants        ", label),
            Span::styled(field_text(state, Field::Ants), field_style(state, Field::Ants)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Iterations  ", label),
            Span::styled(
                field_text(state, Field::Iterations),
                field_style(state, Field::Iterations),
            ),
        ]));
        lines.push(mode_line(state, view));
    } else {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Stops only (reduced)", label)));
    }

    let p = Paragraph::new(lines).block(block);
    f.render_widget(p, area);
}

fn mode_line(state: &UiState, view: &SessionView) -> Line<'static> {
    let on_row = state.focused() == Some(Field::Mode);
    let mut spans = vec![Span::styled("Mode        ", Style::default().fg(Color::Gray))];
    for (i, opt) in view.modes.iter().enumerate() {
        let mark = if opt.checked { "(•) " } else { "( ) " };
        let mut style = if opt.checked {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        if on_row && i == state.mode_cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        spans.push(Span::styled(format!("{mark}{}", opt.value), style));
        spans.push(Span::raw("  "));
    }
    Line::from(spans)
}

fn draw_fragment(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let title = match &state.view {
        Some(view) => match (view.target.rendered_seq, view.target.rendered_at.as_deref()) {
            (Some(seq), Some(at)) => format!("{} · #{seq} · {at}", view.target.name),
            _ => view.target.name.clone(),
        },
        None => "Map".into(),
    };
    let p = Paragraph::new(state.fragment().to_string())
        .wrap(Wrap { trim: false })
        .scroll((state.fragment_scroll, 0))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut spans = vec![Span::raw(state.info.clone())];
    if let Some(view) = &state.view {
        if view.in_flight > 0 {
            spans.push(Span::styled(
                format!("  [{} in flight]", view.in_flight),
                Style::default().fg(Color::Cyan),
            ));
        }
        if let Some(err) = &view.last_error {
            spans.push(Span::styled(
                format!("  last error: #{} {}", err.seq, err.message),
                Style::default().fg(Color::Red),
            ));
        }
    }
    let p = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("route-planner"));
    f.render_widget(p, area);
}

fn centered(area: Rect, pct_x: u16, pct_y: u16) -> Rect {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Percentage((100 - pct_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Percentage((100 - pct_x) / 2),
        ])
        .split(v[1])[1]
}
