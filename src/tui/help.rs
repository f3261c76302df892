use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(format!("{:pad$}{what}", "")),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        key_line("a", 11, "Add a stop pair"),
        key_line("x", 11, "Remove the last stop pair"),
        key_line("g", 11, "Generate routes"),
        key_line("n", 11, "New map (default stop layout)"),
        key_line("y", 11, "Copy fragment to clipboard"),
        key_line("?", 11, "Show this help"),
        Line::from(""),
        Line::from("Form:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("↑/↓", Style::default().fg(Color::Magenta)),
            Span::raw(" or "),
            Span::styled("tab", Style::default().fg(Color::Magenta)),
            Span::raw("  Move between fields"),
        ]),
        key_line("Enter", 7, "Edit field / store edit"),
        key_line("Esc", 9, "Cancel edit"),
        key_line("←/→", 9, "Choose mode"),
        key_line("Space", 7, "Select mode"),
        key_line("PgUp/PgDn", 3, "Scroll fragment"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
