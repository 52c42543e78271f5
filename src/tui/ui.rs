use super::app::{App, Row};
use crate::commands::{format_function, format_location};
use crate::node::Revision;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

pub fn render<R: Revision>(frame: &mut Frame, app: &mut App<'_, R>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(5),    // Tree + details
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);

    render_tree(frame, app, body[0]);
    render_details(frame, app, body[1]);
    render_footer(frame, chunks[2]);
}

fn render_header<R: Revision>(frame: &mut Frame, app: &App<'_, R>, area: Rect) {
    let header = Line::from(vec![
        Span::styled(
            "jsprof",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            format!(" {} ", app.revision_name().to_uppercase()),
            Style::default().bg(Color::Blue).fg(Color::White),
        ),
        Span::raw(format!(
            " {} │ {} samples │ {} rows",
            app.title(),
            app.total_samples(),
            app.rows().len()
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn row_line<'a, R: Revision>(row: &Row<'a, R>, total_samples: f64) -> Line<'a> {
    let marker = if !row.has_children() {
        "  "
    } else if row.expanded {
        "▾ "
    } else {
        "▸ "
    };
    let percent = if total_samples > 0.0 {
        row.subtree_samples * 100.0 / total_samples
    } else {
        0.0
    };

    Line::from(vec![
        Span::styled(
            format!("{:>5.1}% ", percent),
            Style::default().fg(color_for_percent(percent)),
        ),
        Span::raw("  ".repeat(row.depth())),
        Span::raw(marker),
        Span::styled(
            format_function(row.view.function_name()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                "  {}",
                format_location(row.view.script_name(), row.view.line_number())
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

fn render_tree<R: Revision>(frame: &mut Frame, app: &mut App<'_, R>, area: Rect) {
    let total = app.total_samples();
    let items: Vec<ListItem> = app
        .rows()
        .iter()
        .map(|row| ListItem::new(row_line(row, total)))
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Call tree "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_details<R: Revision>(frame: &mut Frame, app: &App<'_, R>, area: Rect) {
    let lines: Vec<Line> = match app.selected() {
        Some(row) => row
            .view
            .fields()
            .map(|(name, value)| {
                let style = if value.is_undefined() {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!("{:<18}", name), Style::default().fg(Color::Cyan)),
                    Span::styled(value.to_string(), style),
                ])
            })
            .collect(),
        None => vec![Line::from("(no value)")],
    };

    let details = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Node "))
        .wrap(Wrap { trim: false });
    frame.render_widget(details, area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let key = Style::default().bg(Color::DarkGray);
    let spans = vec![
        Span::styled(" q ", key),
        Span::raw(" quit "),
        Span::styled(" j/k ", key),
        Span::raw(" nav "),
        Span::styled(" h/l ", key),
        Span::raw(" collapse/expand "),
        Span::styled(" ␣ ", key),
        Span::raw(" toggle "),
        Span::styled(" e ", key),
        Span::raw(" expand all "),
        Span::styled(" g/G ", key),
        Span::raw(" top/end "),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn color_for_percent(percent: f64) -> Color {
    if percent >= 50.0 {
        Color::Red
    } else if percent >= 20.0 {
        Color::Yellow
    } else if percent >= 5.0 {
        Color::Green
    } else {
        Color::Gray
    }
}
