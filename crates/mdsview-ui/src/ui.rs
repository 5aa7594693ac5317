//! Screen layout: header, category tabs, main area, footer

use mdsview_core::{Category, DisplaySink, MemoryOracle};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs, Wrap};
use ratatui::Frame;

use crate::app::App;
use crate::widgets;

/// Draw the whole screen
pub fn draw<O: MemoryOracle>(frame: &mut Frame, app: &mut App<O>)
{
    let footer_height = if app.error_message.is_some() { 4 } else { 3 };
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(footer_height),
    ])
    .split(frame.area());

    draw_header(frame, chunks[0], app);
    draw_tabs(frame, chunks[1], app);
    draw_main(frame, chunks[2], app);
    draw_footer(frame, chunks[3], app);
}

fn draw_header<O: MemoryOracle>(frame: &mut Frame, area: Rect, app: &App<O>)
{
    let architecture = app
        .inspector
        .architecture()
        .map_or_else(|_| "unknown arch".to_string(), |arch| arch.to_string());

    let refresh = match (app.refresh_interval, app.paused) {
        (None, _) => "manual refresh".to_string(),
        (Some(_), true) => "auto-refresh paused".to_string(),
        (Some(interval), false) => format!("refresh every {}ms", interval.as_millis()),
    };

    let mut spans = vec![
        Span::styled(app.inspector.os_name(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {architecture}  {refresh}")),
    ];
    if let Some(summary) = &app.summary {
        let failures = summary.failures();
        if failures > 0 {
            spans.push(Span::styled(format!("  {failures} decode failures"), Style::default().fg(Color::Red)));
        }
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("mdsview"))
        .style(Style::default().fg(Color::Cyan));
    frame.render_widget(header, area);
}

fn draw_tabs<O: MemoryOracle>(frame: &mut Frame, area: Rect, app: &App<O>)
{
    let titles: Vec<Line> = Category::ALL
        .iter()
        .enumerate()
        .map(|(index, category)| {
            let label = format!("{}:{category}", index + 1);
            if app.sink.is_visible(*category) {
                Line::from(label)
            } else {
                Line::from(Span::styled(label, Style::default().fg(Color::DarkGray)))
            }
        })
        .collect();

    let selected = Category::ALL.iter().position(|c| *c == app.category).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

fn draw_main<O: MemoryOracle>(frame: &mut Frame, area: Rect, app: &mut App<O>)
{
    if app.is_hidden() {
        widgets::draw_hidden_notice(frame, area, app.category);
        return;
    }

    if app.show_registers && app.category == Category::Threads {
        let chunks = Layout::horizontal([Constraint::Min(0), Constraint::Length(34)]).split(area);
        widgets::draw_category_table(frame, chunks[0], app);
        widgets::draw_registers(frame, chunks[1], app);
    } else {
        widgets::draw_category_table(frame, area, app);
    }
}

fn draw_footer<O: MemoryOracle>(frame: &mut Frame, area: Rect, app: &App<O>)
{
    let help = "Tab/1-9:Category ↑/↓:Select r:Refresh p:Pause h:Hide g:Registers q:Quit";
    let mut lines = vec![Line::from(help)];
    if let Some(error) = &app.error_message {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    }

    let footer = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, area);
}
