//! Tables and panels for the main area

use mdsview_core::{Annotation, Category, CategorySchema, MemoryOracle, Row as KernelRow};
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use crate::app::App;

/// Draw the current category as a table
pub fn draw_category_table<O: MemoryOracle>(frame: &mut Frame, area: Rect, app: &mut App<O>)
{
    let schema = app
        .sink
        .schema(app.category)
        .cloned()
        .unwrap_or_else(|| CategorySchema::for_category(app.category));

    // Borrow the sink field alone so the table state stays mutable
    let rows: Vec<Row> = app
        .sink
        .sorted_rows(app.category)
        .into_iter()
        .map(|row| table_row(&schema, row))
        .collect();
    let title = format!("{} ({})", app.category, rows.len());

    let header = Row::new(
        schema
            .columns
            .iter()
            .map(|column| Cell::from(*column).style(Style::default().add_modifier(Modifier::BOLD))),
    );
    let widths = column_widths(&schema);

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn table_row<'a>(schema: &CategorySchema, row: &'a KernelRow) -> Row<'a>
{
    let style = match &row.annotation {
        Some(Annotation::Warning(_)) => Style::default().fg(Color::Yellow),
        Some(Annotation::Diagnostic(_)) => Style::default().fg(Color::Red),
        None => Style::default(),
    };

    let cells = row.cells.iter().enumerate().map(|(column, value)| {
        let cell = Cell::from(value.as_str());
        if schema.is_highlighted(column, value) {
            cell.style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        } else {
            cell
        }
    });
    Row::new(cells).style(style)
}

/// Address columns are fixed width; the rest share what is left
fn column_widths(schema: &CategorySchema) -> Vec<Constraint>
{
    schema
        .columns
        .iter()
        .enumerate()
        .map(|(index, _)| match index {
            0 => Constraint::Length(12),
            1 => Constraint::Length(9),
            _ => Constraint::Fill(1),
        })
        .collect()
}

/// Draw the saved registers of the selected thread
pub fn draw_registers<O: MemoryOracle>(frame: &mut Frame, area: Rect, app: &App<O>)
{
    let block = Block::default().borders(Borders::ALL).title("Registers");

    let registers = match &app.registers {
        Some(Ok(registers)) => registers,
        Some(Err(err)) => {
            let message = Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red)).block(block);
            frame.render_widget(message, area);
            return;
        }
        None => {
            frame.render_widget(Paragraph::new("No thread selected").block(block), area);
            return;
        }
    };

    let mut rows = vec![
        Row::new([Cell::from("pc"), Cell::from(registers.pc.to_string())]),
        Row::new([Cell::from("sp"), Cell::from(registers.sp.to_string())]),
        Row::new([
            Cell::from(registers.architecture().status_name()),
            Cell::from(format!("0x{:X}", registers.status)),
        ]),
    ];
    rows.extend(registers.named().map(|(name, value)| {
        let value = value.map_or_else(|| "-".to_string(), |value| format!("0x{value:X}"));
        Row::new([Cell::from(name), Cell::from(value)])
    }));

    let title = format!("Registers ({})", registers.architecture());
    let table = Table::new(rows, [Constraint::Length(8), Constraint::Min(0)])
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

/// Placeholder for a category the user hid
pub fn draw_hidden_notice(frame: &mut Frame, area: Rect, category: Category)
{
    let lines = vec![
        Line::from(format!("{category} are hidden and not read from the target.")),
        Line::from("Press h to show them again."),
    ];
    let notice = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(category.name()))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(notice, area);
}
