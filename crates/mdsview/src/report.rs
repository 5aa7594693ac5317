//! Plain-text output for headless mode

use std::io::{self, Write};

use mdsview_core::{
    Address, Annotation, Category, CategorySchema, DisplaySink, RefreshSummary, RegisterSet, Row, TableSink,
};

/// Print every walked category as an aligned table
pub fn write_tables(out: &mut impl Write, sink: &TableSink, summary: &RefreshSummary) -> io::Result<()>
{
    for category in Category::ALL {
        if !sink.is_visible(category) {
            continue;
        }
        let failures = summary.category(category).map_or(0, |c| c.failures);
        let rows = sink.sorted_rows(category);
        let schema = sink
            .schema(category)
            .cloned()
            .unwrap_or_else(|| CategorySchema::for_category(category));

        match failures {
            0 => writeln!(out, "{category} ({})", rows.len())?,
            n => writeln!(out, "{category} ({}, {n} unreadable)", rows.len())?,
        }
        write_table(out, &schema, &rows)?;
        writeln!(out)?;
    }

    if !summary.skipped.is_empty() {
        let skipped: Vec<&str> = summary.skipped.iter().map(|c| c.name()).collect();
        writeln!(out, "Hidden: {}", skipped.join(", "))?;
    }
    Ok(())
}

fn write_table(out: &mut impl Write, schema: &CategorySchema, rows: &[&Row]) -> io::Result<()>
{
    let mut widths: Vec<usize> = schema.columns.iter().map(|column| column.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header: Vec<&str> = schema.columns.to_vec();
    write_line(out, &widths, &header, None)?;
    for row in rows {
        let cells: Vec<&str> = row.cells.iter().map(String::as_str).collect();
        write_line(out, &widths, &cells, row.annotation.as_ref())?;
    }
    Ok(())
}

fn write_line(out: &mut impl Write, widths: &[usize], cells: &[&str], annotation: Option<&Annotation>) -> io::Result<()>
{
    let mut line = String::new();
    for (index, cell) in cells.iter().enumerate() {
        let width = widths.get(index).copied().unwrap_or(0);
        if index > 0 {
            line.push_str("  ");
        }
        line.push_str(&format!("{cell:<width$}"));
    }
    match annotation {
        Some(Annotation::Warning(message)) => line.push_str(&format!("  ! {message}")),
        Some(Annotation::Diagnostic(message)) => line.push_str(&format!("  !! {message}")),
        None => {}
    }
    writeln!(out, "{}", line.trim_end())
}

/// Print a decoded register set, one register per line
pub fn write_registers(out: &mut impl Write, context: Address, registers: &RegisterSet) -> io::Result<()>
{
    let architecture = registers.architecture();
    writeln!(out, "Context {context} ({architecture})")?;
    writeln!(out, "  {:<8}{}", "pc", registers.pc)?;
    writeln!(out, "  {:<8}{}", "sp", registers.sp)?;
    writeln!(out, "  {:<8}0x{:X}", architecture.status_name(), registers.status)?;
    for (name, value) in registers.named() {
        match value {
            Some(value) => writeln!(out, "  {name:<8}0x{value:X}")?,
            None => writeln!(out, "  {name:<8}-")?,
        }
    }
    Ok(())
}
