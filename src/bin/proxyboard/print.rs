#![deny(clippy::all, clippy::pedantic)]

use std::fmt::Write as _;

use proxyboard::application::table::{Breakpoints, Layout, TableEngine, TableView, layout_for_width};
use serde::Serialize;

use crate::client::CliError;

const MAX_CELL: usize = 48;

pub fn to_pretty<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::Render(e.to_string()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", to_pretty(value)?);
    Ok(())
}

fn clip(value: String) -> String {
    if value.chars().count() <= MAX_CELL {
        return value;
    }
    let mut clipped: String = value.chars().take(MAX_CELL - 3).collect();
    clipped.push_str("...");
    clipped
}

/// Renders one computed page for a terminal of `width` columns.
///
/// Narrow terminals get one card per row; wider ones a column-aligned table
/// whose lower-priority columns appear as the width grows. Collapsed groups
/// show only their header.
pub fn render_view<T>(
    engine: &TableEngine<T>,
    view: &TableView<'_, T>,
    breakpoints: Breakpoints,
    width: u16,
) -> String {
    let layout = layout_for_width(engine.columns(), breakpoints, width);
    let columns = layout.columns();
    let rows: Vec<(Option<usize>, Vec<String>)> = view
        .rows
        .iter()
        .map(|row| {
            let cells = columns
                .iter()
                .map(|column| clip(column.value(row.item).to_string()))
                .collect();
            (row.group, cells)
        })
        .collect();

    let mut out = String::new();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            rows.iter()
                .map(|(_, cells)| cells[index].chars().count())
                .chain(std::iter::once(column.label.len()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let write_rows = |out: &mut String, selected: &[&Vec<String>]| match &layout {
        Layout::Cards(_) => {
            for cells in selected {
                for (column, cell) in columns.iter().zip(cells.iter()) {
                    let _ = writeln!(out, "{}: {cell}", column.label);
                }
                out.push('\n');
            }
        }
        Layout::Table(_) => {
            for cells in selected {
                let line = cells
                    .iter()
                    .zip(&widths)
                    .map(|(cell, width)| format!("{cell:<width$}"))
                    .collect::<Vec<_>>()
                    .join("  ");
                let _ = writeln!(out, "{}", line.trim_end());
            }
        }
    };

    if !layout.is_cards() {
        let header = columns
            .iter()
            .zip(&widths)
            .map(|(column, width)| format!("{:<width$}", column.label.to_uppercase()))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "{}", header.trim_end());
    }

    if view.groups.is_empty() {
        let selected: Vec<&Vec<String>> = rows.iter().map(|(_, cells)| cells).collect();
        write_rows(&mut out, &selected);
    } else {
        for (index, group) in view.groups.iter().enumerate() {
            let selected: Vec<&Vec<String>> = rows
                .iter()
                .filter(|(row_group, _)| *row_group == Some(index))
                .map(|(_, cells)| cells)
                .collect();
            if group.collapsed {
                let _ = writeln!(out, "[+] {} ({})", group.key, group.count);
            } else if !selected.is_empty() {
                let _ = writeln!(out, "[-] {} ({})", group.key, group.count);
                write_rows(&mut out, &selected);
            }
        }
    }

    out.push_str(&footer(view));
    out
}

fn footer<T>(view: &TableView<'_, T>) -> String {
    match view.range() {
        Some((start, end)) => format!(
            "{start}-{end} of {} (page {} of {})",
            view.visible,
            view.page + 1,
            view.page_count
        ),
        None if view.matched == 0 => "No matching rows".to_string(),
        None => format!("No rows on page {} of {}", view.page + 1, view.page_count),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proxyboard::application::table::{CellValue, Column, ColumnPriority, TableQuery};

    use super::*;

    #[derive(Debug)]
    struct Row {
        name: &'static str,
        group: &'static str,
        port: i64,
    }

    fn engine() -> TableEngine<Row> {
        TableEngine::new(vec![
            Column::new("name", "Name", |r: &Row| CellValue::text(r.name)),
            Column::new("port", "Port", |r: &Row| CellValue::Int(r.port))
                .priority(ColumnPriority::P3)
                .hidden_in_card(),
        ])
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                name: "alpha",
                group: "one",
                port: 80,
            },
            Row {
                name: "beta",
                group: "two",
                port: 443,
            },
        ]
    }

    #[test]
    fn wide_terminal_renders_aligned_table() {
        let engine = engine();
        let data = rows();
        let view = engine.compute(&data, &TableQuery::new(10), &BTreeSet::new());
        let out = render_view(&engine, &view, Breakpoints::default(), 160);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "NAME   PORT");
        assert_eq!(lines[1], "alpha  80");
        assert_eq!(lines[2], "beta   443");
        assert_eq!(lines[3], "1-2 of 2 (page 1 of 1)");
    }

    #[test]
    fn narrow_terminal_renders_cards_without_hidden_columns() {
        let engine = engine();
        let data = rows();
        let view = engine.compute(&data, &TableQuery::new(10), &BTreeSet::new());
        let out = render_view(&engine, &view, Breakpoints::default(), 60);
        assert!(out.contains("Name: alpha\n"));
        assert!(!out.contains("Port"));
    }

    #[test]
    fn collapsed_groups_show_header_only() {
        let engine = engine().group_by(|r: &Row| r.group.to_string());
        let data = rows();
        let collapsed: BTreeSet<String> = ["two".to_string()].into_iter().collect();
        let view = engine.compute(&data, &TableQuery::new(10), &collapsed);
        let out = render_view(&engine, &view, Breakpoints::default(), 160);
        assert!(out.contains("[-] one (1)"));
        assert!(out.contains("[+] two (1)"));
        assert!(!out.contains("beta"));
    }

    #[test]
    fn empty_result_says_so() {
        let engine = engine().search_by(|r: &Row| r.name.to_string());
        let data = rows();
        let mut query = TableQuery::new(10);
        query.set_search("nothing");
        let view = engine.compute(&data, &query, &BTreeSet::new());
        assert!(render_view(&engine, &view, Breakpoints::default(), 160).ends_with("No matching rows"));
    }

    #[test]
    fn long_cells_are_clipped() {
        let clipped = clip("x".repeat(100));
        assert_eq!(clipped.chars().count(), MAX_CELL);
        assert!(clipped.ends_with("..."));
    }
}
