//! Plain-text tables for terminal output.
//!
//! Columns whose cells are all numeric (optionally signed or suffixed with
//! `%` or `pp`) are right-aligned; everything else is left-aligned.

use std::{borrow::Cow, fmt::Write as _};

use crate::data::parse_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let widths = column_widths(headers, rows);
    let aligns = (0..headers.len())
        .map(|idx| column_alignment(rows, idx))
        .collect::<Vec<_>>();

    let mut output = String::new();
    let header_aligns = vec![Align::Left; headers.len()];
    let _ = writeln!(output, "{}", format_line(headers, &widths, &header_aligns));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_line(&rule, &widths, &header_aligns));
    for row in rows {
        let _ = writeln!(output, "{}", format_line(row, &widths, &aligns));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths = headers
        .iter()
        .map(|h| display_width(h).max(3))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(&clean_cell(cell)));
        }
    }
    widths
}

fn column_alignment(rows: &[Vec<String>], idx: usize) -> Align {
    let mut cells = rows
        .iter()
        .filter_map(|row| row.get(idx))
        .filter(|cell| !cell.is_empty())
        .peekable();
    if cells.peek().is_none() {
        return Align::Left;
    }
    if cells.all(|cell| looks_numeric(cell)) {
        Align::Right
    } else {
        Align::Left
    }
}

fn looks_numeric(cell: &str) -> bool {
    let trimmed = cell.trim();
    let trimmed = trimmed
        .strip_suffix('%')
        .or_else(|| trimmed.strip_suffix("pp"))
        .unwrap_or(trimmed);
    parse_number(trimmed.trim_start_matches('+')).is_some()
}

fn format_line(cells: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let mut line = String::new();
    for (idx, width) in widths.iter().enumerate() {
        let cell = cells.get(idx).map(|c| clean_cell(c)).unwrap_or_default();
        let pad = width.saturating_sub(display_width(&cell));
        if idx > 0 {
            line.push_str("  ");
        }
        match aligns.get(idx).copied().unwrap_or(Align::Left) {
            Align::Left => {
                line.push_str(&cell);
                line.extend(std::iter::repeat_n(' ', pad));
            }
            Align::Right => {
                line.extend(std::iter::repeat_n(' ', pad));
                line.push_str(&cell);
            }
        }
    }
    line.trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

/// Control characters would break the grid; render them as spaces.
fn clean_cell(value: &str) -> Cow<'_, str> {
    if value.chars().any(char::is_control) {
        Cow::Owned(
            value
                .chars()
                .map(|c| if c.is_control() { ' ' } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn numeric_columns_are_right_aligned() {
        let headers = strings(&["group", "n", "high"]);
        let rows = vec![
            strings(&["Nurse", "12", "41.67%"]),
            strings(&["Engineer", "3", "-5.2pp"]),
        ];
        let rendered = render_table(&headers, &rows);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "group     n    high");
        assert_eq!(lines[1], "--------  ---  ------");
        assert_eq!(lines[2], "Nurse      12  41.67%");
        assert_eq!(lines[3], "Engineer    3  -5.2pp");
    }

    #[test]
    fn multi_byte_cells_and_control_characters_keep_the_grid() {
        let headers = strings(&["band", "note"]);
        let rows = vec![strings(&["35–45h", "line\nbreak"])];
        let rendered = render_table(&headers, &rows);
        assert!(rendered.contains("35–45h  line break"));
    }
}
