use crate::cli::{io, ui::style::UiStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

/// Declarative description of a table column.
#[derive(Debug, Clone)]
pub struct TableColumn {
    pub header: String,
    pub min_width: usize,
    pub align: Align,
}

impl TableColumn {
    pub fn new(header: impl Into<String>, min_width: usize) -> Self {
        Self {
            header: header.into(),
            min_width,
            align: Align::Left,
        }
    }

    pub fn right(mut self) -> Self {
        self.align = Align::Right;
        self
    }
}

/// Row data for a [`Table`].
#[derive(Debug, Clone)]
pub struct TableRow {
    pub cells: Vec<String>,
    /// Rendered with the alert style.
    pub alert: bool,
}

/// Simple table model used for rendering read-only overviews.
#[derive(Debug, Clone)]
pub struct Table {
    pub title: Option<String>,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn new<T: Into<String>>(title: Option<T>, columns: Vec<TableColumn>) -> Self {
        Self {
            title: title.map(|value| value.into()),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn add_row<S: Into<String>>(&mut self, cells: Vec<S>) {
        self.push_row(cells, false);
    }

    pub fn add_alert_row<S: Into<String>>(&mut self, cells: Vec<S>) {
        self.push_row(cells, true);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn push_row<S: Into<String>>(&mut self, cells: Vec<S>, alert: bool) {
        let row = TableRow {
            cells: cells.into_iter().map(|value| value.into()).collect(),
            alert,
        };
        self.rows.push(row);
    }

    /// Column widths wide enough for the header and every cell.
    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.cells.get(idx))
                    .map(|cell| cell.chars().count())
                    .chain([column.header.chars().count(), column.min_width])
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

/// Renders [`Table`] instances using padded columns.
pub struct TableRenderer;

impl TableRenderer {
    pub fn render(table: &Table, style: &UiStyle) {
        for line in Self::render_lines(table, style) {
            io::println_text(&line);
        }
    }

    pub fn render_lines(table: &Table, style: &UiStyle) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(title) = &table.title {
            lines.push(style.apply_header_style(&format!("{}{}", style.header_prefix, title)));
        }
        if table.columns.is_empty() {
            return lines;
        }

        let widths = table.widths();
        let total_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        let headers: Vec<&str> = table.columns.iter().map(|col| col.header.as_str()).collect();
        lines.push(style.apply_header_style(&Self::format_cells(table, &widths, &headers)));
        lines.push(style.horizontal_line(total_width));

        for row in &table.rows {
            let cells: Vec<&str> = row.cells.iter().map(String::as_str).collect();
            let line = Self::format_cells(table, &widths, &cells);
            if row.alert {
                lines.push(style.apply_alert_style(&line));
            } else {
                lines.push(line);
            }
        }
        lines
    }

    fn format_cells(table: &Table, widths: &[usize], cells: &[&str]) -> String {
        let mut line = String::new();
        for (idx, (column, width)) in table.columns.iter().zip(widths).enumerate() {
            if idx > 0 {
                line.push_str("  ");
            }
            let cell = cells.get(idx).copied().unwrap_or("");
            let padded = match column.align {
                Align::Left => format!("{:<width$}", cell, width = *width),
                Align::Right => format!("{:>width$}", cell, width = *width),
            };
            line.push_str(&padded);
        }
        line.trim_end().to_string()
    }
}
