//! Plain-text rendering of tabular data (CSV rows, spreadsheet ranges)

/// Placeholder rendered for a missing or empty cell
pub const MISSING_CELL: &str = "NaN";

const COLUMN_GAP: &str = "  ";

/// A header row plus data rows, rendered as a whitespace-aligned table
/// without row index markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl TextTable {
    /// Create a table; blank header cells are named `Unnamed: <column>`.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(Into::into)
            .enumerate()
            .map(|(i, h): (usize, String)| {
                if h.trim().is_empty() {
                    unnamed(i)
                } else {
                    h
                }
            })
            .collect();

        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row. `None` and empty strings render as missing cells.
    pub fn push_row<I>(&mut self, row: I)
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let row: Vec<Option<String>> = row
            .into_iter()
            .map(|cell| cell.filter(|c| !c.is_empty()))
            .collect();

        // Rows wider than the header grow extra unnamed columns
        while self.headers.len() < row.len() {
            let index = self.headers.len();
            self.headers.push(unnamed(index));
        }

        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Render every cell right-aligned to its column width, columns separated
    /// by two spaces, one line per row with the header first.
    pub fn render(&self) -> String {
        let columns = self.headers.len();
        let cell = |row: &[Option<String>], col: usize| -> String {
            row.get(col)
                .and_then(|c| c.clone())
                .unwrap_or_else(|| MISSING_CELL.to_string())
        };

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (col, width) in widths.iter_mut().enumerate() {
                *width = (*width).max(cell(row, col).chars().count());
            }
        }

        let format_line = |cells: Vec<String>| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:>width$}", c, width = *w))
                .collect::<Vec<_>>()
                .join(COLUMN_GAP)
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(format_line(self.headers.clone()));
        for row in &self.rows {
            lines.push(format_line((0..columns).map(|col| cell(row, col)).collect()));
        }

        lines.join("\n")
    }
}

fn unnamed(index: usize) -> String {
    format!("Unnamed: {}", index)
}
