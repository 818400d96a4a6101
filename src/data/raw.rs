//! Loosely typed match-log table as scraped from a team page

/// A table of text cells with a single header row.
///
/// Empty cells are stored as `None`. Every row has exactly as many cells as
/// there are headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        RawTable {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the header width
    pub fn push_row(&mut self, mut cells: Vec<Option<String>>) {
        cells.resize(self.headers.len(), None);
        self.rows.push(cells);
    }

    /// Build a table from string literals; empty strings become missing cells
    pub fn from_strings(headers: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = RawTable::new(headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            table.push_row(
                row.iter()
                    .map(|c| {
                        let c = c.trim();
                        (!c.is_empty()).then(|| c.to_string())
                    })
                    .collect(),
            );
        }
        table
    }

    /// Drop the last `n` columns
    pub fn without_trailing_columns(mut self, n: usize) -> Self {
        let keep = self.headers.len().saturating_sub(n);
        self.headers.truncate(keep);
        for row in &mut self.rows {
            row.truncate(keep);
        }
        self
    }

    /// Index of the column with the given header
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
