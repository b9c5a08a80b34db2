//! In-memory tabular model: typed cells, sparse rows, and a header-ordered table.

use std::collections::HashMap;
use std::fmt;

/// A single spreadsheet cell, tagged with its type when the table is parsed.
///
/// Parsed cells keep the text they were read from, so writing a table back
/// reproduces every passthrough cell byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number { value: f64, raw: String },
    Text(String),
    Missing,
}

impl Cell {
    /// Classifies raw cell text.
    ///
    /// Blank text is [`Cell::Missing`]. Text that parses as a finite `f64`
    /// is a [`Cell::Number`] unless the number would drop part of how it was
    /// written (`007`, `+5`); such cells, `NaN`, and `inf` stay [`Cell::Text`].
    /// Surrounding whitespace decides nothing but is kept in the cell.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Missing;
        }

        if is_plain_number(trimmed) {
            if let Ok(value) = trimmed.parse::<f64>() {
                if value.is_finite() {
                    return Cell::Number {
                        value,
                        raw: raw.to_string(),
                    };
                }
            }
        }

        Cell::Text(raw.to_string())
    }

    /// A computed number, written in its shortest round-trip form.
    pub fn number(value: f64) -> Self {
        Cell::Number {
            value,
            raw: value.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number { value, .. } => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number { raw, .. } => f.write_str(raw),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Missing => Ok(()),
        }
    }
}

fn is_plain_number(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.starts_with('+') {
        return false;
    }
    // "0", "0.5" and "0e3" are fine; "007" and "00.5" are identifiers
    let mut chars = digits.chars();
    !matches!((chars.next(), chars.next()), (Some('0'), Some(c)) if c.is_ascii_digit())
}

static MISSING: Cell = Cell::Missing;

/// One record, keyed by column name. Absent columns read as [`Cell::Missing`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: HashMap<String, Cell>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, cell: Cell) -> Self {
        self.insert(column, cell);
        self
    }

    pub fn insert(&mut self, column: &str, cell: Cell) {
        self.cells.insert(column.to_string(), cell);
    }

    pub fn get(&self, column: &str) -> &Cell {
        self.cells.get(column).unwrap_or(&MISSING)
    }
}

/// A parsed table. `columns` is the schema, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}
