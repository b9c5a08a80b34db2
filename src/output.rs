//! Output formatting for calculation results.
//!
//! Supports rendering result tables to CSV bytes and printing JSON responses.

use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::table::Cell;

/// Renders `rows` as CSV bytes under a header of `columns`.
///
/// Each row must hold one cell per column, in column order.
pub fn render_table(columns: &[String], rows: &[Vec<Cell>]) -> Result<Vec<u8>> {
    debug!(columns = columns.len(), rows = rows.len(), "Rendering CSV");

    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(columns)?;

    for row in rows {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()).into())
}

/// Prints a response as pretty JSON on stdout.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
