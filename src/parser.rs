//! CSV parser for uploaded score sheets.

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::Result;
use crate::table::{Cell, Row, Table};

/// Decodes a CSV score sheet with a header row into a typed [`Table`].
///
/// Rows may be ragged: missing trailing fields read as [`Cell::Missing`] and
/// fields past the header are dropped.
///
/// # Errors
///
/// Returns [`crate::error::RaterError::Codec`] if the bytes are not valid CSV
/// (for example, invalid UTF-8).
pub fn parse_table(bytes: &[u8]) -> Result<Table> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(bytes);
    let columns = header_names(rdr.headers()?);

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while rdr.read_record(&mut record)? {
        if record.len() > columns.len() {
            debug!(
                line = record.position().map(|p| p.line()),
                extra = record.len() - columns.len(),
                "Dropping fields past the header"
            );
        }

        let mut row = Row::new();
        for (column, raw) in columns.iter().zip(record.iter()) {
            row.insert(column, Cell::from_raw(raw));
        }
        rows.push(row);
    }

    Ok(Table::new(columns, rows))
}

/// Reads only the header row.
pub fn parse_header(bytes: &[u8]) -> Result<Vec<String>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(bytes);
    Ok(header_names(rdr.headers()?))
}

/// Trims header names, strips a UTF-8 BOM, and suffixes repeats with
/// `.1`, `.2`, ... so each column is addressable by name.
fn header_names(record: &StringRecord) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(record.len());

    for (i, field) in record.iter().enumerate() {
        let field = if i == 0 {
            field.trim_start_matches('\u{feff}')
        } else {
            field
        };
        let base = field.trim().to_string();

        let mut name = base.clone();
        let mut n = 1;
        while names.contains(&name) {
            name = format!("{base}.{n}");
            n += 1;
        }
        names.push(name);
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_bytes_returns_empty_table() {
        let table = parse_table(&[]).unwrap();
        assert!(table.columns.is_empty());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_parse_typed_cells() {
        let csv = "学号,姓名,math,english\nS1,Alice,80,90\nS2,Bob,70,absent\n";
        let table = parse_table(csv.as_bytes()).unwrap();

        assert_eq!(table.columns, vec!["学号", "姓名", "math", "english"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get("math"), &Cell::number(80.0));
        assert_eq!(table.rows[0].get("姓名"), &Cell::Text("Alice".into()));
        assert_eq!(table.rows[1].get("english"), &Cell::Text("absent".into()));
    }

    #[test]
    fn test_parse_ragged_rows() {
        let csv = "id,math,english\nS1,80\nS2,70,60,99\n";
        let table = parse_table(csv.as_bytes()).unwrap();

        assert_eq!(table.rows[0].get("english"), &Cell::Missing);
        assert_eq!(table.rows[1].get("english"), &Cell::number(60.0));
    }

    #[test]
    fn test_parse_invalid_utf8_fails() {
        let bytes = vec![b'a', b',', b'b', b'\n', 0xFF, 0xFE, b',', b'1', b'\n'];
        assert!(parse_table(&bytes).is_err());
    }

    #[test]
    fn test_parse_header_only() {
        let csv = "\u{feff}学号, 姓名 ,专业,math\nS1,Alice,CS,80\n";
        let header = parse_header(csv.as_bytes()).unwrap();
        assert_eq!(header, vec!["学号", "姓名", "专业", "math"]);
    }

    #[test]
    fn test_duplicate_headers_are_suffixed() {
        let csv = "id,math,math,math\nS1,1,2,3\n";
        let table = parse_table(csv.as_bytes()).unwrap();

        assert_eq!(table.columns, vec!["id", "math", "math.1", "math.2"]);
        assert_eq!(table.rows[0].get("math.1"), &Cell::number(2.0));
    }
}
