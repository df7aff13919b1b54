//! CSV detection and parsing
//!
//! Detection is a cheap heuristic over the first lines of text; parsing goes
//! through the `csv` crate and yields one JSON object per row, keyed by the
//! header columns. Cell values stay strings.

use crate::error::{ParseError, ParseResult};
use serde_json::{Map, Value};

/// Number of leading lines inspected by [`is_csv`]
pub const SNIFF_LINES: usize = 10;

/// Check if text content looks like comma separated values
///
/// The header must split into at least two columns, none of which starts
/// with `[` or `{` (garbled JSON), and every inspected line must have at
/// least as many comma separated fields as the header.
pub fn is_csv(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    let lines: Vec<&str> = text.trim_end().split('\n').take(SNIFF_LINES).collect();
    let Some(header) = lines.first() else {
        return false;
    };

    let columns: Vec<&str> = header.split(',').collect();
    if columns.len() < 2 {
        return false;
    }

    if columns
        .iter()
        .any(|name| name.starts_with('[') || name.starts_with('{'))
    {
        log::debug!("Header looks like garbled JSON, not CSV: {:?}", columns);
        return false;
    }

    lines[1..]
        .iter()
        .all(|line| line.split(',').count() >= columns.len())
}

/// Parse CSV text into records
pub fn parse_csv(text: &str) -> ParseResult<Vec<Value>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_owned)
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let mut row = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).unwrap_or("").to_owned();
            row.insert(header.clone(), Value::String(value));
        }
        records.push(Value::Object(row));
    }

    log::debug!("Parsed {} CSV record(s) with columns {:?}", records.len(), headers);
    Ok(records)
}

fn csv_error(error: csv::Error) -> ParseError {
    let location = error
        .position()
        .map(|position| (position.line() as usize, 1));
    ParseError::new(format!("Invalid CSV: {}", error), location)
}
