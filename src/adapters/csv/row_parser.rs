//! CSV implementation of the row parser.
//!
//! Turns raw CSV text into a JSON array of header-keyed row objects. Column
//! meaning and validation stay with the consumer of the stored rows.

use serde_json::{Map, Value};

use crate::ports::{ParseError, RowParser};

/// Row parser over the `csv` crate.
///
/// The first record is treated as the header row; each subsequent record
/// becomes an object keyed by header name. Short records leave trailing
/// columns absent; excess values are dropped.
#[derive(Debug, Clone, Default)]
pub struct CsvRowParser;

impl CsvRowParser {
    pub fn new() -> Self {
        Self
    }
}

impl RowParser for CsvRowParser {
    fn parse(&self, raw: &str) -> Result<Value, ParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(raw.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| ParseError::malformed(e.to_string()))?
            .clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ParseError::malformed(e.to_string()))?;
            let mut row = Map::new();
            for (header, value) in headers.iter().zip(record.iter()) {
                row.insert(header.to_string(), Value::String(value.to_string()));
            }
            rows.push(Value::Object(row));
        }

        Ok(Value::Array(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_header_keyed_rows() {
        let parser = CsvRowParser::new();
        let rows = parser.parse("name,email\nAda,ada@example.com\nLin,lin@example.com").unwrap();

        assert_eq!(
            rows,
            json!([
                {"name": "Ada", "email": "ada@example.com"},
                {"name": "Lin", "email": "lin@example.com"},
            ])
        );
    }

    #[test]
    fn empty_content_yields_no_rows() {
        let parser = CsvRowParser::new();
        assert_eq!(parser.parse("").unwrap(), json!([]));
    }

    #[test]
    fn header_only_content_yields_no_rows() {
        let parser = CsvRowParser::new();
        assert_eq!(parser.parse("name,email\n").unwrap(), json!([]));
    }

    #[test]
    fn short_records_omit_trailing_columns() {
        let parser = CsvRowParser::new();
        let rows = parser.parse("name,email\nAda").unwrap();
        assert_eq!(rows, json!([{"name": "Ada"}]));
    }

    #[test]
    fn values_are_trimmed() {
        let parser = CsvRowParser::new();
        let rows = parser.parse("name\n  Ada  ").unwrap();
        assert_eq!(rows, json!([{"name": "Ada"}]));
    }
}
