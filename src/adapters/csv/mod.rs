//! CSV parsing adapters.

mod row_parser;

pub use row_parser::CsvRowParser;
