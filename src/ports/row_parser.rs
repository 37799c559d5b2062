//! Row parser port - raw text content to structured rows.
//!
//! The core persists the parsed rows as an opaque value; it does not
//! validate columns or assign business meaning to them.

use serde_json::Value;
use thiserror::Error;

/// Errors raised when raw content cannot be parsed into rows.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("Malformed content: {message}")]
    Malformed { message: String },
}

impl ParseError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// Port for parsing raw upload content into a structured row value.
pub trait RowParser: Send + Sync {
    /// Parses raw text content into rows. The returned value is treated as
    /// opaque by the caller.
    fn parse(&self, raw: &str) -> Result<Value, ParseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_parser_is_object_safe() {
        fn _accepts_dyn(_parser: &dyn RowParser) {}
    }

    #[test]
    fn parse_error_displays_message() {
        let err = ParseError::malformed("unterminated quote");
        assert!(err.to_string().contains("unterminated quote"));
    }
}
